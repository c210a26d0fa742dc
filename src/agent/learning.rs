// VIDFORGE Knowledge Store
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// The "memory" of past runs: a flat `patterns.json` lookup table keyed by
// pattern id. Successful goals are remembered with the decisions that got
// them there; failures are remembered as things to avoid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LearnedPattern {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successful_decisions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub success_count: u32,
}

impl LearnedPattern {
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|kw| !kw.is_empty() && lower.contains(kw.as_str()))
    }
}

pub struct KnowledgeStore {
    path: PathBuf,
    patterns: BTreeMap<String, LearnedPattern>,
}

impl KnowledgeStore {
    /// Load `<dir>/patterns.json`. A missing or corrupt file starts empty.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join("patterns.json");
        let patterns = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<BTreeMap<String, LearnedPattern>>(&data) {
                Ok(p) => {
                    info!("[LEARNING] 📚 Loaded {} learned patterns", p.len());
                    p
                }
                Err(e) => {
                    warn!("[LEARNING] Ignoring unreadable patterns file: {}", e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LearnedPattern> {
        self.patterns.get(key)
    }

    pub fn patterns(&self) -> impl Iterator<Item = (&String, &LearnedPattern)> {
        self.patterns.iter()
    }

    /// Descriptions of every pattern with a keyword contained in `goal`.
    pub fn find_relevant(&self, goal: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(_, p)| p.matches(goal))
            .map(|(key, p)| if p.description.is_empty() { key.clone() } else { p.description.clone() })
            .collect()
    }

    /// Replace the pattern under `key`, carrying its success count forward.
    pub fn memorize_success(&mut self, key: &str, mut pattern: LearnedPattern) {
        let previous = self.patterns.get(key).map(|p| p.success_count).unwrap_or(0);
        pattern.success_count = previous + 1;
        self.patterns.insert(key.to_string(), pattern);
    }

    pub fn memorize_failure(&mut self, key: &str, pattern: LearnedPattern) {
        self.patterns.insert(key.to_string(), pattern);
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.patterns)?;
        fs::write(&self.path, data).with_context(|| format!("Cannot write {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(keywords: &[&str]) -> LearnedPattern {
        LearnedPattern {
            description: format!("Successful: {}", keywords.join(" ")),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("patterns.json"), "{not json").unwrap();
        assert!(KnowledgeStore::open(dir.path()).is_empty());
    }

    #[test]
    fn test_success_count_accumulates_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KnowledgeStore::open(dir.path());
        store.memorize_success("abcd1234", pattern(&["robots"]));
        store.save().unwrap();

        let mut reopened = KnowledgeStore::open(dir.path());
        assert_eq!(reopened.get("abcd1234").unwrap().success_count, 1);
        reopened.memorize_success("abcd1234", pattern(&["robots"]));
        assert_eq!(reopened.get("abcd1234").unwrap().success_count, 2);
    }

    #[test]
    fn test_find_relevant_by_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KnowledgeStore::open(dir.path());
        store.memorize_success("a", pattern(&["robots", "jobs"]));
        store.memorize_success("b", pattern(&["cooking"]));
        let found = store.find_relevant("Create video: Robots take factory jobs");
        assert_eq!(found, vec!["Successful: robots jobs".to_string()]);
    }
}
