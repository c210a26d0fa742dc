// VIDFORGE Reasoning Log
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// A run is narrated as a chain of thoughts and decisions. The chain is
// written to `chain_<task>_<stamp>.json` when it ends and its outcome is
// folded into the knowledge store for the next run to look up.

use crate::agent::learning::{KnowledgeStore, LearnedPattern};
use crate::agent::text_tools::{generate_id, truncate_chars};
use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThoughtCategory {
    Analysis,
    Decision,
    Observation,
    Error,
    Insight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    pub timestamp: String,
    pub category: ThoughtCategory,
    pub content: String,
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub alternatives_considered: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision: String,
    pub reasoning: String,
    pub confidence: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningChain {
    pub task_id: String,
    pub goal: String,
    pub started_at: String,
    pub thoughts: Vec<Thought>,
    pub decisions_made: Vec<Decision>,
    pub patterns_recognized: Vec<String>,
    pub lessons_learned: Vec<String>,
    pub outcome: String,
    pub success: bool,
}

impl ReasoningChain {
    fn new(task_id: &str, goal: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            goal: goal.to_string(),
            started_at: now(),
            thoughts: Vec::new(),
            decisions_made: Vec::new(),
            patterns_recognized: Vec::new(),
            lessons_learned: Vec::new(),
            outcome: String::new(),
            success: false,
        }
    }

    pub fn recognize_pattern(&mut self, pattern: &str) {
        info!("[REASONING] 🔍 PATTERN: {}", pattern);
        self.patterns_recognized.push(pattern.to_string());
    }

    pub fn learn_lesson(&mut self, lesson: &str) {
        info!("[REASONING] 📚 LESSON: {}", lesson);
        self.lessons_learned.push(lesson.to_string());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskAnalysis {
    /// 1-10.
    pub complexity: u32,
    pub risks: Vec<String>,
    pub dependencies: Vec<String>,
    pub recommended_approach: String,
    /// Seconds.
    pub estimated_time: u32,
}

fn now() -> String {
    Local::now().to_rfc3339()
}

pub struct ReasoningEngine {
    knowledge_dir: PathBuf,
    store: KnowledgeStore,
    current: Option<ReasoningChain>,
}

impl ReasoningEngine {
    pub fn open(knowledge_dir: &Path) -> Result<Self> {
        fs::create_dir_all(knowledge_dir).with_context(|| format!("Cannot create {:?}", knowledge_dir))?;
        Ok(Self {
            knowledge_dir: knowledge_dir.to_path_buf(),
            store: KnowledgeStore::open(knowledge_dir),
            current: None,
        })
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn current(&self) -> Option<&ReasoningChain> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut ReasoningChain> {
        self.current.as_mut()
    }

    /// Start a fresh chain, replacing any chain still open.
    pub fn begin(&mut self, task_id: &str, goal: &str) {
        self.current = Some(ReasoningChain::new(task_id, goal));
        self.think_with(
            ThoughtCategory::Analysis,
            &format!("Beginning task: {}", goal),
            0.8,
            vec!["User request received".to_string(), "Pipeline initialized".to_string()],
            Vec::new(),
        );

        let relevant = self.store.find_relevant(goal);
        if !relevant.is_empty() {
            self.think_with(
                ThoughtCategory::Insight,
                &format!("Found {} relevant patterns from previous executions", relevant.len()),
                0.8,
                relevant.into_iter().take(3).collect(),
                Vec::new(),
            );
        }
        info!("[REASONING] 🧠 Chain started: {}...", truncate_chars(goal, 50));
    }

    pub fn think(&mut self, category: ThoughtCategory, content: &str) {
        self.think_with(category, content, 0.8, Vec::new(), Vec::new());
    }

    /// Thoughts outside any chain open an "Untracked reasoning" chain.
    pub fn think_with(
        &mut self,
        category: ThoughtCategory,
        content: &str,
        confidence: f64,
        evidence: Vec<String>,
        alternatives: Vec<String>,
    ) {
        if self.current.is_none() {
            self.begin("unknown", "Untracked reasoning");
        }
        debug!("[REASONING] 💭 [{:?}] {}", category, content);
        if let Some(chain) = self.current.as_mut() {
            chain.thoughts.push(Thought {
                timestamp: now(),
                category,
                content: content.to_string(),
                confidence,
                evidence,
                alternatives_considered: alternatives,
            });
        }
    }

    /// Ignored when no chain is open.
    pub fn decide(&mut self, decision: &str, reasoning: &str, confidence: f64) {
        if let Some(chain) = self.current.as_mut() {
            info!("[REASONING] 🎯 DECISION: {}", decision);
            debug!("[REASONING]    Reasoning: {}", reasoning);
            chain.decisions_made.push(Decision {
                decision: decision.to_string(),
                reasoning: reasoning.to_string(),
                confidence,
                timestamp: now(),
            });
        }
    }

    /// Close the chain, learn from it and persist both the chain and the patterns.
    pub fn end(&mut self, success: bool, outcome: &str) -> Result<Option<ReasoningChain>> {
        let Some(mut chain) = self.current.take() else {
            return Ok(None);
        };
        chain.success = success;
        chain.outcome = outcome.to_string();

        if success {
            self.learn_success(&mut chain);
        } else {
            self.learn_failure(&chain);
        }

        let file = self.knowledge_dir.join(format!(
            "chain_{}_{}.json",
            chain.task_id,
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        fs::write(&file, serde_json::to_string_pretty(&chain)?).with_context(|| format!("Cannot write {:?}", file))?;
        self.store.save()?;

        info!(
            "[REASONING] 🧠 Chain complete: {}",
            if success { "✅ Success" } else { "❌ Failed" }
        );
        Ok(Some(chain))
    }

    fn learn_success(&mut self, chain: &mut ReasoningChain) {
        let key = generate_id(&chain.goal)[..8].to_string();
        let pattern = LearnedPattern {
            description: format!("Successful: {}", truncate_chars(&chain.goal, 50)),
            keywords: chain.goal.to_lowercase().split_whitespace().take(5).map(String::from).collect(),
            successful_decisions: chain.decisions_made.iter().map(|d| d.decision.clone()).collect(),
            insights: chain
                .thoughts
                .iter()
                .filter(|t| t.category == ThoughtCategory::Insight)
                .map(|t| t.content.clone())
                .collect(),
            timestamp: now(),
            ..Default::default()
        };
        self.store.memorize_success(&key, pattern);
        chain.learn_lesson(&format!("Pattern stored: {}", key));
    }

    fn learn_failure(&mut self, chain: &ReasoningChain) {
        let errors: Vec<&Thought> = chain.thoughts.iter().filter(|t| t.category == ThoughtCategory::Error).collect();
        let Some(first) = errors.first() else {
            return;
        };
        let key = format!("avoid_{}", &generate_id(&first.content)[..8]);
        let mut keywords = vec!["error".to_string(), "fail".to_string()];
        keywords.extend(first.content.to_lowercase().split_whitespace().take(3).map(String::from));
        self.store.memorize_failure(
            &key,
            LearnedPattern {
                description: format!("Avoid: {}", truncate_chars(&first.content, 50)),
                keywords,
                failure_context: Some(chain.goal.clone()),
                error_details: errors.iter().map(|t| t.content.clone()).collect(),
                timestamp: now(),
                ..Default::default()
            },
        );
    }

    /// Rough sizing of a task from the words in its description.
    pub fn analyze_task(&mut self, description: &str) -> TaskAnalysis {
        self.think(
            ThoughtCategory::Analysis,
            &format!("Analyzing task: {}...", truncate_chars(description, 50)),
        );
        let task = description.to_lowercase();

        let complexity = ["video", "assembly", "generate", "scrape", "api", "multiple"]
            .iter()
            .filter(|i| task.contains(*i))
            .count() as u32;
        let complexity = (5 + complexity).min(10);

        let mut risks = Vec::new();
        if task.contains("api") {
            risks.push("API rate limiting or failure".to_string());
        }
        if task.contains("video") {
            risks.push("Long processing time for video rendering".to_string());
        }
        if task.contains("download") {
            risks.push("Network failures during downloads".to_string());
        }
        if task.contains("scrape") {
            risks.push("Website structure changes".to_string());
        }

        let mut dependencies = Vec::new();
        if task.contains("video") {
            dependencies.extend(["ffmpeg", "ffprobe"]);
        }
        if task.contains("voice") || task.contains("audio") {
            dependencies.extend(["text-to-speech", "symphonia"]);
        }
        if task.contains("image") || task.contains("visual") {
            dependencies.extend(["image", "reqwest"]);
        }
        let mut dependencies: Vec<String> = dependencies.into_iter().map(String::from).collect();
        dependencies.sort();
        dependencies.dedup();

        let recommended_approach = self
            .store
            .patterns()
            .find(|(_, p)| p.success_count > 0 && p.matches(&task))
            .map(|(key, p)| {
                let desc = if p.description.is_empty() { key.as_str() } else { p.description.as_str() };
                format!("Follow successful pattern: {}", desc)
            })
            .unwrap_or_else(|| "Use default modular approach with error handling".to_string());

        let mut estimated_time = 60;
        if task.contains("video") {
            estimated_time += 300;
        }
        if task.contains("download") {
            estimated_time += 120;
        }
        if task.contains("generate") {
            estimated_time += 60;
        }

        let analysis = TaskAnalysis {
            complexity,
            risks,
            dependencies,
            recommended_approach,
            estimated_time,
        };
        self.think(
            ThoughtCategory::Observation,
            &format!(
                "Task complexity: {}/10, Risks: {}, Est. time: {}s",
                analysis.complexity,
                analysis.risks.len(),
                analysis.estimated_time
            ),
        );
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("chain_"))
            .count()
    }

    #[test]
    fn test_think_without_chain_autobegins() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ReasoningEngine::open(dir.path()).unwrap();
        engine.think(ThoughtCategory::Observation, "stray thought");
        let chain = engine.current().unwrap();
        assert_eq!(chain.goal, "Untracked reasoning");
        assert_eq!(chain.thoughts.len(), 2);
    }

    #[test]
    fn test_decide_without_chain_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ReasoningEngine::open(dir.path()).unwrap();
        engine.decide("nothing", "no chain", 0.5);
        assert!(engine.current().is_none());
        assert!(engine.end(true, "done").unwrap().is_none());
    }

    #[test]
    fn test_success_stores_pattern_and_chain() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ReasoningEngine::open(dir.path()).unwrap();
        let goal = "Create video: Robots Replace Warehouse Workers Today";
        engine.begin("video_1", goal);
        engine.decide("Use AI images only", "No Pexels key", 0.9);
        let chain = engine.end(true, "Video created").unwrap().unwrap();
        assert!(chain.success);
        assert_eq!(chain.lessons_learned.len(), 1);

        let key = generate_id(goal)[..8].to_string();
        let stored = engine.store().get(&key).unwrap();
        assert_eq!(stored.success_count, 1);
        assert_eq!(stored.keywords, vec!["create", "video:", "robots", "replace", "warehouse"]);
        assert_eq!(stored.successful_decisions, vec!["Use AI images only"]);
        assert_eq!(chain_files(dir.path()), 1);
        assert!(dir.path().join("patterns.json").exists());

        // A second run with the same goal finds the pattern and bumps the count.
        let mut again = ReasoningEngine::open(dir.path()).unwrap();
        again.begin("video_2", goal);
        assert_eq!(again.current().unwrap().thoughts[1].category, ThoughtCategory::Insight);
        again.end(true, "Video created").unwrap();
        assert_eq!(again.store().get(&key).unwrap().success_count, 2);
    }

    #[test]
    fn test_failure_stores_avoid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ReasoningEngine::open(dir.path()).unwrap();
        engine.begin("video_3", "Create video: anything");
        engine.think(ThoughtCategory::Error, "Pipeline failed: quota exceeded");
        engine.end(false, "Error").unwrap();

        let key = format!("avoid_{}", &generate_id("Pipeline failed: quota exceeded")[..8]);
        let stored = engine.store().get(&key).unwrap();
        assert_eq!(stored.keywords, vec!["error", "fail", "pipeline", "failed:", "quota"]);
        assert_eq!(stored.failure_context.as_deref(), Some("Create video: anything"));
    }

    #[test]
    fn test_analyze_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ReasoningEngine::open(dir.path()).unwrap();
        let analysis = engine.analyze_task("Generate video with voice and download visual assets via API");
        assert_eq!(analysis.complexity, 8);
        assert_eq!(analysis.risks.len(), 3);
        assert_eq!(
            analysis.dependencies,
            vec!["ffmpeg", "ffprobe", "image", "reqwest", "symphonia", "text-to-speech"]
        );
        assert_eq!(analysis.estimated_time, 540);
        assert_eq!(analysis.recommended_approach, "Use default modular approach with error handling");
    }
}
