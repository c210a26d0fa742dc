// VIDFORGE Quality & Progress Reporting
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE

use crate::agent::text_tools::format_timestamp;
use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// `[n/total] (pct%) message` for each pipeline stage.
pub struct ProgressTracker {
    pub total: usize,
    pub current: usize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            started: Instant::now(),
        }
    }

    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 100;
        }
        self.current * 100 / self.total
    }

    pub fn step(&mut self, message: &str) {
        self.current += 1;
        info!("[{}/{}] ({}%) {}", self.current, self.total, self.percent(), message);
    }

    pub fn complete(&self) {
        info!("✅ Pipeline complete in {:.1}s", self.started.elapsed().as_secs_f64());
    }
}

/// Heuristic scores for a finished run. Risk: lower is safer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub created_at: String,
    pub topic: String,
    pub script_words: usize,
    pub estimated_duration: u32,
    pub visuals_count: usize,
    pub audio_duration: f64,
    pub risk_score: u32,
    pub viral_score: u32,
    pub retention_estimate: u32,
}

impl Default for QualityMetrics {
    fn default() -> Self {
        Self {
            created_at: Local::now().to_rfc3339(),
            topic: String::new(),
            script_words: 0,
            estimated_duration: 0,
            visuals_count: 0,
            audio_duration: 0.0,
            risk_score: 0,
            viral_score: 0,
            retention_estimate: 0,
        }
    }
}

impl QualityMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputed from scratch, so calling it twice gives the same scores.
    pub fn calculate_scores(&mut self) {
        // Stock and generated media only.
        self.risk_score = 10;

        let mut viral = 0;
        if (840..=1200).contains(&self.estimated_duration) {
            viral += 30;
        }
        if (2000..=2700).contains(&self.script_words) {
            viral += 20;
        }
        if self.visuals_count >= 10 {
            viral += 20;
        }
        self.viral_score = viral;
        self.retention_estimate = (40 + (self.script_words / 100) as u32).min(70);
    }

    pub fn save(&mut self, dir: &Path) -> Result<PathBuf> {
        self.calculate_scores();
        let path = dir.join("quality_metrics.json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?).with_context(|| format!("Cannot write {:?}", path))?;
        info!("[QUALITY] Quality metrics saved: {:?}", path);
        Ok(path)
    }

    pub fn summary(&mut self) -> String {
        self.calculate_scores();
        format!(
            "📊 Quality Report:\n   Duration: ~{}\n   Words: {}\n   Visuals: {}\n   Risk Score: {}/100 (lower=safer)\n   Viral Score: {}/100\n   Retention Est: {}%",
            format_timestamp(self.estimated_duration as u64),
            self.script_words,
            self.visuals_count,
            self.risk_score,
            self.viral_score,
            self.retention_estimate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let mut p = ProgressTracker::new(8);
        p.step("one");
        p.step("two");
        assert_eq!(p.current, 2);
        assert_eq!(p.percent(), 25);
    }

    #[test]
    fn test_scores_are_idempotent() {
        let mut m = QualityMetrics {
            script_words: 2250,
            estimated_duration: 900,
            visuals_count: 15,
            ..Default::default()
        };
        m.calculate_scores();
        m.calculate_scores();
        assert_eq!(m.viral_score, 70);
        assert_eq!(m.risk_score, 10);
        assert_eq!(m.retention_estimate, 62);
    }

    #[test]
    fn test_short_script_scores_low() {
        let mut m = QualityMetrics {
            script_words: 900,
            estimated_duration: 360,
            visuals_count: 4,
            ..Default::default()
        };
        m.calculate_scores();
        assert_eq!(m.viral_score, 0);
        assert_eq!(m.retention_estimate, 49);
        let mut long = QualityMetrics {
            script_words: 6000,
            ..Default::default()
        };
        long.calculate_scores();
        assert_eq!(long.retention_estimate, 70);
    }

    #[test]
    fn test_save_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = QualityMetrics::new();
        m.topic = "robots".to_string();
        m.estimated_duration = 905;
        let path = m.save(dir.path()).unwrap();
        let saved: QualityMetrics = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved.topic, "robots");
        assert!(m.summary().contains("Duration: ~15:05"));
    }
}
