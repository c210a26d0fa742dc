// VIDFORGE Agent Core - Pipeline Orchestrator
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Runs the eight stages in order, each awaiting the last:
// topic → script → visuals → voiceover → assembly → metadata → export → reports.
// Every stage narrates into the reasoning chain, which is closed with the
// run's outcome whether it succeeds or fails.

use crate::agent::assembler::{VideoAssembler, VideoProject};
use crate::agent::compliance;
use crate::agent::health;
use crate::agent::metadata::MetadataGenerator;
use crate::agent::production_tools;
use crate::agent::quality::{ProgressTracker, QualityMetrics};
use crate::agent::reasoning::{ReasoningEngine, ThoughtCategory};
use crate::agent::script_generator::{Script, ScriptGenerator};
use crate::agent::text_tools::{format_timestamp, truncate_chars};
use crate::agent::topic_discovery::{Topic, TopicDiscovery};
use crate::agent::visual_sourcer::VisualSourcer;
use crate::agent::voice::{audio_duration, Voiceover};
use crate::config::Settings;
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

pub const PIPELINE_STEPS: usize = 8;
const TARGET_VISUALS: usize = 15;
const MIN_VISUALS: usize = 10;
const SHORT_SCRIPT_WORDS: usize = 1500;

/// Everything a finished run wrote to disk.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub project_id: String,
    pub topic: String,
    pub video_path: Option<PathBuf>,
    pub shorts: Vec<PathBuf>,
    pub metadata_path: PathBuf,
    pub script_path: PathBuf,
    pub quality_path: PathBuf,
    pub compliance_path: PathBuf,
    pub compliance_passed: bool,
    pub title_options: Vec<String>,
}

/// `output/<project>_script.md` contents.
pub fn script_markdown(title: &str, script: &Script) -> String {
    format!(
        "# {}\n\n**Word Count:** {}\n**Estimated Duration:** {}\n\n---\n\n{}",
        title,
        script.word_count,
        format_timestamp(script.estimated_duration as u64),
        script.full_text
    )
}

pub struct VideoPipeline {
    settings: Settings,
    progress: ProgressTracker,
    quality: QualityMetrics,
    reasoning: ReasoningEngine,
}

impl VideoPipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.ensure_dirs()?;
        let mut reasoning = ReasoningEngine::open(&settings.knowledge_dir())?;
        reasoning.begin(
            &format!("pipeline_{}", Local::now().format("%Y%m%d_%H%M%S")),
            "Generate complete YouTube video about AI/robotics",
        );

        let mut pipeline = Self {
            settings,
            progress: ProgressTracker::new(PIPELINE_STEPS),
            quality: QualityMetrics::new(),
            reasoning,
        };
        pipeline.verify_configuration();
        Ok(pipeline)
    }

    pub fn reasoning(&self) -> &ReasoningEngine {
        &self.reasoning
    }

    fn verify_configuration(&mut self) {
        self.reasoning
            .think(ThoughtCategory::Analysis, "Verifying configuration and API keys");

        if self.settings.keys.gemini.is_some() {
            self.reasoning.think(ThoughtCategory::Observation, "Gemini API key present ✓");
        } else {
            warn!("[CORE] ⚠️ GEMINI_API_KEY not set - script generation will fail");
        }

        if self.settings.keys.pexels.is_some() {
            self.reasoning.think(ThoughtCategory::Observation, "Pexels API key present ✓");
        } else {
            warn!("[CORE] ⚠️ PEXELS_API_KEY not set - using Pollinations.ai only for visuals");
            self.reasoning
                .decide("Use AI-generated images only", "No stock API keys available", 0.8);
        }

        health::log_report(&health::preflight(&self.settings));
    }

    /// Run all stages. On failure the reasoning chain is closed as failed
    /// before the error is returned.
    pub async fn run(&mut self, topic: Option<&str>, auto_discover: bool, skip_render: bool) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let project_id = format!("video_{}", Local::now().format("%Y%m%d_%H%M%S"));

        self.reasoning
            .think(ThoughtCategory::Analysis, &format!("Starting pipeline run: {}", project_id));
        info!("[CORE] {}", "=".repeat(60));
        info!("[CORE] 🚀 VIDFORGE PIPELINE");
        info!("[CORE] {}", "=".repeat(60));

        match self.execute(&project_id, topic, auto_discover, skip_render).await {
            Ok(outcome) => {
                self.log_summary(&outcome, started);
                let summary = format!("Generated video: {}", truncate_chars(&outcome.topic, 50));
                if let Err(e) = self.reasoning.end(true, &summary) {
                    warn!("[CORE] Could not persist reasoning chain: {:#}", e);
                }
                self.progress.complete();
                Ok(outcome)
            }
            Err(e) => {
                self.reasoning
                    .think(ThoughtCategory::Error, &format!("Pipeline failed: {:#}", e));
                if let Err(end_err) = self.reasoning.end(false, &format!("{:#}", e)) {
                    warn!("[CORE] Could not persist reasoning chain: {:#}", end_err);
                }
                error!("[CORE] ❌ PIPELINE FAILED: {:#}", e);
                Err(e)
            }
        }
    }

    async fn select_topic(&mut self, topic: Option<&str>, auto_discover: bool) -> Result<Topic> {
        match topic {
            Some(title) if !auto_discover => {
                self.reasoning.think(
                    ThoughtCategory::Observation,
                    &format!("Using provided topic: {}", truncate_chars(title, 50)),
                );
                Ok(Topic::manual(title))
            }
            _ => {
                self.reasoning.decide(
                    "Auto-discover trending topic",
                    "No specific topic provided, will find best trending topic",
                    0.9,
                );
                let found = TopicDiscovery::new(&self.settings).best_topic().await;
                let Some(best) = found else {
                    self.reasoning
                        .think(ThoughtCategory::Error, "No topics discovered from news sources");
                    return Err(anyhow!("Failed to discover any topics"));
                };
                self.reasoning.think(
                    ThoughtCategory::Insight,
                    &format!("Best topic scored {:.0}: {}", best.score, truncate_chars(&best.title, 50)),
                );
                Ok(best)
            }
        }
    }

    async fn execute(
        &mut self,
        project_id: &str,
        topic: Option<&str>,
        auto_discover: bool,
        skip_render: bool,
    ) -> Result<PipelineOutcome> {
        let output_dir = self.settings.output_dir.clone();

        // 1. Topic
        self.progress.step("Topic Discovery");
        let topic = self.select_topic(topic, auto_discover).await?;
        self.quality.topic = topic.title.clone();
        let analysis = self.reasoning.analyze_task(&format!("Generate video: {}", topic.title));
        info!(
            "[CORE] 📰 Topic: {} (complexity {}/10, {})",
            topic.title, analysis.complexity, analysis.recommended_approach
        );

        // 2. Script
        self.progress.step("Script Generation");
        self.reasoning
            .think(ThoughtCategory::Analysis, "Beginning script generation with Gemini");
        let script = ScriptGenerator::new(&self.settings)?.generate(&topic, "").await?;
        if script.word_count < SHORT_SCRIPT_WORDS {
            self.reasoning.think_with(
                ThoughtCategory::Observation,
                &format!("Script shorter than optimal ({} words)", script.word_count),
                0.7,
                Vec::new(),
                Vec::new(),
            );
        } else {
            self.reasoning.think(
                ThoughtCategory::Insight,
                &format!("Script meets target length: {} words", script.word_count),
            );
        }
        self.quality.script_words = script.word_count;
        self.quality.estimated_duration = script.estimated_duration;
        info!(
            "[CORE] 📝 Script: {} words, ~{} min",
            script.word_count,
            script.estimated_duration / 60
        );

        // 3. Visuals
        self.progress.step("Visual Sourcing");
        let sourcer = VisualSourcer::new(&self.settings);
        let mut visuals = sourcer
            .collect_for_topic(&topic.title, &script.full_text, TARGET_VISUALS)
            .await;
        self.reasoning
            .think(ThoughtCategory::Observation, &format!("Collected {} visuals", visuals.len()));
        if visuals.len() < MIN_VISUALS {
            self.reasoning.decide(
                "Generate additional AI images",
                &format!("Only {} visuals found, need more for 15+ min video", visuals.len()),
                0.8,
            );
            let extra = sourcer.ai_images_from_script(&script.full_text, TARGET_VISUALS - visuals.len());
            visuals.extend(extra);
        }
        let visuals = sourcer.download_all(&visuals).await;
        self.quality.visuals_count = visuals.len();
        info!("[CORE] 🎬 Visuals: {} downloaded", visuals.len());

        // 4. Voiceover
        self.progress.step("Voiceover Generation");
        let audio_path = Voiceover::new(&self.settings)
            .generate(&script.full_text, &format!("{}_voice.mp3", project_id))
            .await?;
        let duration = narration_length(&audio_path, &script).await;
        self.reasoning
            .think(ThoughtCategory::Observation, &format!("Voiceover duration: {:.1}s", duration));
        self.quality.audio_duration = duration;
        info!("[CORE] 🎙️ Voiceover: {}", format_timestamp(duration as u64));

        // 5. Assembly
        self.progress.step("Video Assembly");
        let (video_path, shorts) = if skip_render {
            self.reasoning
                .think(ThoughtCategory::Decision, "Skipping video render (test mode)");
            info!("[CORE] ⏭️ Skipping video render (--test)");
            (None, Vec::new())
        } else {
            let mut project = VideoProject {
                id: project_id.to_string(),
                title: topic.title.clone(),
                script_text: script.full_text.clone(),
                visuals: visuals.clone(),
                audio_path: Some(audio_path.clone()),
                ..Default::default()
            };
            let output = VideoAssembler::new(&self.settings)
                .assemble(&mut project, true, true)
                .await?;
            self.reasoning
                .think(ThoughtCategory::Insight, &format!("Video rendered: {:?}", output));
            (Some(output), project.shorts_paths)
        };

        // 6. Metadata
        self.progress.step("Metadata Generation");
        let metadata = MetadataGenerator::new(&self.settings)
            .generate(&script, duration as u32)
            .await;
        let metadata_path = output_dir.join(format!("{}_metadata.json", project_id));
        metadata.save(&metadata_path)?;
        self.reasoning.think(
            ThoughtCategory::Observation,
            &format!("Generated {} title options", metadata.title_options.len()),
        );
        info!("[CORE] 📋 Metadata saved: {:?}", metadata_path.file_name().unwrap_or_default());

        // 7. Script export
        self.progress.step("Exporting Assets");
        let script_path = output_dir.join(format!("{}_script.md", project_id));
        std::fs::write(&script_path, script_markdown(&topic.title, &script))
            .with_context(|| format!("Cannot write {:?}", script_path))?;
        info!("[CORE] 📄 Script saved: {:?}", script_path.file_name().unwrap_or_default());

        // 8. Reports
        self.progress.step("Quality Report");
        let quality_path = self.quality.save(&output_dir)?;
        let (report, compliance_path) = compliance::run_full_check(&visuals, &script.full_text, &output_dir)?;
        if !report.passed {
            self.reasoning.think(
                ThoughtCategory::Observation,
                &format!("Compliance review needed (score {})", report.score),
            );
        }

        Ok(PipelineOutcome {
            project_id: project_id.to_string(),
            topic: topic.title,
            video_path,
            shorts,
            metadata_path,
            script_path,
            quality_path,
            compliance_path,
            compliance_passed: report.passed,
            title_options: metadata.title_options,
        })
    }

    fn log_summary(&mut self, outcome: &PipelineOutcome, started: Instant) {
        info!("[CORE] {}", "=".repeat(60));
        info!("[CORE] ✅ PIPELINE COMPLETE");
        info!("[CORE] {}", "=".repeat(60));
        info!("[CORE]    Topic: {}...", truncate_chars(&outcome.topic, 50));
        info!("[CORE]    Duration: ~{:.0} min", self.quality.audio_duration / 60.0);
        info!("[CORE]    Visuals: {}", self.quality.visuals_count);
        info!("[CORE]    Processing Time: {:.1}s", started.elapsed().as_secs_f64());
        if let Some(path) = &outcome.video_path {
            info!("[CORE]    Output: {:?}", path);
        }
        for line in self.quality.summary().lines() {
            info!("[CORE] {}", line);
        }
        info!("[CORE] 🎯 TITLE OPTIONS:");
        for (i, title) in outcome.title_options.iter().take(5).enumerate() {
            info!("[CORE]    {}. {}", i + 1, title);
        }
    }
}

/// Decoded length, then ffprobe, then the script's spoken-length estimate.
async fn narration_length(audio: &Path, script: &Script) -> f64 {
    if let Ok(d) = audio_duration(audio) {
        if d > 0.0 {
            return d;
        }
    }
    match production_tools::media_duration(audio).await {
        Ok(d) => d,
        Err(e) => {
            warn!("[CORE] Narration length unknown ({:#}), using script estimate", e);
            script.estimated_duration as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::learning::KnowledgeStore;

    #[test]
    fn test_script_markdown_layout() {
        let mut script = Script::new("Robots", &"word ".repeat(300));
        script.estimated_duration = 125;
        let md = script_markdown("Robots at Work", &script);
        assert!(md.starts_with("# Robots at Work\n\n**Word Count:** 300\n**Estimated Duration:** 2:05\n\n---\n\n"));
        assert!(md.ends_with(&script.full_text));
    }

    #[tokio::test]
    async fn test_missing_key_fails_and_records_lesson() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        let knowledge = settings.knowledge_dir();

        let mut pipeline = VideoPipeline::new(settings).unwrap();
        let decided = pipeline
            .reasoning()
            .current()
            .unwrap()
            .decisions_made
            .iter()
            .any(|d| d.decision == "Use AI-generated images only");
        assert!(decided);

        let err = pipeline.run(Some("AI Mass Layoffs"), false, true).await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
        assert!(pipeline.reasoning().current().is_none());

        let chains = std::fs::read_dir(&knowledge)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("chain_pipeline_"))
            .count();
        assert_eq!(chains, 1);
        let store = KnowledgeStore::open(&knowledge);
        assert!(store.patterns().any(|(key, p)| key.starts_with("avoid_") && p.failure_context.is_some()));
    }
}
