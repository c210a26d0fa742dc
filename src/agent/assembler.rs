// VIDFORGE Video Assembler
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Turns downloaded visuals plus the narration track into the final MP4:
// one segment per visual, stitched, titled, muxed, then optional Shorts.
// Every step is timed into an AssemblyMetrics log under `logs/`.

use crate::agent::production_tools::{self, FrameSpec, TITLE_CARD_SECONDS};
use crate::agent::video_stitcher::VideoStitcher;
use crate::agent::visual_sourcer::{Visual, VisualKind};
use crate::agent::voice::audio_duration;
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct VideoProject {
    pub id: String,
    pub title: String,
    pub script_text: String,
    pub visuals: Vec<Visual>,
    pub audio_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub shorts_paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct StepRecord {
    step: usize,
    name: String,
    timestamp: String,
    duration_s: Option<f64>,
    details: Value,
}

#[derive(Debug, Serialize)]
struct ErrorRecord {
    #[serde(rename = "type")]
    kind: String,
    message: String,
    timestamp: String,
    recoverable: bool,
    step: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QualitySignal {
    pub value: f64,
    pub target: Option<f64>,
    pub meets_target: Option<bool>,
}

/// Step-by-step record of one assembly, written as JSON on `finalize`.
pub struct AssemblyMetrics {
    project_id: String,
    logs_dir: PathBuf,
    started: Instant,
    started_at: String,
    steps: Vec<StepRecord>,
    errors: Vec<ErrorRecord>,
    quality_signals: BTreeMap<String, QualitySignal>,
}

impl AssemblyMetrics {
    pub fn new(project_id: &str, logs_dir: &Path) -> Self {
        Self {
            project_id: project_id.to_string(),
            logs_dir: logs_dir.to_path_buf(),
            started: Instant::now(),
            started_at: Local::now().to_rfc3339(),
            steps: Vec::new(),
            errors: Vec::new(),
            quality_signals: BTreeMap::new(),
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn signal(&self, name: &str) -> Option<&QualitySignal> {
        self.quality_signals.get(name)
    }

    pub fn log_step(&mut self, name: &str, details: Value, duration: Option<f64>) {
        let step = self.steps.len() + 1;
        match duration {
            Some(d) => info!("[ASSEMBLY] 📊 Step {}: {} ({:.2}s)", step, name, d),
            None => info!("[ASSEMBLY] 📊 Step {}: {}", step, name),
        }
        self.steps.push(StepRecord {
            step,
            name: name.to_string(),
            timestamp: Local::now().to_rfc3339(),
            duration_s: duration,
            details,
        });
    }

    pub fn log_error(&mut self, kind: &str, message: &str, recoverable: bool) {
        error!("[ASSEMBLY] ❌ Error at step {}: {} - {}", self.steps.len(), kind, message);
        self.errors.push(ErrorRecord {
            kind: kind.to_string(),
            message: message.to_string(),
            timestamp: Local::now().to_rfc3339(),
            recoverable,
            step: self.steps.len(),
        });
    }

    pub fn log_quality_signal(&mut self, name: &str, value: f64, target: Option<f64>) {
        let meets_target = target.map(|t| value >= t);
        self.quality_signals
            .insert(name.to_string(), QualitySignal { value, target, meets_target });
    }

    /// Write `assembly_<project>_<stamp>.json` and return its path.
    pub fn finalize(&self, success: bool) -> Result<PathBuf> {
        let report = json!({
            "project_id": self.project_id,
            "started_at": self.started_at,
            "completed_at": Local::now().to_rfc3339(),
            "total_duration_s": self.started.elapsed().as_secs_f64(),
            "success": success,
            "total_steps": self.steps.len(),
            "total_errors": self.errors.len(),
            "steps": self.steps,
            "errors": self.errors,
            "quality_signals": self.quality_signals,
        });

        std::fs::create_dir_all(&self.logs_dir)?;
        let path = self.logs_dir.join(format!(
            "assembly_{}_{}.json",
            self.project_id,
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Cannot write {:?}", path))?;
        info!("[ASSEMBLY] 📈 Assembly metrics saved: {:?}", path.file_name().unwrap_or_default());
        Ok(path)
    }
}

/// A planned Short: 1-based index, start and length in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortCut {
    pub index: usize,
    pub start: f64,
    pub length: f64,
}

/// Hook, first key point (30%) and middle insight (50%). Windows that run
/// past the end of the video are dropped.
pub fn plan_shorts(total: f64, max_len: f64) -> Vec<ShortCut> {
    let windows = [
        (0.0, max_len.min(total * 0.03)),
        (total * 0.3, total * 0.3 + max_len),
        (total * 0.5, total * 0.5 + max_len),
    ];
    windows
        .iter()
        .enumerate()
        .filter(|(_, (_, end))| *end <= total)
        .map(|(i, (start, end))| ShortCut {
            index: i + 1,
            start: *start,
            length: end.min(start + max_len) - start,
        })
        .filter(|cut| cut.length > 0.0)
        .collect()
}

pub struct VideoAssembler {
    frame: FrameSpec,
    shorts_width: u32,
    shorts_height: u32,
    shorts_duration: f64,
    min_duration: f64,
    output_dir: PathBuf,
    shorts_dir: PathBuf,
    work_dir: PathBuf,
    logs_dir: PathBuf,
}

impl VideoAssembler {
    pub fn new(settings: &Settings) -> Self {
        let video = &settings.video;
        Self {
            frame: FrameSpec {
                width: video.width,
                height: video.height,
                fps: video.fps,
            },
            shorts_width: video.shorts_width,
            shorts_height: video.shorts_height,
            shorts_duration: video.shorts_duration as f64,
            min_duration: video.min_duration as f64,
            output_dir: settings.output_dir.clone(),
            shorts_dir: settings.shorts_dir(),
            work_dir: settings.video_work_dir(),
            logs_dir: settings.logs_dir.clone(),
        }
    }

    /// Render `project` to `output/<id>_<stamp>.mp4`. The path is also stored
    /// on the project, along with any Shorts produced.
    pub async fn assemble(&self, project: &mut VideoProject, add_captions: bool, generate_shorts: bool) -> Result<PathBuf> {
        info!("[ASSEMBLY] 🎬 Assembling video: {}", project.title);
        let mut metrics = AssemblyMetrics::new(&project.id, &self.logs_dir);
        let started = Instant::now();

        match self.run(project, &mut metrics, add_captions, generate_shorts).await {
            Ok(output) => {
                metrics.log_quality_signal("total_assembly_time", started.elapsed().as_secs_f64(), Some(300.0));
                if let Err(e) = metrics.finalize(true) {
                    warn!("[ASSEMBLY] Could not save metrics: {:#}", e);
                }
                info!(
                    "[ASSEMBLY] ✅ Video complete: {:?} ({} shorts)",
                    output,
                    project.shorts_paths.len()
                );
                Ok(output)
            }
            Err(e) => {
                metrics.log_error("assembly_failed", &format!("{:#}", e), false);
                if let Err(save_err) = metrics.finalize(false) {
                    warn!("[ASSEMBLY] Could not save metrics: {:#}", save_err);
                }
                Err(e)
            }
        }
    }

    async fn narration_duration(audio: &Path) -> Result<f64> {
        match audio_duration(audio) {
            Ok(d) if d > 0.0 => Ok(d),
            _ => production_tools::media_duration(audio).await,
        }
    }

    async fn run(
        &self,
        project: &mut VideoProject,
        metrics: &mut AssemblyMetrics,
        add_captions: bool,
        generate_shorts: bool,
    ) -> Result<PathBuf> {
        let audio = project.audio_path.clone().context("Project has no narration audio")?;
        let work_dir = self.work_dir.join(&project.id);
        std::fs::create_dir_all(&work_dir).with_context(|| format!("Cannot create {:?}", work_dir))?;
        std::fs::create_dir_all(&self.output_dir)?;

        // 1: narration length drives the whole timeline
        let step = Instant::now();
        let total = Self::narration_duration(&audio).await?;
        metrics.log_step("load_audio", json!({ "duration": total, "path": audio }), Some(step.elapsed().as_secs_f64()));
        metrics.log_quality_signal("audio_duration", total, Some(self.min_duration));

        // 2: one equal-length segment per visual
        if project.visuals.is_empty() {
            metrics.log_error("no_visuals", "No visuals provided", false);
            bail!("No visuals provided");
        }
        let count = project.visuals.len();
        let segment_duration = total / count as f64;
        metrics.log_step(
            "calculate_timing",
            json!({ "num_visuals": count, "segment_duration": segment_duration }),
            None,
        );

        // 3: render segments, black placeholder on failure
        let step = Instant::now();
        let mut segments = Vec::with_capacity(count);
        let mut loaded = 0usize;
        for (i, visual) in project.visuals.iter().enumerate() {
            let out = work_dir.join(format!("seg_{:03}.mp4", i));
            match self.render_visual(visual, segment_duration, &out).await {
                Ok(()) => loaded += 1,
                Err(e) => {
                    warn!("[ASSEMBLY] Visual {} failed: {:#}", visual.id, e);
                    metrics.log_error("visual_load_failed", &format!("Visual {} failed, using placeholder", i), true);
                    production_tools::black_segment(segment_duration, self.frame, &out)
                        .await
                        .context("Placeholder segment failed")?;
                }
            }
            segments.push(out);
        }
        metrics.log_step(
            "load_visuals",
            json!({ "loaded": loaded, "failed": count - loaded }),
            Some(step.elapsed().as_secs_f64()),
        );
        metrics.log_quality_signal("visuals_loaded_pct", loaded as f64 * 100.0 / count as f64, Some(80.0));

        // 4: stitch
        let step = Instant::now();
        let stitched = VideoStitcher::finalize(&segments, &work_dir.join("stitched.mp4")).await?;
        metrics.log_step("concatenate_visuals", json!({ "segments": segments.len() }), Some(step.elapsed().as_secs_f64()));

        // 5: title card
        let mut sequence = stitched;
        if add_captions {
            let step = Instant::now();
            let titled = work_dir.join("titled.mp4");
            production_tools::overlay_title(&sequence, &project.title, &titled).await?;
            sequence = titled;
            metrics.log_step(
                "add_captions",
                json!({ "title_duration": TITLE_CARD_SECONDS }),
                Some(step.elapsed().as_secs_f64()),
            );
        }

        // 6: narration
        let step = Instant::now();
        let output = self
            .output_dir
            .join(format!("{}_{}.mp4", project.id, Local::now().format("%Y%m%d_%H%M%S")));
        info!("[ASSEMBLY] 🔄 Rendering video... (this may take a while)");
        production_tools::mux_audio(&sequence, &audio, &output).await?;
        let size_mb = std::fs::metadata(&output).map(|m| m.len() as f64 / (1024.0 * 1024.0)).unwrap_or(0.0);
        metrics.log_step(
            "render_video",
            json!({ "output_file": output, "file_size_mb": size_mb }),
            Some(step.elapsed().as_secs_f64()),
        );
        project.output_path = Some(output.clone());

        let output_duration = production_tools::media_duration(&output).await.unwrap_or(total);
        metrics.log_quality_signal("output_duration", output_duration, Some(self.min_duration));

        // 7: shorts
        if generate_shorts {
            let step = Instant::now();
            project.shorts_paths = self.extract_shorts(&output, output_duration, &project.id).await;
            metrics.log_step(
                "generate_shorts",
                json!({ "count": project.shorts_paths.len() }),
                Some(step.elapsed().as_secs_f64()),
            );
        }

        Ok(output)
    }

    async fn render_visual(&self, visual: &Visual, duration: f64, out: &Path) -> Result<()> {
        let Some(input) = visual.local_path.as_deref() else {
            bail!("{} was never downloaded", visual.id);
        };
        if !input.exists() {
            bail!("{:?} is missing", input);
        }
        production_tools::render_segment(input, visual.kind == VisualKind::Image, duration, self.frame, out).await
    }

    async fn extract_shorts(&self, video: &Path, total: f64, project_id: &str) -> Vec<PathBuf> {
        if let Err(e) = std::fs::create_dir_all(&self.shorts_dir) {
            warn!("[ASSEMBLY] Cannot create shorts dir: {}", e);
            return Vec::new();
        }

        let mut paths = Vec::new();
        for cut in plan_shorts(total, self.shorts_duration) {
            let out = self.shorts_dir.join(format!("{}_short_{}.mp4", project_id, cut.index));
            match production_tools::extract_short(video, cut.start, cut.length, self.shorts_width, self.shorts_height, &out).await {
                Ok(()) => paths.push(out),
                Err(e) => warn!("[ASSEMBLY] Failed to extract short {}: {:#}", cut.index, e),
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_plan_shorts_for_long_video() {
        let cuts = plan_shorts(900.0, 59.0);
        assert_eq!(cuts.len(), 3);
        assert_eq!(cuts[0].index, 1);
        assert_eq!(cuts[0].start, 0.0);
        assert!(close(cuts[0].length, 27.0));
        assert!(close(cuts[1].start, 270.0));
        assert!(close(cuts[1].length, 59.0));
        assert_eq!(cuts[2].index, 3);
        assert!(close(cuts[2].start, 450.0));
    }

    #[test]
    fn test_plan_shorts_caps_hook_and_skips_overruns() {
        // 100 s: hook 3 s, 30..89 fits, 50..109 overruns
        let cuts = plan_shorts(100.0, 59.0);
        assert_eq!(cuts.len(), 2);
        assert!(close(cuts[0].length, 3.0));
        assert_eq!(cuts[1].index, 2);

        let long = plan_shorts(4000.0, 59.0);
        assert!(close(long[0].length, 59.0));
    }

    #[test]
    fn test_quality_signal_targets() {
        let dir = tempfile::tempdir().unwrap();
        let mut metrics = AssemblyMetrics::new("p1", dir.path());
        metrics.log_quality_signal("audio_duration", 900.0, Some(840.0));
        metrics.log_quality_signal("visuals_loaded_pct", 50.0, Some(80.0));
        metrics.log_quality_signal("untargeted", 1.0, None);
        assert_eq!(metrics.signal("audio_duration").unwrap().meets_target, Some(true));
        assert_eq!(metrics.signal("visuals_loaded_pct").unwrap().meets_target, Some(false));
        assert_eq!(metrics.signal("untargeted").unwrap().meets_target, None);
    }

    #[test]
    fn test_finalize_writes_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut metrics = AssemblyMetrics::new("p1", dir.path());
        metrics.log_step("load_audio", json!({ "duration": 12.0 }), Some(0.1));
        metrics.log_error("visual_load_failed", "Visual 0 failed, using placeholder", true);
        assert_eq!((metrics.step_count(), metrics.error_count()), (1, 1));
        let path = metrics.finalize(false).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("assembly_p1_"));

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved["success"], false);
        assert_eq!(saved["total_steps"], 1);
        assert_eq!(saved["errors"][0]["type"], "visual_load_failed");
        assert_eq!(saved["errors"][0]["recoverable"], true);
        assert_eq!(saved["errors"][0]["step"], 1);
    }

    #[tokio::test]
    async fn test_assemble_without_audio_records_failure() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        let assembler = VideoAssembler::new(&settings);
        let mut project = VideoProject {
            id: "noaudio".to_string(),
            title: "T".to_string(),
            ..Default::default()
        };

        let err = assembler.assemble(&mut project, true, true).await.unwrap_err();
        assert!(err.to_string().contains("no narration"));

        let logs: Vec<_> = std::fs::read_dir(&settings.logs_dir).unwrap().flatten().collect();
        assert_eq!(logs.len(), 1);
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(logs[0].path()).unwrap()).unwrap();
        assert_eq!(saved["success"], false);
        assert_eq!(saved["errors"][0]["type"], "assembly_failed");
    }
}
