// VIDFORGE Voiceover
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Script text -> speakable text -> 5000-char chunks -> MP3 per chunk ->
// one narration track with short pauses between chunks.

use super::tts::{CloudTts, SpeechBackend, TranslateTts};
use crate::agent::production_tools::concat_audio_with_gaps;
use crate::agent::retry::{self, RetryPolicy};
use crate::agent::text_tools::chunk_text;
use crate::config::Settings;
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, info, warn};

pub const CHUNK_CHARS: usize = 5000;
pub const CHUNK_GAP_SECS: f64 = 0.3;

static HEADERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"#{1,6}\s*").expect("static regex"));
static VISUAL_CUES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[VISUAL:[^\]]*\]").expect("static regex"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{1,2}([^*]+)\*{1,2}").expect("static regex"));
static PAUSES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[PAUSE\]").expect("static regex"));
static DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}").expect("static regex"));
static URLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("static regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Strip everything a narrator should not read aloud.
pub fn clean_for_speech(text: &str) -> String {
    let text = HEADERS.replace_all(text, "");
    let text = VISUAL_CUES.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = PAUSES.replace_all(&text, ". . .");
    let text = DOTS.replace_all(&text, "...");
    let text = URLS.replace_all(&text, "");
    let text = SPACES.replace_all(&text, " ");
    text.trim().to_string()
}

/// Playback length in seconds, decoded locally.
pub fn audio_duration(path: &Path) -> Result<f64> {
    let file = std::fs::File::open(path).with_context(|| format!("Cannot open audio {:?}", path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| anyhow!("Unsupported audio {:?}: {}", path, e))?;
    let mut format = probed.format;
    let track = format.default_track().ok_or_else(|| anyhow!("No audio track in {:?}", path))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if rate > 0 {
            return Ok(frames as f64 / rate as f64);
        }
    }

    // No frame count in the header (plain MP3 without a Xing tag): walk the packets.
    let mut total: u64 = 0;
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() == track_id {
            total += packet.dur();
        }
    }
    match (params.time_base, params.sample_rate) {
        (Some(tb), _) => {
            let t = tb.calc_time(total);
            Ok(t.seconds as f64 + t.frac)
        }
        (None, Some(rate)) if rate > 0 => Ok(total as f64 / rate as f64),
        _ => bail!("Cannot determine duration of {:?}", path),
    }
}

pub struct Voiceover {
    backend: Box<dyn SpeechBackend>,
    output_dir: PathBuf,
    policy: RetryPolicy,
    pause: Duration,
}

impl Voiceover {
    /// Cloud TTS when `GOOGLE_CLOUD_TTS_KEY` is set, the free endpoint otherwise.
    pub fn new(settings: &Settings) -> Self {
        let backend: Box<dyn SpeechBackend> = match settings.keys.cloud_tts.as_deref() {
            Some(key) => Box::new(CloudTts::new(key, &settings.endpoints.cloud_tts, settings.video.voice_speed)),
            None => Box::new(TranslateTts::new(&settings.endpoints.translate_tts)),
        };
        info!("[VOICE] Using {} backend", backend.name());
        Self::with_backend(backend, settings.audio_dir())
    }

    pub fn with_backend(backend: Box<dyn SpeechBackend>, output_dir: PathBuf) -> Self {
        Self {
            backend,
            output_dir,
            policy: RetryPolicy::new(2, Duration::from_secs(2)),
            pause: Duration::from_millis(500),
        }
    }

    pub fn with_timing(mut self, policy: RetryPolicy, pause: Duration) -> Self {
        self.policy = policy;
        self.pause = pause;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Synthesize each chunk, skipping the ones that keep failing.
    async fn render_chunks(&self, text: &str, prefix: &str) -> Vec<PathBuf> {
        let chunks = chunk_text(&clean_for_speech(text), CHUNK_CHARS);
        info!("[VOICE] Processing {} audio chunks...", chunks.len());

        let mut files = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let path = self.output_dir.join(format!("{}_{:03}.mp3", prefix, i));
            let label = format!("synthesize chunk {}", i);
            match retry::with_backoff(self.policy, &label, || self.backend.synthesize(chunk, &path)).await {
                Ok(()) => {
                    debug!("[VOICE] Generated chunk {}/{}", i + 1, chunks.len());
                    files.push(path);
                }
                Err(e) => error!("[VOICE] Failed to generate chunk {}: {:#}", i, e),
            }
            tokio::time::sleep(self.pause).await;
        }
        files
    }

    async fn join(&self, chunk_files: &[PathBuf], output: &Path) -> Result<()> {
        let joined = concat_audio_with_gaps(chunk_files, CHUNK_GAP_SECS, output).await;
        for file in chunk_files {
            let _ = tokio::fs::remove_file(file).await;
        }
        joined
    }

    /// Full narration track at `<audio_dir>/<filename>`.
    pub async fn generate(&self, script_text: &str, filename: &str) -> Result<PathBuf> {
        info!("[VOICE] 🎙️ Generating voiceover...");
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let chunk_files = self.render_chunks(script_text, "chunk").await;
        if chunk_files.is_empty() {
            bail!("No audio chunks generated");
        }

        let output = self.output_dir.join(filename);
        self.join(&chunk_files, &output).await?;

        match audio_duration(&output) {
            Ok(d) => info!("[VOICE] ✓ Voiceover generated: {} ({:.1}s)", filename, d),
            Err(e) => warn!("[VOICE] ✓ Voiceover generated: {} (duration unknown: {:#})", filename, e),
        }
        Ok(output)
    }

    /// One file per non-trivial section, keyed by section name.
    pub async fn generate_sections(&self, sections: &[(&str, &str)]) -> BTreeMap<String, PathBuf> {
        let mut files = BTreeMap::new();
        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            error!("[VOICE] Cannot create {:?}: {}", self.output_dir, e);
            return files;
        }

        for (name, text) in sections {
            if text.trim().chars().count() < 10 {
                continue;
            }
            let chunk_files = self.render_chunks(text, &format!("{}_chunk", name)).await;
            if chunk_files.is_empty() {
                error!("[VOICE] Failed to generate {}: no audio", name);
                continue;
            }
            let output = self.output_dir.join(format!("{}.mp3", name));
            match self.join(&chunk_files, &output).await {
                Ok(()) => {
                    files.insert(name.to_string(), output);
                }
                Err(e) => error!("[VOICE] Failed to generate {}: {:#}", name, e),
            }
        }

        info!("[VOICE] ✓ Generated {} section audio files", files.len());
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records every text it is asked to speak, then fails.
    #[derive(Clone, Default)]
    struct FailingBackend {
        spoken: Arc<Mutex<Vec<String>>>,
    }

    impl FailingBackend {
        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn synthesize(&self, text: &str, _out: &Path) -> Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            bail!("service down")
        }
    }

    fn write_wav(path: &Path, sample_rate: u32, seconds: u32) {
        let samples = sample_rate * seconds;
        let data_len = samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_clean_for_speech() {
        let raw = "## HOOK\n**Point 1: Robots** are here. [VISUAL: robot arm] [PAUSE]\nSee https://example.com/x ..... *now*";
        assert_eq!(clean_for_speech(raw), "HOOK Point 1: Robots are here. . . . See ... now");
    }

    #[test]
    fn test_audio_duration_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 8000, 2);
        let d = audio_duration(&path).unwrap();
        assert!((d - 2.0).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_audio_duration_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.mp3");
        std::fs::write(&path, b"not audio at all").unwrap();
        assert!(audio_duration(&path).is_err());
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FailingBackend::default();
        let voice = Voiceover::with_backend(Box::new(backend.clone()), dir.path().to_path_buf())
            .with_timing(RetryPolicy::new(2, Duration::from_millis(1)), Duration::ZERO);
        let err = voice.generate("Some narration text.", "voiceover.mp3").await.unwrap_err();
        assert!(err.to_string().contains("No audio chunks"));
        assert_eq!(backend.spoken().len(), 2);
    }

    #[tokio::test]
    async fn test_sections_skip_short_text() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FailingBackend::default();
        let voice = Voiceover::with_backend(Box::new(backend.clone()), dir.path().to_path_buf())
            .with_timing(RetryPolicy::new(1, Duration::from_millis(1)), Duration::ZERO);
        let files = voice.generate_sections(&[("hook", "short"), ("overview", "long enough to narrate")]).await;
        assert!(files.is_empty());
        assert_eq!(backend.spoken(), vec!["long enough to narrate".to_string()]);
    }
}
