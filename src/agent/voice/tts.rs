// VIDFORGE Text-to-Speech Backends
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Two HTTP backends behind one trait: Google Cloud TTS when a key is
// configured, otherwise the keyless translate endpoint.

use crate::agent::text_tools::chunk_text;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::engine::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// The translate endpoint rejects longer inputs.
pub const TRANSLATE_PIECE_CHARS: usize = 200;

#[async_trait]
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render `text` as MP3 into `out`, replacing any existing file.
    async fn synthesize(&self, text: &str, out: &Path) -> Result<()>;
}

// --- Google Cloud TTS ---

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct VoiceSelection<'a> {
    #[serde(rename = "languageCode")]
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: &'static str,
    #[serde(rename = "speakingRate")]
    speaking_rate: f64,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent", default)]
    audio_content: String,
}

pub struct CloudTts {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    voice: String,
    speaking_rate: f64,
}

impl CloudTts {
    pub fn new(api_key: &str, endpoint: &str, speaking_rate: f64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            voice: "en-US-Neural2-D".to_string(),
            speaking_rate,
        }
    }
}

#[async_trait]
impl SpeechBackend for CloudTts {
    fn name(&self) -> &'static str {
        "google-cloud-tts"
    }

    async fn synthesize(&self, text: &str, out: &Path) -> Result<()> {
        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: "en-US",
                name: &self.voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: self.speaking_rate,
            },
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .timeout(Duration::from_secs(60))
            .json(&body)
            .send()
            .await
            .context("Cloud TTS request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            bail!("Cloud TTS returned {}: {}", status, detail);
        }

        let parsed: SynthesizeResponse = resp.json().await.context("Unexpected Cloud TTS response")?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| anyhow!("Invalid base64 audio: {}", e))?;
        if audio.is_empty() {
            bail!("Cloud TTS returned no audio");
        }
        tokio::fs::write(out, audio).await.with_context(|| format!("Cannot write {:?}", out))?;
        Ok(())
    }
}

// --- Keyless translate endpoint ---

pub struct TranslateTts {
    client: reqwest::Client,
    endpoint: String,
    lang: String,
}

impl TranslateTts {
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: endpoint.to_string(),
            lang: "en".to_string(),
        }
    }
}

#[async_trait]
impl SpeechBackend for TranslateTts {
    fn name(&self) -> &'static str {
        "translate-tts"
    }

    async fn synthesize(&self, text: &str, out: &Path) -> Result<()> {
        let pieces = chunk_text(text, TRANSLATE_PIECE_CHARS);
        if pieces.is_empty() {
            bail!("Nothing to synthesize");
        }

        // MP3 frames are self-delimiting, so bodies can be appended.
        let mut audio = Vec::new();
        let total = pieces.len().to_string();
        for (idx, piece) in pieces.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = piece.chars().count().to_string();
            let resp = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.lang.as_str()),
                    ("q", piece.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .timeout(Duration::from_secs(30))
                .send()
                .await
                .context("Translate TTS request failed")?
                .error_for_status()
                .context("Translate TTS rejected the request")?;
            audio.extend_from_slice(&resp.bytes().await?);
        }

        debug!("[VOICE] {} pieces, {} bytes of audio", pieces.len(), audio.len());
        tokio::fs::write(out, audio).await.with_context(|| format!("Cannot write {:?}", out))?;
        Ok(())
    }
}
