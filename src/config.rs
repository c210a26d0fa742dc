// VIDFORGE Configuration
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// API keys are read from the environment (main loads `.env` first).
// Everything else carries defaults tuned for 15-20 minute narrated videos.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Third-party credentials. Empty variables count as missing.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub gemini: Option<String>,
    pub pexels: Option<String>,
    pub pixabay: Option<String>,
    pub cloud_tts: Option<String>,
}

/// OAuth material for the YouTube Data API (refresh-token grant only).
#[derive(Debug, Clone, Default)]
pub struct YouTubeCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

impl YouTubeCredentials {
    pub fn is_complete(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub target_duration: u32,
    pub min_duration: u32,
    pub max_duration: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub shorts_duration: u32,
    pub shorts_width: u32,
    pub shorts_height: u32,
    pub voice_speed: f64,
    pub background_music_volume: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            target_duration: 900,
            min_duration: 840,
            max_duration: 1200,
            width: 1920,
            height: 1080,
            fps: 30,
            shorts_duration: 59,
            shorts_width: 1080,
            shorts_height: 1920,
            voice_speed: 1.0,
            background_music_volume: 0.1,
        }
    }
}

/// Word targets assume ~150 spoken words per minute.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    pub target_words: usize,
    pub min_words: usize,
    pub max_words: usize,
    pub hook_percent: u32,
    pub overview_percent: u32,
    pub breakdown_percent: u32,
    pub implications_percent: u32,
    pub conclusion_percent: u32,
    pub num_key_points: u32,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            target_words: 2250,
            min_words: 2000,
            max_words: 2700,
            hook_percent: 3,
            overview_percent: 10,
            breakdown_percent: 60,
            implications_percent: 17,
            conclusion_percent: 10,
            num_key_points: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub keywords: Vec<String>,
    pub rss_feeds: Vec<String>,
    pub reddit_subs: Vec<String>,
    pub visual_keywords: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            keywords: owned(&[
                "AI layoffs 2026",
                "robotics unemployment",
                "artificial intelligence jobs",
                "automation job loss",
                "humanoid robots workers",
                "ChatGPT replacing jobs",
                "AI mass unemployment",
                "robot workforce 2026",
            ]),
            rss_feeds: owned(&[
                "https://news.google.com/rss/search?q=AI+robots+jobs+2026&hl=en-US&gl=US&ceid=US:en",
                "https://news.google.com/rss/search?q=artificial+intelligence+unemployment&hl=en-US&gl=US&ceid=US:en",
            ]),
            reddit_subs: owned(&["Futurology", "singularity", "artificial", "technology"]),
            visual_keywords: owned(&[
                "humanoid robot",
                "artificial intelligence",
                "office automation",
                "futuristic technology",
                "robot worker",
                "digital brain",
                "job interview",
                "unemployment line",
            ]),
        }
    }
}

/// Base URLs of every external service. Tests point these at a mock server.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    pub gemini: String,
    pub pexels_videos: String,
    pub pexels_photos: String,
    pub pixabay_images: String,
    pub pixabay_videos: String,
    pub pollinations: String,
    pub reddit: String,
    pub translate_tts: String,
    pub cloud_tts: String,
    pub youtube_api: String,
    pub youtube_upload: String,
    pub oauth_token: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            gemini: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            pexels_videos: "https://api.pexels.com/videos/search".to_string(),
            pexels_photos: "https://api.pexels.com/v1/search".to_string(),
            pixabay_images: "https://pixabay.com/api/".to_string(),
            pixabay_videos: "https://pixabay.com/api/videos/".to_string(),
            pollinations: "https://image.pollinations.ai".to_string(),
            reddit: "https://www.reddit.com".to_string(),
            translate_tts: "https://translate.google.com/translate_tts".to_string(),
            cloud_tts: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            youtube_api: "https://www.googleapis.com/youtube/v3".to_string(),
            youtube_upload: "https://www.googleapis.com/upload/youtube/v3".to_string(),
            oauth_token: "https://oauth2.googleapis.com/token".to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Route every service to paths under a single host.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            gemini: format!("{}/v1beta", base),
            pexels_videos: format!("{}/videos/search", base),
            pexels_photos: format!("{}/v1/search", base),
            pixabay_images: format!("{}/api/", base),
            pixabay_videos: format!("{}/api/videos/", base),
            pollinations: base.to_string(),
            reddit: base.to_string(),
            translate_tts: format!("{}/translate_tts", base),
            cloud_tts: format!("{}/v1/text:synthesize", base),
            youtube_api: format!("{}/youtube/v3", base),
            youtube_upload: format!("{}/upload/youtube/v3", base),
            oauth_token: format!("{}/token", base),
        }
    }
}

/// Everything a pipeline run needs to know about its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub keys: ApiKeys,
    pub youtube: YouTubeCredentials,
    pub video: VideoConfig,
    pub script: ScriptConfig,
    pub content: ContentConfig,
    pub endpoints: ApiEndpoints,
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    /// Defaults rooted at `base_dir`, no credentials.
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        Self {
            output_dir: base_dir.join("output"),
            assets_dir: base_dir.join("assets"),
            temp_dir: base_dir.join("temp"),
            logs_dir: base_dir.join("logs"),
            base_dir,
            keys: ApiKeys::default(),
            youtube: YouTubeCredentials::default(),
            video: VideoConfig::default(),
            script: ScriptConfig::default(),
            content: ContentConfig::default(),
            endpoints: ApiEndpoints::default(),
        }
    }

    /// Read keys from the process environment. `VIDFORGE_HOME` moves the
    /// working directories away from the current directory.
    pub fn from_env() -> Self {
        let base_dir = env_key("VIDFORGE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let mut settings = Self::with_base_dir(base_dir);
        settings.keys = ApiKeys {
            gemini: env_key("GEMINI_API_KEY"),
            pexels: env_key("PEXELS_API_KEY"),
            pixabay: env_key("PIXABAY_API_KEY"),
            cloud_tts: env_key("GOOGLE_CLOUD_TTS_KEY"),
        };
        settings.youtube = YouTubeCredentials {
            client_id: env_key("YOUTUBE_CLIENT_ID"),
            client_secret: env_key("YOUTUBE_CLIENT_SECRET"),
            refresh_token: env_key("YOUTUBE_REFRESH_TOKEN"),
        };
        settings
    }

    pub fn knowledge_dir(&self) -> PathBuf {
        self.logs_dir.join("knowledge")
    }

    pub fn visuals_dir(&self) -> PathBuf {
        self.temp_dir.join("visuals")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.temp_dir.join("audio")
    }

    pub fn video_work_dir(&self) -> PathBuf {
        self.temp_dir.join("video_work")
    }

    pub fn shorts_dir(&self) -> PathBuf {
        self.output_dir.join("shorts")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join("video_generator.log")
    }

    /// Create every working directory the pipeline writes into.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.output_dir.clone(),
            self.assets_dir.clone(),
            self.temp_dir.clone(),
            self.logs_dir.clone(),
            self.knowledge_dir(),
            self.visuals_dir(),
            self.audio_dir(),
            self.video_work_dir(),
            self.shorts_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {:?}", dir))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_follow_base() {
        let settings = Settings::with_base_dir("/tmp/vidforge_base");
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/vidforge_base/output"));
        assert_eq!(
            settings.knowledge_dir(),
            PathBuf::from("/tmp/vidforge_base/logs/knowledge")
        );
        assert!(settings.keys.gemini.is_none());
    }

    #[test]
    fn test_mock_endpoints_share_host() {
        let endpoints = ApiEndpoints::with_base("http://127.0.0.1:9000/");
        assert_eq!(endpoints.reddit, "http://127.0.0.1:9000");
        assert_eq!(endpoints.pexels_videos, "http://127.0.0.1:9000/videos/search");
        assert_eq!(endpoints.oauth_token, "http://127.0.0.1:9000/token");
    }

    #[test]
    fn test_script_sections_cover_whole_video() {
        let cfg = ScriptConfig::default();
        let total = cfg.hook_percent
            + cfg.overview_percent
            + cfg.breakdown_percent
            + cfg.implications_percent
            + cfg.conclusion_percent;
        assert_eq!(total, 100);
    }
}
