// VIDFORGE Visual Sourcer
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// B-roll comes from Pexels and Pixabay (keyed, free tiers) and from
// Pollinations, which renders an image for any prompt URL without a key.

use crate::agent::download_guard::DownloadGuard;
use crate::agent::retry::{self, RetryPolicy};
use crate::agent::text_tools::{generate_id, truncate_chars};
use crate::config::{ApiEndpoints, ApiKeys, Settings};
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

static VISUAL_CUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[VISUAL:\s*([^\]]+)\]").expect("static regex"));

const GENERIC_PROMPTS: &[&str] = &[
    "futuristic humanoid robot in modern office, photorealistic, 4k",
    "artificial intelligence neural network visualization, blue glow, cinematic",
    "worried office workers looking at computer screens, corporate setting",
    "automation factory with robots, dramatic lighting",
    "person shaking hands with android robot, photorealistic",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Video,
    Image,
}

impl VisualKind {
    pub fn extension(self) -> &'static str {
        match self {
            VisualKind::Video => "mp4",
            VisualKind::Image => "jpg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visual {
    pub id: String,
    pub kind: VisualKind,
    pub source: String,
    pub url: String,
    pub download_url: String,
    pub local_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Seconds; zero for stills.
    pub duration: f64,
    pub description: String,
}

// --- Provider payloads ---

#[derive(Debug, Deserialize)]
struct PexelsVideoPage {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhotoPage {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    id: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    src: PexelsPhotoSrc,
}

#[derive(Debug, Default, Deserialize)]
struct PexelsPhotoSrc {
    #[serde(default)]
    large2x: String,
}

#[derive(Debug, Deserialize)]
struct PixabayPage<T> {
    #[serde(default = "Vec::new")]
    hits: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PixabayVideo {
    id: u64,
    #[serde(default, rename = "pageURL")]
    page_url: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    videos: PixabayRenditions,
}

#[derive(Debug, Default, Deserialize)]
struct PixabayRenditions {
    large: Option<PixabayRendition>,
    medium: Option<PixabayRendition>,
}

#[derive(Debug, Deserialize)]
struct PixabayRendition {
    #[serde(default)]
    url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PixabayImage {
    id: u64,
    #[serde(default, rename = "pageURL")]
    page_url: String,
    #[serde(default, rename = "largeImageURL")]
    large_image_url: String,
    #[serde(default, rename = "imageWidth")]
    width: Option<u32>,
    #[serde(default, rename = "imageHeight")]
    height: Option<u32>,
}

pub struct VisualSourcer {
    client: reqwest::Client,
    keys: ApiKeys,
    endpoints: ApiEndpoints,
    visual_keywords: Vec<String>,
    download_dir: PathBuf,
    search_policy: RetryPolicy,
    download_policy: RetryPolicy,
    pause: Duration,
}

impl VisualSourcer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            keys: settings.keys.clone(),
            endpoints: settings.endpoints.clone(),
            visual_keywords: settings.content.visual_keywords.clone(),
            download_dir: settings.visuals_dir(),
            search_policy: RetryPolicy::new(2, Duration::from_secs(1)),
            download_policy: RetryPolicy::new(3, Duration::from_secs(2)),
            pause: Duration::from_millis(500),
        }
    }

    /// Override retry policies and the pause between keyword rounds.
    pub fn with_timing(mut self, search: RetryPolicy, download: RetryPolicy, pause: Duration) -> Self {
        self.search_policy = search;
        self.download_policy = download;
        self.pause = pause;
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        auth: Option<&str>,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut req = self.client.get(url).query(params).timeout(SEARCH_TIMEOUT);
        if let Some(key) = auth {
            req = req.header("Authorization", key);
        }
        let resp = req.send().await.with_context(|| format!("Request to {} failed", url))?;
        let resp = resp.error_for_status()?;
        resp.json().await.context("Unexpected search response")
    }

    // --- Pexels ---

    pub async fn search_pexels_videos(&self, query: &str, count: usize) -> Vec<Visual> {
        let Some(key) = self.keys.pexels.as_deref() else {
            warn!("[VISUALS] No Pexels API key, skipping Pexels videos");
            return Vec::new();
        };
        retry::with_fallback(self.search_policy, "search_pexels_videos", Vec::new(), move || async move {
            let params = [
                ("query", query.to_string()),
                ("per_page", count.to_string()),
                ("orientation", "landscape".to_string()),
            ];
            let page: PexelsVideoPage = self.get_json(&self.endpoints.pexels_videos, Some(key), &params).await?;
            let visuals: Vec<Visual> = page
                .videos
                .into_iter()
                .filter_map(|video| {
                    let pos = video
                        .video_files
                        .iter()
                        .position(|f| f.quality.as_deref() == Some("hd"))
                        .unwrap_or(0);
                    let file = video.video_files.get(pos)?;
                    Some(Visual {
                        id: format!("pexels_{}", video.id),
                        kind: VisualKind::Video,
                        source: "pexels".to_string(),
                        url: video.url.clone(),
                        download_url: file.link.clone(),
                        local_path: None,
                        width: file.width.unwrap_or(1920),
                        height: file.height.unwrap_or(1080),
                        duration: if video.duration > 0.0 { video.duration } else { 10.0 },
                        description: query.to_string(),
                    })
                })
                .collect();
            info!("[VISUALS] Pexels videos '{}': found {}", query, visuals.len());
            Ok(visuals)
        })
        .await
    }

    pub async fn search_pexels_photos(&self, query: &str, count: usize) -> Vec<Visual> {
        let Some(key) = self.keys.pexels.as_deref() else {
            return Vec::new();
        };
        retry::with_fallback(self.search_policy, "search_pexels_photos", Vec::new(), move || async move {
            let params = [
                ("query", query.to_string()),
                ("per_page", count.to_string()),
                ("orientation", "landscape".to_string()),
            ];
            let page: PexelsPhotoPage = self.get_json(&self.endpoints.pexels_photos, Some(key), &params).await?;
            let visuals: Vec<Visual> = page
                .photos
                .into_iter()
                .map(|photo| Visual {
                    id: format!("pexels_{}", photo.id),
                    kind: VisualKind::Image,
                    source: "pexels".to_string(),
                    url: photo.url,
                    download_url: photo.src.large2x,
                    local_path: None,
                    width: photo.width.unwrap_or(1920),
                    height: photo.height.unwrap_or(1080),
                    duration: 0.0,
                    description: query.to_string(),
                })
                .collect();
            info!("[VISUALS] Pexels photos '{}': found {}", query, visuals.len());
            Ok(visuals)
        })
        .await
    }

    // --- Pixabay ---

    pub async fn search_pixabay_videos(&self, query: &str, count: usize) -> Vec<Visual> {
        let Some(key) = self.keys.pixabay.as_deref() else {
            warn!("[VISUALS] No Pixabay API key, skipping Pixabay videos");
            return Vec::new();
        };
        retry::with_fallback(self.search_policy, "search_pixabay_videos", Vec::new(), move || async move {
            let params = [
                ("key", key.to_string()),
                ("q", query.to_string()),
                ("per_page", count.to_string()),
                ("video_type", "all".to_string()),
            ];
            let page: PixabayPage<PixabayVideo> = self.get_json(&self.endpoints.pixabay_videos, None, &params).await?;
            let visuals: Vec<Visual> = page
                .hits
                .into_iter()
                .filter_map(|hit| {
                    let rendition = hit.videos.large.or(hit.videos.medium)?;
                    Some(Visual {
                        id: format!("pixabay_{}", hit.id),
                        kind: VisualKind::Video,
                        source: "pixabay".to_string(),
                        url: hit.page_url,
                        download_url: rendition.url,
                        local_path: None,
                        width: rendition.width.unwrap_or(1920),
                        height: rendition.height.unwrap_or(1080),
                        duration: if hit.duration > 0.0 { hit.duration } else { 10.0 },
                        description: query.to_string(),
                    })
                })
                .collect();
            info!("[VISUALS] Pixabay videos '{}': found {}", query, visuals.len());
            Ok(visuals)
        })
        .await
    }

    pub async fn search_pixabay_images(&self, query: &str, count: usize) -> Vec<Visual> {
        let Some(key) = self.keys.pixabay.as_deref() else {
            return Vec::new();
        };
        retry::with_fallback(self.search_policy, "search_pixabay_images", Vec::new(), move || async move {
            let params = [
                ("key", key.to_string()),
                ("q", query.to_string()),
                ("per_page", count.to_string()),
                ("image_type", "all".to_string()),
                ("orientation", "horizontal".to_string()),
            ];
            let page: PixabayPage<PixabayImage> = self.get_json(&self.endpoints.pixabay_images, None, &params).await?;
            let visuals: Vec<Visual> = page
                .hits
                .into_iter()
                .map(|hit| Visual {
                    id: format!("pixabay_{}", hit.id),
                    kind: VisualKind::Image,
                    source: "pixabay".to_string(),
                    url: hit.page_url,
                    download_url: hit.large_image_url,
                    local_path: None,
                    width: hit.width.unwrap_or(1920),
                    height: hit.height.unwrap_or(1080),
                    duration: 0.0,
                    description: query.to_string(),
                })
                .collect();
            info!("[VISUALS] Pixabay images '{}': found {}", query, visuals.len());
            Ok(visuals)
        })
        .await
    }

    // --- Pollinations ---

    /// The image is rendered when the URL is first fetched, so this makes no request.
    pub fn ai_image(&self, prompt: &str, width: u32, height: u32) -> Result<Visual> {
        let clean = prompt.replace('\n', " ").trim().to_string();
        let mut url = url::Url::parse(&self.endpoints.pollinations).context("Invalid Pollinations base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Pollinations base URL cannot carry a path"))?
            .pop_if_empty()
            .push("prompt")
            .push(&clean);
        url.query_pairs_mut()
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string());

        info!("[VISUALS] AI image prompt: {}...", truncate_chars(prompt, 50));
        Ok(Visual {
            id: format!("pollinations_{}", generate_id(prompt)),
            kind: VisualKind::Image,
            source: "pollinations".to_string(),
            url: url.to_string(),
            download_url: url.to_string(),
            local_path: None,
            width,
            height,
            duration: 0.0,
            description: prompt.to_string(),
        })
    }

    /// AI stills for each `[VISUAL: ...]` cue, padded with generic prompts.
    pub fn ai_images_from_script(&self, script_text: &str, count: usize) -> Vec<Visual> {
        let mut prompts: Vec<String> = VISUAL_CUE
            .captures_iter(script_text)
            .take(count)
            .map(|c| format!("photorealistic, 4k, cinematic lighting, {}, technology, futuristic", c[1].trim()))
            .collect();
        if prompts.len() < count {
            let missing = count - prompts.len();
            prompts.extend(GENERIC_PROMPTS.iter().take(missing).map(|p| p.to_string()));
        }

        let visuals: Vec<Visual> = prompts
            .iter()
            .filter_map(|p| match self.ai_image(p, 1920, 1080) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("[VISUALS] Skipping AI prompt: {:#}", e);
                    None
                }
            })
            .collect();
        info!("[VISUALS] Generated {} AI image prompts", visuals.len());
        visuals
    }

    // --- Collection ---

    /// Stock footage first, stock stills second, AI stills to fill the gap.
    pub async fn collect_for_topic(&self, topic: &str, script_text: &str, target: usize) -> Vec<Visual> {
        info!("[VISUALS] 🎬 Collecting visuals for: {}...", truncate_chars(topic, 50));
        let keywords: Vec<&String> = self.visual_keywords.iter().take(5).collect();
        let mut all = Vec::new();

        for keyword in keywords.iter().take(3) {
            all.extend(self.search_pexels_videos(keyword, 2).await);
            all.extend(self.search_pixabay_videos(keyword, 2).await);
            tokio::time::sleep(self.pause).await;
        }
        for keyword in &keywords {
            all.extend(self.search_pexels_photos(keyword, 2).await);
            all.extend(self.search_pixabay_images(keyword, 2).await);
            tokio::time::sleep(self.pause).await;
        }

        let ai_count = 5.max(target.saturating_sub(all.len()));
        all.extend(self.ai_images_from_script(script_text, ai_count));

        let mut seen = HashSet::new();
        let unique: Vec<Visual> = all
            .into_iter()
            .filter(|v| seen.insert(v.id.clone()))
            .take(target)
            .collect();

        let videos = unique.iter().filter(|v| v.kind == VisualKind::Video).count();
        info!(
            "[VISUALS] ✓ Collected {} visuals ({} videos, {} images)",
            unique.len(),
            videos,
            unique.len() - videos
        );
        unique
    }

    pub fn target_path(&self, visual: &Visual) -> PathBuf {
        self.download_dir.join(format!("{}.{}", visual.id, visual.kind.extension()))
    }

    async fn fetch_to(&self, url: &str, path: &Path) -> Result<()> {
        let mut resp = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Cannot create {:?}", path))?;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    /// In-progress name; keeps the media extension so the guard can check it.
    fn partial_path(path: &Path) -> PathBuf {
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        let ext = path.extension().unwrap_or_default().to_string_lossy();
        path.with_file_name(format!("{}.part.{}", stem, ext))
    }

    /// Download one visual into temp/visuals, reusing an existing file that
    /// still passes validation.
    pub async fn download(&self, visual: &Visual) -> Result<Visual> {
        let path = self.target_path(visual);
        let mut done = visual.clone();

        if path.exists() {
            match DownloadGuard::validate_downloaded_file(&path) {
                Ok(()) => {
                    done.local_path = Some(path);
                    return Ok(done);
                }
                Err(reason) => {
                    warn!("[VISUALS] Discarding cached {}: {}", visual.id, reason);
                    tokio::fs::remove_file(&path)
                        .await
                        .with_context(|| format!("Cannot remove {:?}", path))?;
                }
            }
        }

        DownloadGuard::validate_url(&visual.download_url).map_err(|e| anyhow!(e))?;
        tokio::fs::create_dir_all(&self.download_dir).await?;

        info!("[VISUALS] Downloading: {}", visual.id);
        let partial = Self::partial_path(&path);
        let fetched =
            retry::with_backoff(self.download_policy, "download_visual", || self.fetch_to(&visual.download_url, &partial))
                .await;
        if let Err(e) = fetched {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        if let Err(reason) = DownloadGuard::validate_downloaded_file(&partial) {
            let _ = tokio::fs::remove_file(&partial).await;
            bail!("{} rejected: {}", visual.id, reason);
        }
        tokio::fs::rename(&partial, &path)
            .await
            .with_context(|| format!("Cannot move download into {:?}", path))?;

        info!("[VISUALS] Downloaded: {:?}", path.file_name().unwrap_or_default());
        done.local_path = Some(path);
        Ok(done)
    }

    pub async fn download_all(&self, visuals: &[Visual]) -> Vec<Visual> {
        info!("[VISUALS] ⬇️ Downloading {} visuals...", visuals.len());
        let mut downloaded = Vec::new();
        for visual in visuals {
            match self.download(visual).await {
                Ok(v) => downloaded.push(v),
                Err(e) => warn!("[VISUALS] Failed to download {}: {:#}", visual.id, e),
            }
        }
        info!("[VISUALS] ✓ Downloaded {}/{} visuals", downloaded.len(), visuals.len());
        downloaded
    }
}
