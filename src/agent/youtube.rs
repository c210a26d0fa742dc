// VIDFORGE YouTube Integration
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Upload through the Data API's resumable protocol and read channel
// statistics back. Authentication uses a stored OAuth refresh token; there
// is no interactive consent flow.

use crate::agent::retry::{self, RetryPolicy};
use crate::config::{ApiEndpoints, Settings, YouTubeCredentials};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Multiple of 256 KiB, as the resumable protocol requires.
const UPLOAD_CHUNK_BYTES: usize = 8 * 1024 * 1024;
const API_POLICY: RetryPolicy = RetryPolicy::new(2, Duration::from_secs(2));

#[derive(Debug, Clone, PartialEq)]
pub struct YouTubeVideo {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// 28 = Science & Technology.
    pub category_id: String,
    pub privacy_status: String,
    pub local_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    pub upload_time: Option<String>,
}

impl Default for YouTubeVideo {
    fn default() -> Self {
        Self {
            video_id: String::new(),
            title: String::new(),
            description: String::new(),
            tags: Vec::new(),
            category_id: "28".to_string(),
            privacy_status: "private".to_string(),
            local_path: PathBuf::new(),
            thumbnail_path: None,
            upload_time: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadRecord {
    pub video_id: String,
    pub title: String,
    pub upload_time: String,
    pub privacy: String,
    pub local_path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoAnalytics {
    pub video_id: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub fetched_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChannelVideo {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PerformancePatterns {
    pub best_performing_titles: Vec<String>,
    pub optimal_length: Option<u32>,
    pub best_upload_time: Option<String>,
    pub top_tags: Vec<String>,
    pub avg_views: u64,
    pub avg_retention: f64,
}

// --- API payloads ---

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UploadedVideo {
    id: String,
}

/// Statistics counters arrive as decimal strings.
fn count<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<u64, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or(0))
}

#[derive(Deserialize, Default)]
struct Statistics {
    #[serde(rename = "viewCount", default, deserialize_with = "count")]
    views: u64,
    #[serde(rename = "likeCount", default, deserialize_with = "count")]
    likes: u64,
    #[serde(rename = "commentCount", default, deserialize_with = "count")]
    comments: u64,
}

#[derive(Deserialize)]
struct VideoItem {
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct ChannelItem {
    #[serde(rename = "contentDetails")]
    content_details: ChannelDetails,
}

#[derive(Deserialize)]
struct ChannelDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: RelatedPlaylists,
}

#[derive(Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Deserialize)]
struct PlaylistSnippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
    #[serde(rename = "resourceId")]
    resource_id: ResourceId,
}

#[derive(Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: String,
}

fn load_history(path: &Path) -> Vec<UploadRecord> {
    match std::fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!("[YOUTUBE] Ignoring unreadable upload history: {}", e);
            Vec::new()
        }),
        Err(_) => Vec::new(),
    }
}

pub struct YouTubeClient {
    http: reqwest::Client,
    credentials: YouTubeCredentials,
    endpoints: ApiEndpoints,
    logs_dir: PathBuf,
    access_token: Option<String>,
    history: Vec<UploadRecord>,
}

impl YouTubeClient {
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let history = load_history(&settings.logs_dir.join("youtube_history.json"));
        Self {
            http,
            credentials: settings.youtube.clone(),
            endpoints: settings.endpoints.clone(),
            logs_dir: settings.logs_dir.clone(),
            access_token: None,
            history,
        }
    }

    pub fn history(&self) -> &[UploadRecord] {
        &self.history
    }

    /// Exchange the refresh token for an access token.
    pub async fn authenticate(&mut self) -> Result<()> {
        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            self.credentials.client_id.as_deref(),
            self.credentials.client_secret.as_deref(),
            self.credentials.refresh_token.as_deref(),
        ) else {
            bail!("YouTube credentials missing: set YOUTUBE_CLIENT_ID, YOUTUBE_CLIENT_SECRET and YOUTUBE_REFRESH_TOKEN");
        };

        let resp = self
            .http
            .post(&self.endpoints.oauth_token)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("OAuth token request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("OAuth token endpoint returned {}: {}", status, body);
        }

        let token: TokenResponse = resp.json().await.context("Invalid OAuth token response")?;
        self.access_token = Some(token.access_token);
        info!("[YOUTUBE] ✓ YouTube API authenticated");
        Ok(())
    }

    async fn token(&mut self) -> Result<String> {
        if self.access_token.is_none() {
            self.authenticate().await?;
        }
        self.access_token.clone().ok_or_else(|| anyhow!("No access token"))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, token: &str, query: &[(&str, String)]) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        if !resp.status().is_success() {
            bail!("YouTube API returned {} for {}", resp.status(), url);
        }
        resp.json().await.context("Invalid YouTube API response")
    }

    /// Upload the file at `video.local_path`; returns the new video id.
    pub async fn upload(&mut self, video: &mut YouTubeVideo) -> Result<String> {
        let token = self.token().await?;
        let size = std::fs::metadata(&video.local_path)
            .with_context(|| format!("Cannot read {:?}", video.local_path))?
            .len();
        if size == 0 {
            bail!("{:?} is empty", video.local_path);
        }

        info!("[YOUTUBE] 📤 Uploading to YouTube: {}...", video.title.chars().take(50).collect::<String>());
        let body = json!({
            "snippet": {
                "title": video.title,
                "description": video.description,
                "tags": video.tags,
                "categoryId": video.category_id,
            },
            "status": {
                "privacyStatus": video.privacy_status,
                "selfDeclaredMadeForKids": false,
            }
        });

        let resp = self
            .http
            .post(format!("{}/videos", self.endpoints.youtube_upload))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&token)
            .header("X-Upload-Content-Type", "video/*")
            .header("X-Upload-Content-Length", size.to_string())
            .json(&body)
            .send()
            .await
            .context("Upload session request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Upload session rejected ({}): {}", status, text);
        }
        let session = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| anyhow!("Upload session response had no Location header"))?;

        let uploaded = self.send_chunks(&session, &token, &video.local_path, size).await?;
        video.video_id = uploaded.id.clone();
        video.upload_time = Some(Local::now().to_rfc3339());

        if let Some(thumbnail) = video.thumbnail_path.as_deref().filter(|p| p.exists()) {
            if let Err(e) = self.set_thumbnail(&uploaded.id, thumbnail, &token).await {
                warn!("[YOUTUBE]    ⚠️ Thumbnail failed: {:#}", e);
            }
        }

        self.history.push(UploadRecord {
            video_id: uploaded.id.clone(),
            title: video.title.clone(),
            upload_time: video.upload_time.clone().unwrap_or_default(),
            privacy: video.privacy_status.clone(),
            local_path: video.local_path.to_string_lossy().into_owned(),
        });
        self.save_history()?;

        info!("[YOUTUBE] ✅ Uploaded: https://youtube.com/watch?v={}", uploaded.id);
        Ok(uploaded.id)
    }

    async fn send_chunks(&self, session: &str, token: &str, path: &Path, size: u64) -> Result<UploadedVideo> {
        let mut file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Cannot open {:?}", path))?;
        let mut offset: u64 = 0;
        let mut buf = vec![0u8; UPLOAD_CHUNK_BYTES];

        loop {
            let mut filled = 0;
            while filled < buf.len() {
                let n = file.read(&mut buf[filled..]).await?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled == 0 {
                bail!("Upload ended at byte {} without a final response", offset);
            }

            let end = offset + filled as u64 - 1;
            let resp = self
                .http
                .put(session)
                .bearer_auth(token)
                .header(reqwest::header::CONTENT_RANGE, format!("bytes {}-{}/{}", offset, end, size))
                .body(buf[..filled].to_vec())
                .send()
                .await
                .context("Upload chunk failed")?;

            match resp.status().as_u16() {
                200 | 201 => return resp.json().await.context("Invalid upload response"),
                308 => {
                    offset = end + 1;
                    info!("[YOUTUBE]    Upload progress: {}%", offset * 100 / size);
                }
                other => {
                    let text = resp.text().await.unwrap_or_default();
                    bail!("Upload chunk rejected ({}): {}", other, text);
                }
            }
        }
    }

    async fn set_thumbnail(&self, video_id: &str, path: &Path, token: &str) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            _ => "image/jpeg",
        };
        let resp = self
            .http
            .post(format!("{}/thumbnails/set", self.endpoints.youtube_upload))
            .query(&[("videoId", video_id)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("thumbnails.set returned {}", resp.status());
        }
        info!("[YOUTUBE]    ✓ Thumbnail set");
        Ok(())
    }

    fn save_history(&self) -> Result<()> {
        std::fs::create_dir_all(&self.logs_dir)?;
        let path = self.logs_dir.join("youtube_history.json");
        std::fs::write(&path, serde_json::to_string_pretty(&self.history)?)
            .with_context(|| format!("Cannot write {:?}", path))
    }

    /// View, like and comment counts; `None` when the id is unknown.
    pub async fn video_analytics(&mut self, video_id: &str) -> Result<Option<VideoAnalytics>> {
        let token = self.token().await?;
        let url = format!("{}/videos", self.endpoints.youtube_api);
        let query = [
            ("part", "statistics,contentDetails".to_string()),
            ("id", video_id.to_string()),
        ];
        let list: ListResponse<VideoItem> =
            retry::with_backoff(API_POLICY, "video_analytics", || self.get_json(&url, &token, &query)).await?;

        Ok(list.items.into_iter().next().map(|item| VideoAnalytics {
            video_id: video_id.to_string(),
            views: item.statistics.views,
            likes: item.statistics.likes,
            comments: item.statistics.comments,
            fetched_at: Local::now().to_rfc3339(),
        }))
    }

    /// Most recent entries of the channel's uploads playlist.
    pub async fn channel_videos(&mut self, max_results: u32) -> Result<Vec<ChannelVideo>> {
        let token = self.token().await?;
        let channels_url = format!("{}/channels", self.endpoints.youtube_api);
        let channel_query = [("part", "contentDetails".to_string()), ("mine", "true".to_string())];
        let channels: ListResponse<ChannelItem> = retry::with_backoff(API_POLICY, "channels.list", || {
            self.get_json(&channels_url, &token, &channel_query)
        })
        .await?;

        let Some(channel) = channels.items.into_iter().next() else {
            return Ok(Vec::new());
        };

        let items_url = format!("{}/playlistItems", self.endpoints.youtube_api);
        let items_query = [
            ("part", "snippet".to_string()),
            ("playlistId", channel.content_details.related_playlists.uploads),
            ("maxResults", max_results.to_string()),
        ];
        let items: ListResponse<PlaylistItem> = retry::with_backoff(API_POLICY, "playlistItems.list", || {
            self.get_json(&items_url, &token, &items_query)
        })
        .await?;

        Ok(items
            .items
            .into_iter()
            .map(|item| ChannelVideo {
                video_id: item.snippet.resource_id.video_id,
                title: item.snippet.title,
                published_at: item.snippet.published_at,
            })
            .collect())
    }

    /// Average views and top five titles over the latest 20 uploads, saved
    /// to `youtube_patterns.json`.
    pub async fn analyze_performance_patterns(&mut self) -> Result<PerformancePatterns> {
        info!("[YOUTUBE] 📊 Analyzing channel performance patterns...");
        let mut patterns = PerformancePatterns::default();

        let videos = self.channel_videos(50).await.unwrap_or_else(|e| {
            error!("[YOUTUBE] Could not list channel videos: {:#}", e);
            Vec::new()
        });
        if videos.is_empty() {
            return Ok(patterns);
        }

        let mut scored = Vec::new();
        for video in videos.iter().take(20) {
            match self.video_analytics(&video.video_id).await {
                Ok(Some(stats)) => scored.push((video.title.clone(), stats.views)),
                Ok(None) => {}
                Err(e) => warn!("[YOUTUBE] Analytics failed for {}: {:#}", video.video_id, e),
            }
        }

        if !scored.is_empty() {
            patterns.avg_views = scored.iter().map(|(_, v)| v).sum::<u64>() / scored.len() as u64;
            scored.sort_by(|a, b| b.1.cmp(&a.1));
            patterns.best_performing_titles = scored.into_iter().take(5).map(|(t, _)| t).collect();
            info!("[YOUTUBE] Channel avg views: {}", patterns.avg_views);
        }

        std::fs::create_dir_all(&self.logs_dir)?;
        let path = self.logs_dir.join("youtube_patterns.json");
        std::fs::write(&path, serde_json::to_string_pretty(&patterns)?)
            .with_context(|| format!("Cannot write {:?}", path))?;
        info!("[YOUTUBE] 📊 Channel patterns saved to {:?}", path.file_name().unwrap_or_default());
        Ok(patterns)
    }
}

/// Connects pipeline output (`output/<project>*`) to the upload client.
pub struct UploadManager {
    pub client: YouTubeClient,
    output_dir: PathBuf,
}

impl UploadManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: YouTubeClient::new(settings),
            output_dir: settings.output_dir.clone(),
        }
    }

    pub fn prepare_upload(
        &self,
        video_path: &Path,
        metadata_path: &Path,
        thumbnail_path: Option<&Path>,
        privacy: &str,
    ) -> Result<YouTubeVideo> {
        let data = std::fs::read_to_string(metadata_path).with_context(|| format!("Cannot read {:?}", metadata_path))?;
        let metadata: Value = serde_json::from_str(&data).with_context(|| format!("Invalid JSON in {:?}", metadata_path))?;

        let title = metadata["best_title"]
            .as_str()
            .or_else(|| metadata["title_options"][0].as_str())
            .unwrap_or("Untitled");
        let tags = metadata["tags"]
            .as_array()
            .map(|tags| tags.iter().filter_map(|t| t.as_str().map(String::from)).collect())
            .unwrap_or_default();

        Ok(YouTubeVideo {
            title: title.to_string(),
            description: metadata["description"].as_str().unwrap_or_default().to_string(),
            tags,
            privacy_status: privacy.to_string(),
            local_path: video_path.to_path_buf(),
            thumbnail_path: thumbnail_path.map(Path::to_path_buf),
            ..Default::default()
        })
    }

    fn find_output(&self, project_id: &str, suffix: &str) -> Option<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(&self.output_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                name.starts_with(project_id) && name.ends_with(suffix)
            })
            .map(|e| e.into_path())
            .collect();
        found.sort();
        found.into_iter().next()
    }

    /// Upload `<project>*.mp4` with `<project>*_metadata.json`.
    pub async fn upload_from_output(&mut self, project_id: &str, make_public: bool) -> Result<String> {
        let video_path = self
            .find_output(project_id, ".mp4")
            .with_context(|| format!("No video found for project: {}", project_id))?;
        let metadata_path = self
            .find_output(project_id, "_metadata.json")
            .with_context(|| format!("No metadata found for project: {}", project_id))?;

        let privacy = if make_public { "public" } else { "private" };
        info!("[YOUTUBE] Uploading {} as {}", project_id, privacy);
        let mut video = self.prepare_upload(&video_path, &metadata_path, None, privacy)?;
        self.client.upload(&mut video).await
    }

    pub async fn learn_from_channel(&mut self) -> Result<PerformancePatterns> {
        self.client.analyze_performance_patterns().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(dir: &Path, server: &MockServer) -> Settings {
        let mut settings = Settings::with_base_dir(dir);
        settings.endpoints = ApiEndpoints::with_base(&server.uri());
        settings.youtube = YouTubeCredentials {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
        };
        settings
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok", "expires_in": 3599})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = YouTubeClient::new(&Settings::with_base_dir(dir.path()));
        let err = client.authenticate().await.unwrap_err();
        assert!(err.to_string().contains("credentials missing"));
    }

    #[tokio::test]
    async fn test_resumable_upload_records_history() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(query_param("uploadType", "resumable"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Location", format!("{}/session/1", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session/1"))
            .and(header("content-range", "bytes 0-9/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vid123"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &server);
        let file = dir.path().join("v.mp4");
        std::fs::write(&file, b"0123456789").unwrap();

        let mut client = YouTubeClient::new(&settings);
        let mut video = YouTubeVideo {
            title: "Robots".to_string(),
            local_path: file,
            ..Default::default()
        };
        assert_eq!(client.upload(&mut video).await.unwrap(), "vid123");
        assert_eq!(video.video_id, "vid123");

        let reloaded = YouTubeClient::new(&settings);
        assert_eq!(reloaded.history().len(), 1);
        assert_eq!(reloaded.history()[0].privacy, "private");
    }

    #[tokio::test]
    async fn test_performance_patterns() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UU1"}}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/playlistItems"))
            .and(query_param("playlistId", "UU1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
                {"snippet": {"title": "Low", "publishedAt": "2026-01-01T00:00:00Z", "resourceId": {"videoId": "a"}}},
                {"snippet": {"title": "High", "publishedAt": "2026-01-02T00:00:00Z", "resourceId": {"videoId": "b"}}}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("id", "a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"statistics": {"viewCount": "100", "likeCount": "5"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("id", "b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"statistics": {"viewCount": "300"}}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &server);
        let mut client = YouTubeClient::new(&settings);
        let patterns = client.analyze_performance_patterns().await.unwrap();
        assert_eq!(patterns.avg_views, 200);
        assert_eq!(patterns.best_performing_titles, vec!["High", "Low"]);
        assert!(settings.logs_dir.join("youtube_patterns.json").exists());
    }

    #[test]
    fn test_prepare_upload_prefers_best_title() {
        let dir = tempfile::tempdir().unwrap();
        let manager = UploadManager::new(&Settings::with_base_dir(dir.path()));
        let meta = dir.path().join("p_metadata.json");
        std::fs::write(
            &meta,
            r#"{"title_options": ["First"], "best_title": "Best", "description": "d", "tags": ["ai", "jobs"]}"#,
        )
        .unwrap();
        let video = manager
            .prepare_upload(Path::new("p.mp4"), &meta, None, "unlisted")
            .unwrap();
        assert_eq!(video.title, "Best");
        assert_eq!(video.tags, vec!["ai", "jobs"]);
        assert_eq!(video.privacy_status, "unlisted");
        assert_eq!(video.category_id, "28");

        std::fs::write(&meta, r#"{"title_options": ["First"]}"#).unwrap();
        let video = manager.prepare_upload(Path::new("p.mp4"), &meta, None, "private").unwrap();
        assert_eq!(video.title, "First");
    }

    #[tokio::test]
    async fn test_upload_from_output_requires_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        std::fs::create_dir_all(&settings.output_dir).unwrap();
        std::fs::write(settings.output_dir.join("abc_20260101_000000.mp4"), b"x").unwrap();
        let mut manager = UploadManager::new(&settings);
        let err = manager.upload_from_output("abc", false).await.unwrap_err();
        assert!(err.to_string().contains("No metadata found"));
        let err = manager.upload_from_output("zzz", false).await.unwrap_err();
        assert!(err.to_string().contains("No video found"));
    }
}
