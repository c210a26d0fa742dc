// VIDFORGE Metadata Generator
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Titles, description, tags, hashtags and thumbnail prompts for upload.
// Titles come from Gemini when a key is configured; everything else is
// templated so a run without network still produces usable metadata.

use crate::agent::gemini_bridge::{GeminiClient, DEFAULT_MODEL};
use crate::agent::script_generator::Script;
use crate::agent::text_tools::truncate_chars;
use crate::config::Settings;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

const MAX_TITLES: usize = 10;
const MAX_TAGS: usize = 30;

static NUMBER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s*").expect("static regex"));

const BASE_TAGS: &[&str] = &[
    "AI",
    "artificial intelligence",
    "robots",
    "robotics",
    "automation",
    "future of work",
    "job loss",
    "unemployment",
    "technology 2026",
    "AI news",
    "robot workers",
    "ChatGPT",
    "machine learning",
    "tech news",
    "job displacement",
    "AI revolution",
    "workforce automation",
    "career advice",
    "AI jobs",
    "technology trends",
];

const STOP_WORDS: &[&str] = &["the", "and", "for", "that", "this", "with", "from", "what", "will", "your", "about"];

const HASHTAGS: &[&str] = &[
    "#AI2026",
    "#Robotics",
    "#FutureOfWork",
    "#Automation",
    "#TechNews",
    "#ArtificialIntelligence",
    "#JobsOfTheFuture",
    "#MachineLearning",
    "#Innovation",
    "#TechTrends",
];

const THUMBNAIL_PROMPTS: &[&str] = &[
    "Dramatic thumbnail: humanoid robot in office replacing human worker, red warning colors, bold text space, photorealistic, 4K, cinematic lighting",
    "Shocked person looking at futuristic AI robot, split image, before/after style, dramatic lighting, YouTube thumbnail style",
    "Robot hand and human hand reaching toward each other, dramatic blue and orange lighting, movie poster style, 4K",
    "Futuristic cityscape with robots, worried crowd of workers, dramatic sky, news broadcast style, bold colors",
    "AI brain visualization with job icons being absorbed, dark dramatic background, glowing elements, tech aesthetic",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoMetadata {
    pub title_options: Vec<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub hashtags: Vec<String>,
    pub thumbnail_prompts: Vec<String>,
    pub timestamps: Vec<String>,
    pub category: String,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            title_options: Vec::new(),
            description: String::new(),
            tags: Vec::new(),
            hashtags: Vec::new(),
            thumbnail_prompts: Vec::new(),
            timestamps: Vec::new(),
            category: "Science & Technology".to_string(),
        }
    }
}

/// On-disk form: the struct plus the resolved best title.
#[derive(Serialize)]
struct SavedMetadata<'a> {
    #[serde(flatten)]
    metadata: &'a VideoMetadata,
    best_title: &'a str,
}

impl VideoMetadata {
    pub fn best_title(&self) -> &str {
        self.title_options.first().map(String::as_str).unwrap_or("Untitled Video")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let saved = SavedMetadata {
            metadata: self,
            best_title: self.best_title(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&saved)?).with_context(|| format!("Cannot write {:?}", path))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).with_context(|| format!("Cannot read {:?}", path))?;
        serde_json::from_str(&data).with_context(|| format!("Invalid metadata in {:?}", path))
    }
}

pub fn template_titles(topic: &str) -> Vec<String> {
    vec![
        format!("🤖 {} - What You Need to Know in 2026", topic),
        format!("WARNING: {} Is Changing Everything", topic),
        format!("The Truth About {} (Nobody's Talking About This)", topic),
        format!("How {} Will Affect Your Career in 2026", topic),
        format!("{} Explained: The Complete 2026 Breakdown", topic),
        format!("🚨 BREAKING: {} - Full Analysis", topic),
        format!("Why {} Should Worry Everyone", topic),
        format!("I Researched {} - Here's What I Found", topic),
        format!("{}: Opportunities vs Threats [Expert Analysis]", topic),
        format!("The Future of Work: {} in 2026", topic),
    ]
}

/// Numbered lines from a model answer, prefixes stripped.
pub fn parse_numbered_titles(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .map(|l| NUMBER_PREFIX.replace(l, "").trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_TITLES)
        .collect()
}

/// Chapter list; the last marker sits at the video's final minute.
pub fn chapter_timestamps(duration: u32) -> Vec<String> {
    let mut chapters: Vec<String> = [
        "0:00 - Introduction & Hook",
        "0:30 - Overview: What We'll Cover",
        "2:00 - The Current State of AI & Robotics",
        "4:00 - Key Development #1",
        "6:00 - Key Development #2",
        "8:00 - Key Development #3",
        "10:00 - Job Displacement Analysis",
        "12:00 - Implications: Fears vs Opportunities",
        "14:00 - Expert Predictions",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    chapters.push(format!("{}:00 - Conclusion & What You Can Do", duration / 60));
    chapters
}

pub fn build_description(script: &Script, duration: u32) -> String {
    let hook = truncate_chars(&script.hook, 200);
    let timestamps = chapter_timestamps(duration).join("\n");
    format!(
        "📺 {topic}\n\n\
         {hook}\n\n\
         In this breakdown we look at the latest developments in AI and robotics and what they really mean \
         for jobs and the economy in 2026 and beyond.\n\n\
         ⏱️ TIMESTAMPS:\n{timestamps}\n\n\
         🔔 SUBSCRIBE for more AI & technology analysis!\n\
         👍 LIKE if you found this useful\n\
         💬 COMMENT: will AI help or hurt workers?\n\n\
         #AI #Robotics #Technology #FutureOfWork #Automation #ArtificialIntelligence #Jobs2026\n\n\
         📚 SOURCES & RESEARCH:\n\
         This video draws on reporting from several news outlets and studies. All visuals are stock footage or \
         AI-generated.\n\n\
         ⚠️ DISCLAIMER:\n\
         For educational and informational purposes only. Do your own research before making career or \
         financial decisions.",
        topic = script.topic,
        hook = hook,
        timestamps = timestamps
    )
}

/// Base tags plus distinctive topic words, first occurrence wins.
pub fn build_tags(topic: &str) -> Vec<String> {
    let topic_words = topic.to_lowercase().replace(',', " ");
    let candidates = BASE_TAGS.iter().map(|s| s.to_string()).chain(
        topic_words
            .split_whitespace()
            .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
            .map(String::from)
            .collect::<Vec<_>>(),
    );

    let mut seen = HashSet::new();
    candidates
        .filter(|t| seen.insert(t.to_lowercase()))
        .take(MAX_TAGS)
        .collect()
}

pub struct MetadataGenerator {
    gemini: Option<GeminiClient>,
}

impl MetadataGenerator {
    pub fn new(settings: &Settings) -> Self {
        let gemini = settings
            .keys
            .gemini
            .as_deref()
            .map(|key| GeminiClient::new(key, &settings.endpoints.gemini, DEFAULT_MODEL));
        if gemini.is_none() {
            warn!("[META] No Gemini API key, using template titles");
        }
        Self { gemini }
    }

    async fn titles(&self, topic: &str) -> Vec<String> {
        if let Some(gemini) = &self.gemini {
            let prompt = format!(
                "Write 10 YouTube titles for a video on this topic:\n\nTopic: {topic}\n\n\
                 Mix emotional angles (fear, curiosity, urgency), include the year where it fits, \
                 keep each between 50 and 70 characters, and use strong opening words such as Breaking, \
                 Warning or Finally. Some may lean clickbait, some should be straightforward.\n\n\
                 Return only the titles, numbered 1-10:"
            );
            match gemini.generate(&prompt, 0.9, 1000).await {
                Ok(text) => {
                    let titles = parse_numbered_titles(&text);
                    if !titles.is_empty() {
                        return titles;
                    }
                    warn!("[META] AI title answer had no numbered lines");
                }
                Err(e) => warn!("[META] AI title generation failed: {:#}", e),
            }
        }
        template_titles(topic)
    }

    /// `duration` is the video length in seconds.
    pub async fn generate(&self, script: &Script, duration: u32) -> VideoMetadata {
        info!("[META] 📝 Generating video metadata...");
        let metadata = VideoMetadata {
            title_options: self.titles(&script.topic).await,
            description: build_description(script, duration),
            tags: build_tags(&script.topic),
            hashtags: HASHTAGS.iter().map(|s| s.to_string()).collect(),
            thumbnail_prompts: THUMBNAIL_PROMPTS.iter().map(|s| s.to_string()).collect(),
            timestamps: chapter_timestamps(duration),
            ..Default::default()
        };
        info!(
            "[META] ✓ Generated metadata: {} titles, {} tags, {} thumbnails",
            metadata.title_options.len(),
            metadata.tags.len(),
            metadata.thumbnail_prompts.len()
        );
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiEndpoints;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_numbered_titles() {
        let text = "Here you go:\n1. First Title\n2) Second Title\n\n3.   Third\nnot numbered";
        assert_eq!(parse_numbered_titles(text), vec!["First Title", "Second Title", "Third"]);
    }

    #[test]
    fn test_chapters_end_at_duration() {
        let chapters = chapter_timestamps(1085);
        assert_eq!(chapters.len(), 10);
        assert_eq!(chapters[9], "18:00 - Conclusion & What You Can Do");
    }

    #[test]
    fn test_tags_dedup_and_cap() {
        let tags = build_tags("Robots, Automation and the Warehouse Workforce Crisis");
        assert!(tags.contains(&"warehouse".to_string()));
        assert!(tags.contains(&"crisis".to_string()));
        // "robots" and "automation" already present as base tags
        assert_eq!(tags.iter().filter(|t| t.as_str() == "robots").count(), 1);
        assert!(!tags.contains(&"the".to_string()));
        assert!(tags.len() <= 30);
    }

    #[test]
    fn test_best_title_fallback_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut meta = VideoMetadata::default();
        assert_eq!(meta.best_title(), "Untitled Video");
        meta.title_options = vec!["Robots Are Hiring".to_string()];
        let path = dir.path().join("m.json");
        meta.save(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["best_title"], "Robots Are Hiring");
        assert_eq!(VideoMetadata::load(&path).unwrap(), meta);
    }

    #[test]
    fn test_description_embeds_hook() {
        let mut script = Script::new("Robots at Work", "text");
        script.hook = "h".repeat(300);
        let description = build_description(&script, 900);
        assert!(description.starts_with("📺 Robots at Work"));
        assert!(description.contains(&"h".repeat(200)));
        assert!(!description.contains(&"h".repeat(201)));
        assert!(description.contains("15:00 - Conclusion"));
    }

    #[tokio::test]
    async fn test_templates_without_key() {
        let dir = tempfile::tempdir().unwrap();
        let generator = MetadataGenerator::new(&Settings::with_base_dir(dir.path()));
        let meta = generator.generate(&Script::new("AI Layoffs", "text"), 900).await;
        assert_eq!(meta.title_options.len(), 10);
        assert_eq!(meta.best_title(), "🤖 AI Layoffs - What You Need to Know in 2026");
        assert_eq!(meta.hashtags.len(), 10);
        assert_eq!(meta.thumbnail_prompts.len(), 5);
    }

    #[tokio::test]
    async fn test_gemini_titles_used_when_available() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "1. Robots Took My Job\n2. The 2026 Layoff Wave"}]}}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::with_base_dir(dir.path());
        settings.endpoints = ApiEndpoints::with_base(&server.uri());
        settings.keys.gemini = Some("k".to_string());
        let meta = MetadataGenerator::new(&settings).generate(&Script::new("AI", "t"), 900).await;
        assert_eq!(meta.title_options, vec!["Robots Took My Job", "The 2026 Layoff Wave"]);
    }
}
