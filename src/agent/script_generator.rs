// VIDFORGE Script Generator
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Turns a discovered topic into a sectioned long-form narration script.

use crate::agent::gemini_bridge::{GeminiClient, DEFAULT_MODEL};
use crate::agent::retry::{self, RetryPolicy};
use crate::agent::text_tools::{estimate_duration, truncate_chars, word_count};
use crate::agent::topic_discovery::Topic;
use crate::config::Settings;
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub const WORDS_PER_MINUTE: usize = 150;
const MAX_SHORTS: usize = 5;
const MIN_SHORT_CHARS: usize = 50;

static SHORTS_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\d+\.|\n[-•]").expect("static regex"));

const SCRIPT_PROMPT: &str = r#"You write scripts for a YouTube channel covering AI, robotics and the future of work.
Write a complete, well-researched narration for a 15-20 minute video.

TOPIC: {topic}

CONTEXT:
{context}

Use exactly these sections, each introduced by its markdown header:

## HOOK (0:00-0:30) - ~75 words
Open with a striking statistic or a provocative question. Make the stakes for workers clear immediately.

## OVERVIEW (0:30-2:00) - ~200 words
Say what the video covers and why it is worth watching to the end. Hint at the biggest reveal.

## DEEP BREAKDOWN (2:00-12:00) - ~1500 words
Cover 5-7 key points. For each one give concrete facts, dates and company names, explain cause and effect,
and analyse what it means for employment. Mark b-roll ideas inline as [VISUAL: description].
Introduce each point as **Point N: Title**.

## IMPLICATIONS & BALANCE (12:00-15:00) - ~400 words
Weigh the genuine risks of displacement against the opportunities. Attribute expert predictions.
End with practical steps viewers can take.

## CONCLUSION & CTA (15:00+) - ~150 words
Recap the three key takeaways, make one bold but defensible prediction, ask a question for the comments,
invite viewers to subscribe and tease the next video.

## SHORTS EXCERPTS
List 3-5 self-contained 30-second excerpts, numbered, each with its own hook and payoff.

Style: conversational and confident, speak to the viewer as "you", mark natural pauses with "..." or [PAUSE],
stay factual, and add substantial original commentary on any reported material.

Write the full script now:"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    pub topic: String,
    pub full_text: String,
    pub hook: String,
    pub overview: String,
    pub breakdown: String,
    pub implications: String,
    pub conclusion: String,
    pub word_count: usize,
    /// Seconds at 150 wpm.
    pub estimated_duration: u32,
    pub shorts_excerpts: Vec<String>,
}

impl Script {
    pub fn new(topic: &str, full_text: &str) -> Self {
        let words = word_count(full_text);
        Self {
            topic: topic.to_string(),
            full_text: full_text.to_string(),
            word_count: words,
            estimated_duration: estimate_duration(words, WORDS_PER_MINUTE),
            ..Default::default()
        }
    }

    /// Named sections in narration order, for per-section voiceover.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("hook", self.hook.as_str()),
            ("overview", self.overview.as_str()),
            ("breakdown", self.breakdown.as_str()),
            ("implications", self.implications.as_str()),
            ("conclusion", self.conclusion.as_str()),
        ]
    }
}

/// Body of the first `## <name>` section, up to the next `##` or the end.
pub fn section_body(text: &str, name: &str) -> Option<String> {
    let header = Regex::new(&format!(r"(?i)##\s*{}[^\n]*\n", regex::escape(name))).ok()?;
    let found = header.find(text)?;
    let rest = &text[found.end()..];
    let body = match rest.find("##") {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(body.trim().to_string())
}

/// Fill the five narrative sections; missing headers leave them empty.
pub fn parse_sections(script: &mut Script) {
    let text = script.full_text.clone();
    let read = |name: &str| section_body(&text, name).unwrap_or_default();
    script.hook = read("HOOK");
    script.overview = read("OVERVIEW");
    script.breakdown = read("DEEP BREAKDOWN");
    script.implications = read("IMPLICATIONS");
    script.conclusion = read("CONCLUSION");
}

pub fn extract_shorts(text: &str) -> Vec<String> {
    let Some(body) = section_body(text, "SHORTS") else {
        return Vec::new();
    };
    // Leading newline so the first numbered item splits like the rest.
    let body = format!("\n{}", body);
    SHORTS_SPLIT
        .split(&body)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SHORT_CHARS)
        .take(MAX_SHORTS)
        .map(String::from)
        .collect()
}

pub fn build_prompt(topic: &Topic, extra_context: &str) -> String {
    let context = format!(
        "Title: {}\nSource: {}\nSummary: {}\nKeywords: {}\n{}",
        topic.title,
        topic.source,
        topic.summary,
        topic.keywords_matched.join(", "),
        extra_context
    );
    SCRIPT_PROMPT
        .replace("{topic}", &topic.title)
        .replace("{context}", context.trim())
}

pub struct ScriptGenerator {
    gemini: GeminiClient,
    policy: RetryPolicy,
}

impl ScriptGenerator {
    pub fn new(settings: &Settings) -> Result<Self> {
        let key = settings
            .keys
            .gemini
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY required. Get one at https://aistudio.google.com/api-keys"))?;
        Ok(Self {
            gemini: GeminiClient::new(key, &settings.endpoints.gemini, DEFAULT_MODEL),
            policy: RetryPolicy::new(3, Duration::from_secs(5)),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn generate(&self, topic: &Topic, extra_context: &str) -> Result<Script> {
        info!("[SCRIPT] 📝 Generating script for: {}...", truncate_chars(&topic.title, 50));

        let prompt = build_prompt(topic, extra_context);
        let full_text =
            retry::with_backoff(self.policy, "generate_script", || self.gemini.generate(&prompt, 0.7, 4000)).await?;

        let mut script = Script::new(&topic.title, &full_text);
        parse_sections(&mut script);
        script.shorts_excerpts = extract_shorts(&full_text);

        info!(
            "[SCRIPT] ✓ Script generated: {} words, ~{} min",
            script.word_count,
            script.estimated_duration / 60
        );
        Ok(script)
    }

    /// Alternative openings to A/B test against the generated hook.
    pub async fn generate_hook_variations(&self, topic: &str, count: usize) -> Result<Vec<String>> {
        let prompt = format!(
            "Write {count} different opening hooks (the first 30 seconds) for a YouTube video on this topic:\n\n\
             Topic: {topic}\n\n\
             Each hook should stop a scrolling viewer, take a different emotional angle \
             (fear, curiosity, urgency, shock), run 50-75 words and cite a specific figure where possible.\n\n\
             Answer as a numbered list 1-{count}:"
        );
        let text = self.gemini.generate(&prompt, 0.9, 1500).await?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .take(count)
            .map(String::from)
            .collect())
    }
}
