// VIDFORGE Topic Discovery
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Pulls candidate stories from Google News RSS and Reddit's public JSON
// listings, scores them with fixed keyword weights and keeps the best.

use crate::agent::retry::{self, RetryPolicy};
use crate::agent::text_tools::{generate_id, truncate_chars};
use crate::config::{ApiEndpoints, ContentConfig, Settings};
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const ITEMS_PER_FEED: usize = 20;
const POSTS_PER_SUB: usize = 15;
const MAX_POST_AGE_DAYS: i64 = 7;
const SUMMARY_CHARS: usize = 500;

const HIGH_VALUE_TERMS: &[&str] = &["mass layoff", "job loss", "unemploy", "replace", "automat", "robot"];
const VIRAL_TERMS: &[&str] = &["breaking", "just", "shock", "warn", "crisis", "fear", "million"];

/// Trailing " - Publisher Name" appended by news aggregators.
static SOURCE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[-–—]\s*[A-Za-z\s]+$").expect("static regex"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub published: String,
    pub score: f64,
    pub keywords_matched: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl Topic {
    /// A topic supplied on the command line; always ranks at 100.
    pub fn manual(title: &str) -> Self {
        Self {
            id: format!("manual_{}", generate_id(title)),
            title: title.to_string(),
            source: "manual".to_string(),
            url: String::new(),
            published: Utc::now().to_rfc3339(),
            score: 100.0,
            keywords_matched: title.to_lowercase().split_whitespace().take(5).map(String::from).collect(),
            summary: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RedditListing {
    #[serde(default)]
    data: RedditListingData,
}

#[derive(Debug, Default, Deserialize)]
struct RedditListingData {
    #[serde(default)]
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    created_utc: f64,
}

/// Drop the publisher suffix news feeds add to headlines.
pub fn clean_title(title: &str) -> String {
    SOURCE_SUFFIX.replace(title, "").trim().to_string()
}

/// Feed summaries arrive as HTML snippets.
pub fn html_to_text(fragment: &str) -> String {
    let doc = scraper::Html::parse_fragment(fragment);
    doc.root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// RFC 3339 (Reddit, manual) or RFC 2822 (RSS `pubDate`).
pub fn parse_published(published: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(published)
        .or_else(|_| DateTime::parse_from_rfc2822(published))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Parse one RSS document into unscored topics.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<Topic>> {
    let channel = rss::Channel::read_from(bytes).context("Invalid RSS document")?;
    let topics = channel
        .items()
        .iter()
        .take(ITEMS_PER_FEED)
        .map(|item| {
            let title = item.title().unwrap_or_default();
            let link = item.link().unwrap_or_default();
            let id_seed = if link.is_empty() { title } else { link };
            Topic {
                id: generate_id(id_seed),
                title: clean_title(title),
                source: "google_news".to_string(),
                url: link.to_string(),
                published: item.pub_date().unwrap_or_default().to_string(),
                score: 0.0,
                keywords_matched: Vec::new(),
                summary: truncate_chars(&html_to_text(item.description().unwrap_or_default()), SUMMARY_CHARS),
            }
        })
        .collect();
    Ok(topics)
}

/// Relevance score for the channel's niche. Overwrites `score` and
/// `keywords_matched`; the previous score only feeds the Reddit bonus.
pub fn score_topic(topic: &mut Topic, keywords: &[String], now: DateTime<Utc>) -> f64 {
    let text = format!("{} {}", topic.title.to_lowercase(), topic.summary.to_lowercase());
    let mut score = 0.0;

    let mut matched = Vec::new();
    for keyword in keywords {
        if text.contains(&keyword.to_lowercase()) {
            score += 20.0;
            matched.push(keyword.clone());
        }
    }

    score += 15.0 * HIGH_VALUE_TERMS.iter().filter(|t| text.contains(*t)).count() as f64;
    score += 5.0 * VIRAL_TERMS.iter().filter(|t| text.contains(*t)).count() as f64;

    if text.contains("2026") || text.contains("2025") {
        score += 10.0;
    }

    // Engagement: upvotes are the only signal Reddit gives us.
    if topic.source.starts_with("reddit") {
        score += (topic.score / 100.0).min(20.0);
    }

    if let Some(published) = parse_published(&topic.published) {
        let days_old = (now - published).num_days();
        score += match days_old {
            d if d <= 1 => 30.0,
            d if d <= 3 => 15.0,
            d if d <= 7 => 5.0,
            _ => 0.0,
        };
    }

    topic.score = score;
    topic.keywords_matched = matched;
    score
}

/// Sort by score (stable), drop near-duplicate headlines, keep `limit`.
pub fn rank_topics(mut topics: Vec<Topic>, limit: usize) -> Vec<Topic> {
    topics.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut seen = HashSet::new();
    topics
        .into_iter()
        .filter(|t| seen.insert(truncate_chars(&t.title, 50).to_lowercase()))
        .take(limit)
        .collect()
}

pub struct TopicDiscovery {
    client: reqwest::Client,
    content: ContentConfig,
    endpoints: ApiEndpoints,
    policy: RetryPolicy,
}

impl TopicDiscovery {
    pub fn new(settings: &Settings) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            content: settings.content.clone(),
            endpoints: settings.endpoints.clone(),
            policy: RetryPolicy::new(3, Duration::from_secs(2)),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn fetch_google_news(&self) -> Result<Vec<Topic>> {
        let mut topics = Vec::new();
        for feed_url in &self.content.rss_feeds {
            info!("[DISCOVERY] Fetching Google News: {}...", truncate_chars(feed_url, 50));
            let resp = self
                .client
                .get(feed_url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("Feed request failed: {}", feed_url))?;
            let body = resp.bytes().await.context("Feed body unreadable")?;
            topics.extend(parse_feed(&body)?);
        }
        info!("[DISCOVERY] Found {} topics from Google News", topics.len());
        Ok(topics)
    }

    pub async fn fetch_reddit(&self) -> Result<Vec<Topic>> {
        let mut topics = Vec::new();
        let now = Utc::now();

        for sub in &self.content.reddit_subs {
            info!("[DISCOVERY] Fetching Reddit r/{}...", sub);
            match self.fetch_subreddit(sub, now).await {
                Ok(mut found) => topics.append(&mut found),
                Err(e) => warn!("[DISCOVERY] Reddit fetch failed for r/{}: {:#}", sub, e),
            }
        }

        info!("[DISCOVERY] Found {} topics from Reddit", topics.len());
        Ok(topics)
    }

    async fn fetch_subreddit(&self, sub: &str, now: DateTime<Utc>) -> Result<Vec<Topic>> {
        let url = format!("{}/r/{}/new.json", self.endpoints.reddit.trim_end_matches('/'), sub);
        let listing: RedditListing = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Reddit listing did not parse")?;

        let topics = listing
            .data
            .children
            .into_iter()
            .take(POSTS_PER_SUB)
            .filter_map(|child| {
                let post = child.data;
                let created = Utc.timestamp_opt(post.created_utc as i64, 0).single()?;
                if now - created > chrono::Duration::days(MAX_POST_AGE_DAYS) {
                    return None;
                }
                Some(Topic {
                    id: generate_id(&post.id),
                    title: post.title,
                    source: format!("reddit_r/{}", sub),
                    url: format!("https://reddit.com{}", post.permalink),
                    published: created.to_rfc3339(),
                    score: post.score,
                    keywords_matched: Vec::new(),
                    summary: truncate_chars(&post.selftext, SUMMARY_CHARS),
                })
            })
            .collect();
        Ok(topics)
    }

    /// Fetch all sources, score and rank.
    pub async fn discover(&self, limit: usize) -> Vec<Topic> {
        info!("[DISCOVERY] 🔍 Starting topic discovery...");

        let mut all = retry::with_fallback(self.policy, "fetch_google_news", Vec::new(), || self.fetch_google_news()).await;
        all.extend(retry::with_fallback(self.policy, "fetch_reddit", Vec::new(), || self.fetch_reddit()).await);

        let now = Utc::now();
        for topic in all.iter_mut() {
            score_topic(topic, &self.content.keywords, now);
        }

        let top = rank_topics(all, limit);
        info!("[DISCOVERY] ✓ Discovered {} relevant topics", top.len());
        for (i, t) in top.iter().take(5).enumerate() {
            info!("[DISCOVERY]   {}. [{:.0}] {}", i + 1, t.score, truncate_chars(&t.title, 60));
        }
        top
    }

    pub async fn best_topic(&self) -> Option<Topic> {
        self.discover(1).await.into_iter().next()
    }
}
