// VIDFORGE Discovery Integration Tests
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE

use chrono::Utc;
use std::time::Duration;
use vidforge_core::agent::retry::RetryPolicy;
use vidforge_core::agent::topic_discovery::TopicDiscovery;
use vidforge_core::config::{ApiEndpoints, Settings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed(now_rfc2822: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>News</title><link>https://news.example</link><description>d</description>
<item>
  <title>Robots replace warehouse workers as AI layoffs grow - Reuters</title>
  <link>https://news.example/robots</link>
  <pubDate>{now}</pubDate>
  <description>&lt;p&gt;Warehouses are changing.&lt;/p&gt;</description>
</item>
<item>
  <title>Local bakery opens new store</title>
  <link>https://news.example/bakery</link>
  <pubDate>Mon, 06 Jan 2020 10:00:00 GMT</pubDate>
</item>
</channel></rss>"#,
        now = now_rfc2822
    )
}

#[tokio::test]
async fn test_discover_ranks_feed_and_reddit_topics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed(&Utc::now().to_rfc2822())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/Futurology/new.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"children": [{"data": {
                "id": "t3_abc",
                "title": "Humanoid robots workers are replacing factory jobs in 2026",
                "permalink": "/r/Futurology/comments/abc/",
                "selftext": "",
                "score": 5000.0,
                "created_utc": Utc::now().timestamp() as f64
            }}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/technology/new.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::with_base_dir(dir.path());
    settings.endpoints = ApiEndpoints::with_base(&server.uri());
    settings.content.rss_feeds = vec![format!("{}/rss", server.uri())];
    settings.content.reddit_subs = vec!["Futurology".to_string(), "technology".to_string()];

    let discovery = TopicDiscovery::new(&settings).with_retry_policy(RetryPolicy::new(1, Duration::from_millis(1)));
    let topics = discovery.discover(10).await;

    assert_eq!(topics.len(), 3);
    assert_eq!(topics[0].source, "reddit_r/Futurology");
    assert_eq!(topics[0].url, "https://reddit.com/r/Futurology/comments/abc/");
    assert_eq!(topics[1].title, "Robots replace warehouse workers as AI layoffs grow");
    assert_eq!(topics[1].summary, "Warehouses are changing.");
    assert_eq!(topics[2].title, "Local bakery opens new store");
    assert_eq!(topics[2].score, 0.0);
    assert!(topics[0].score > topics[1].score);
}

#[tokio::test]
async fn test_best_topic_none_when_sources_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::with_base_dir(dir.path());
    settings.endpoints = ApiEndpoints::with_base(&server.uri());
    settings.content.rss_feeds = vec![format!("{}/rss", server.uri())];
    settings.content.reddit_subs = vec!["Futurology".to_string()];

    let discovery = TopicDiscovery::new(&settings).with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)));
    assert!(discovery.best_topic().await.is_none());
}

#[tokio::test]
async fn test_reddit_posts_past_a_week_are_dropped() {
    let now = Utc::now().timestamp();
    let post = |id: &str, title: &str, age_secs: i64| {
        serde_json::json!({"data": {
            "id": id,
            "title": title,
            "permalink": format!("/r/Futurology/comments/{}/", id),
            "selftext": "",
            "score": 10.0,
            "created_utc": (now - age_secs) as f64
        }})
    };

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/Futurology/new.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"children": [
                post("fresh", "Six and a half days old", 6 * 86_400 + 43_200),
                post("stale", "Seven and a half days old", 7 * 86_400 + 43_200),
            ]}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::with_base_dir(dir.path());
    settings.endpoints = ApiEndpoints::with_base(&server.uri());
    settings.content.rss_feeds = Vec::new();
    settings.content.reddit_subs = vec!["Futurology".to_string()];

    let discovery = TopicDiscovery::new(&settings).with_retry_policy(RetryPolicy::new(1, Duration::from_millis(1)));
    let topics = discovery.discover(10).await;

    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].title, "Six and a half days old");
}
