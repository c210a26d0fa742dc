// VIDFORGE Pipeline Integration Tests
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Full run in test mode against mocked Gemini, Pollinations and TTS
// endpoints. Needs ffmpeg to join narration chunks.

use std::io::Cursor;
use vidforge_core::agent::core::VideoPipeline;
use vidforge_core::agent::health;
use vidforge_core::agent::production_tools;
use vidforge_core::config::{ApiEndpoints, Settings};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRIPT: &str = "## HOOK\nRobots are taking over the office.\n\n## CONCLUSION\nStay curious and keep learning.";

fn noisy_png() -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    let img = image::RgbImage::from_fn(256, 256, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgb([r, g, b])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_pipeline_test_mode_writes_all_reports() {
    if !health::check_dependencies().is_empty() {
        eprintln!("skipping: ffmpeg not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let tone = dir.path().join("tone.mp3");
    production_tools::sine_tone(1.0, &tone).await.unwrap();
    let mp3 = std::fs::read(&tone).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(":generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": SCRIPT}]}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/prompt/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(noisy_png()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mp3))
        .mount(&server)
        .await;

    let mut settings = Settings::with_base_dir(dir.path().join("work"));
    settings.keys.gemini = Some("test-key".to_string());
    settings.endpoints = ApiEndpoints::with_base(&server.uri());
    let knowledge = settings.knowledge_dir();

    let mut pipeline = VideoPipeline::new(settings).unwrap();
    let outcome = pipeline.run(Some("AI Mass Layoffs"), false, true).await.unwrap();

    assert!(outcome.video_path.is_none());
    assert!(outcome.shorts.is_empty());
    assert_eq!(outcome.topic, "AI Mass Layoffs");
    assert!(outcome.project_id.starts_with("video_"));

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.metadata_path).unwrap()).unwrap();
    assert_eq!(metadata["best_title"], "🤖 AI Mass Layoffs - What You Need to Know in 2026");
    assert_eq!(outcome.title_options[0], "🤖 AI Mass Layoffs - What You Need to Know in 2026");

    let script_md = std::fs::read_to_string(&outcome.script_path).unwrap();
    assert!(script_md.starts_with("# AI Mass Layoffs\n"));
    assert!(script_md.contains("Robots are taking over the office."));

    assert!(outcome.quality_path.exists());
    assert!(outcome.compliance_path.exists());

    let patterns: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(knowledge.join("patterns.json")).unwrap()).unwrap();
    let learned: Vec<&serde_json::Value> = patterns.as_object().unwrap().values().collect();
    assert_eq!(learned.len(), 1);
    assert_eq!(learned[0]["success_count"], 1);
    assert!(pipeline.reasoning().current().is_none());
}
