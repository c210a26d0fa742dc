// VIDFORGE Text Tools
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE

use sha2::{Digest, Sha256};

/// Stable 12-character id derived from arbitrary content.
pub fn generate_id(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..12].to_string()
}

/// Make a string safe to use as a file name (max 100 chars).
pub fn sanitize_filename(name: &str) -> String {
    const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
    name.chars()
        .map(|c| if INVALID.contains(&c) { '_' } else { c })
        .take(100)
        .collect()
}

/// Pack whitespace-separated words into chunks no longer than `max_chars`.
/// A single word longer than the limit becomes its own chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current.push(word);
            current_len = word_len;
        } else {
            current.push(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Spoken duration in whole seconds for `word_count` words at `wpm`.
pub fn estimate_duration(word_count: usize, wpm: usize) -> u32 {
    if wpm == 0 {
        return 0;
    }
    ((word_count as f64 / wpm as f64) * 60.0) as u32
}

/// `M:SS`, or `H:MM:SS` once past the hour.
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Truncate on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
