// VIDFORGE Download Guard — Safe Visual Acquisition
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Every stock/AI visual URL is screened before fetch, and every file that
// lands in temp/visuals is validated before the assembler is allowed to
// read it.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Extensions the assembler knows how to read.
const SAFE_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".webm", ".jpg", ".jpeg", ".png", ".webp", ".mp3"];

/// Suspicious URL patterns that indicate non-media content.
const BLOCKED_URL_PATTERNS: &[&str] = &[
    ".exe", ".bat", ".cmd", ".ps1", ".msi", ".scr", ".vbs", ".hta", ".dll", ".reg",
    "malware", "trojan", "keygen", "warez",
];

/// Anything smaller than this is an error page, not media.
const MIN_FILE_SIZE: u64 = 1024;

/// Stock clips are a few hundred MB at most.
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

pub struct DownloadGuard;

impl DownloadGuard {
    /// Validate a URL before downloading. Returns `Ok(())` if safe.
    pub fn validate_url(url: &str) -> Result<(), String> {
        let url_lower = url.to_lowercase();

        if url_lower.starts_with("data:") || url_lower.starts_with("javascript:") {
            return Err("Blocked injection URI scheme".to_string());
        }

        let parsed = url::Url::parse(url).map_err(|e| format!("Malformed URL {}: {}", url, e))?;
        let local = parsed.scheme() == "http" && matches!(parsed.host_str(), Some("localhost" | "127.0.0.1"));
        if parsed.scheme() != "https" && !local {
            warn!("[GUARD] 🛡️ Blocked non-HTTPS URL: {}", url);
            return Err(format!("Unsafe protocol — only HTTPS allowed: {}", url));
        }

        // Query strings carry free-form prompts (Pollinations), only the path is screened.
        let path_part = url_lower.split('?').next().unwrap_or_default();
        for pattern in BLOCKED_URL_PATTERNS {
            if path_part.contains(pattern) {
                warn!("[GUARD] 🛡️ Blocked suspicious URL pattern '{}': {}", pattern, url);
                return Err(format!("URL contains blocked pattern '{}'", pattern));
            }
        }

        debug!("[GUARD] URL passed safety check: {}", url);
        Ok(())
    }

    /// Validate a downloaded visual on disk. Stills must also decode as images.
    pub fn validate_downloaded_file(path: &Path) -> Result<(), String> {
        if !path.exists() {
            return Err(format!("File does not exist: {:?}", path));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        if !SAFE_EXTENSIONS.contains(&ext.as_str()) {
            warn!("[GUARD] 🛡️ Blocked unsafe file extension '{}': {:?}", ext, path);
            return Err(format!("Unsafe file extension '{}' — only media files allowed", ext));
        }

        let size = fs::metadata(path)
            .map_err(|e| format!("Cannot read file metadata: {}", e))?
            .len();
        if size < MIN_FILE_SIZE {
            return Err(format!("File too small ({} bytes) — likely an error page", size));
        }
        if size > MAX_FILE_SIZE {
            return Err(format!("File too large ({} bytes)", size));
        }

        Self::check_magic_bytes(path)?;

        if matches!(ext.as_str(), ".jpg" | ".jpeg" | ".png" | ".webp") {
            // Providers do not always serve the format the extension claims.
            let (w, h) = image::io::Reader::open(path)
                .and_then(|r| r.with_guessed_format())
                .map_err(|e| format!("Image does not decode: {}", e))?
                .into_dimensions()
                .map_err(|e| format!("Image does not decode: {}", e))?;
            if w == 0 || h == 0 {
                return Err("Image has zero dimensions".to_string());
            }
        }

        debug!("[GUARD] File passed safety check: {:?} ({} bytes)", path.file_name().unwrap_or_default(), size);
        Ok(())
    }

    /// Reject executables and scripts served under a media name.
    fn check_magic_bytes(path: &Path) -> Result<(), String> {
        let mut file = File::open(path).map_err(|e| format!("Cannot open file for magic-byte check: {}", e))?;

        let mut header = [0u8; 4];
        let bytes_read = file
            .read(&mut header)
            .map_err(|e| format!("Cannot read file header: {}", e))?;

        if bytes_read < 2 {
            return Err("File too small to validate header".to_string());
        }
        if header[0] == b'M' && header[1] == b'Z' {
            return Err("File contains Windows executable (MZ header) — BLOCKED".to_string());
        }
        if bytes_read >= 4 && header[0] == 0x7F && &header[1..4] == b"ELF" {
            return Err("File contains Linux executable (ELF header) — BLOCKED".to_string());
        }
        if header[0] == b'#' && header[1] == b'!' {
            return Err("File contains script shebang (#!) — BLOCKED".to_string());
        }
        if header[0] == b'<' {
            return Err("File is markup, not media — BLOCKED".to_string());
        }
        Ok(())
    }
}
