// VIDFORGE Video Stitcher — Lossless Segment Concatenation
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Rendered timeline segments share codec, size and frame rate, so they are
// joined with FFmpeg's concat demuxer (`-f concat -c copy`).

use crate::agent::production_tools::safe_arg_path;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

pub struct VideoStitcher;

impl VideoStitcher {
    /// One `file '<path>'` line per segment. Single quotes inside a path are
    /// closed, escaped and reopened as the demuxer expects.
    pub fn create_concat_manifest(segments: &[PathBuf]) -> String {
        segments
            .iter()
            .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the manifest next to the output and copy-mux all segments.
    pub async fn finalize(segments: &[PathBuf], output_path: &Path) -> Result<PathBuf> {
        if segments.is_empty() {
            bail!("No segments to stitch.");
        }

        let manifest_path = output_path.with_extension("concat_manifest.txt");
        fs::write(&manifest_path, Self::create_concat_manifest(segments))
            .with_context(|| format!("Cannot write manifest {:?}", manifest_path))?;

        info!("[STITCHER] Manifest written ({} segments): {:?}", segments.len(), manifest_path);

        let status = Command::new("ffmpeg")
            .args(["-y", "-hide_banner", "-loglevel", "error", "-nostdin", "-f", "concat", "-safe", "0", "-i"])
            .arg(&manifest_path)
            .args(["-c", "copy"])
            .arg(safe_arg_path(output_path))
            .status()
            .await
            .context("Failed to launch ffmpeg")?;

        let _ = fs::remove_file(&manifest_path);

        if status.success() {
            info!("[STITCHER] ✅ Stitched: {:?}", output_path);
            Ok(output_path.to_path_buf())
        } else {
            error!("[STITCHER] ❌ FFmpeg concat failed.");
            bail!("FFmpeg concat demuxer failed.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_manifest_generation() {
        let segments = vec![
            PathBuf::from("/tmp/seg_000.mp4"),
            PathBuf::from("/tmp/seg_001.mp4"),
            PathBuf::from("/tmp/seg_002.mp4"),
        ];
        let manifest = VideoStitcher::create_concat_manifest(&segments);
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "file '/tmp/seg_000.mp4'");
        assert!(lines[2].contains("seg_002.mp4"));
    }

    #[test]
    fn test_manifest_escapes_quotes() {
        let manifest = VideoStitcher::create_concat_manifest(&[PathBuf::from("/tmp/robot's.mp4")]);
        assert_eq!(manifest, "file '/tmp/robot'\\''s.mp4'");
    }

    #[tokio::test]
    async fn test_empty_segments_rejected() {
        assert!(VideoStitcher::create_concat_manifest(&[]).is_empty());
        assert!(VideoStitcher::finalize(&[], Path::new("/tmp/out.mp4")).await.is_err());
    }
}
