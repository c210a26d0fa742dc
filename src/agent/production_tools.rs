// VIDFORGE Production Tools - FFmpeg Composition
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Every render step is one ffmpeg invocation: per-visual segments, title
// card, audio mux, vertical shorts and narration joins.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const TITLE_CARD_SECONDS: f64 = 5.0;

/// Output frame geometry for a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FrameSpec {
    /// Fit inside the frame without distortion, letterboxing the rest.
    fn fit_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
            w = self.width,
            h = self.height,
            fps = self.fps
        )
    }
}

/// File names starting with `-` would be read by ffmpeg as options.
pub fn safe_arg_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// Escape text for the `drawtext` filter's `text=` option.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '\'' | ':' | '%' | ',' | ';' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

async fn run_ffmpeg(label: &str, args: Vec<OsString>) -> Result<()> {
    debug!("[PROD] ffmpeg {}: {:?}", label, args);
    let output = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error", "-nostdin"])
        .args(&args)
        .output()
        .await
        .context("Failed to launch ffmpeg (is it on PATH?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(5)..].join(" | ");
        bail!("FFmpeg {} failed: {}", label, tail);
    }
    Ok(())
}

fn os(items: &[&str]) -> Vec<OsString> {
    items.iter().map(OsString::from).collect()
}

fn secs(value: f64) -> OsString {
    OsString::from(format!("{:.3}", value))
}

/// Duration in seconds as reported by ffprobe's container header.
pub async fn media_duration(path: &Path) -> Result<f64> {
    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new("ffprobe")
            .kill_on_drop(true)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(safe_arg_path(path))
            .output(),
    )
    .await
    .context("ffprobe duration check timed out")?
    .context("Failed to launch ffprobe")?;

    let text = String::from_utf8_lossy(&output.stdout);
    text.trim()
        .parse::<f64>()
        .with_context(|| format!("Failed to parse duration from ffprobe output for {:?}", path))
}

/// One timeline segment from a still (looped) or a clip (looped, then trimmed).
pub async fn render_segment(input: &Path, is_image: bool, duration: f64, frame: FrameSpec, output: &Path) -> Result<()> {
    let mut args = if is_image { os(&["-loop", "1"]) } else { os(&["-stream_loop", "-1"]) };
    args.push("-i".into());
    args.push(safe_arg_path(input).into());
    args.push("-t".into());
    args.push(secs(duration));
    args.push("-vf".into());
    args.push(frame.fit_filter().into());
    args.extend(os(&["-an", "-c:v", "libx264", "-preset", "veryfast", "-pix_fmt", "yuv420p"]));
    args.push(safe_arg_path(output).into());
    run_ffmpeg("render_segment", args).await
}

/// Placeholder for a visual that would not render.
pub async fn black_segment(duration: f64, frame: FrameSpec, output: &Path) -> Result<()> {
    let mut args = os(&["-f", "lavfi", "-i"]);
    args.push(format!("color=c=black:s={}x{}:r={}", frame.width, frame.height, frame.fps).into());
    args.push("-t".into());
    args.push(secs(duration));
    args.extend(os(&["-c:v", "libx264", "-preset", "veryfast", "-pix_fmt", "yuv420p"]));
    args.push(safe_arg_path(output).into());
    run_ffmpeg("black_segment", args).await
}

/// Centred title over the first five seconds.
pub async fn overlay_title(input: &Path, title: &str, output: &Path) -> Result<()> {
    let filter = format!(
        "drawtext=text='{}':fontsize=72:fontcolor=white:borderw=2:bordercolor=black:\
         box=1:boxcolor=black@0.4:boxborderw=24:x=(w-text_w)/2:y=(h-text_h)/2:enable='between(t,0,{})'",
        escape_drawtext(title),
        TITLE_CARD_SECONDS
    );
    let mut args = os(&["-i"]);
    args.push(safe_arg_path(input).into());
    args.push("-vf".into());
    args.push(filter.into());
    args.extend(os(&["-c:v", "libx264", "-preset", "veryfast", "-pix_fmt", "yuv420p", "-c:a", "copy"]));
    args.push(safe_arg_path(output).into());
    run_ffmpeg("overlay_title", args).await
}

/// Attach the narration track; video is stream-copied.
pub async fn mux_audio(video: &Path, audio: &Path, output: &Path) -> Result<()> {
    let mut args = os(&["-i"]);
    args.push(safe_arg_path(video).into());
    args.push("-i".into());
    args.push(safe_arg_path(audio).into());
    args.extend(os(&[
        "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-b:a", "192k", "-shortest", "-movflags", "+faststart",
    ]));
    args.push(safe_arg_path(output).into());
    run_ffmpeg("mux_audio", args).await?;
    info!("[PROD] Muxed narration into {:?}", output.file_name().unwrap_or_default());
    Ok(())
}

/// Vertical 9:16 centre crop of `[start, start + duration)`.
pub async fn extract_short(input: &Path, start: f64, duration: f64, width: u32, height: u32, output: &Path) -> Result<()> {
    let mut args = vec![OsString::from("-ss"), secs(start), OsString::from("-i")];
    args.push(safe_arg_path(input).into());
    args.push("-t".into());
    args.push(secs(duration));
    args.push("-vf".into());
    args.push(format!("crop=trunc(ih*9/16/2)*2:ih,scale={}:{},setsar=1", width, height).into());
    args.extend(os(&["-c:v", "libx264", "-preset", "ultrafast", "-pix_fmt", "yuv420p", "-c:a", "aac", "-r", "30"]));
    args.push(safe_arg_path(output).into());
    run_ffmpeg("extract_short", args).await
}

/// `[i:a]apad` per input then `concat`; each piece is followed by `gap` of silence.
pub fn gap_concat_filter(inputs: usize, gap: f64) -> String {
    let mut filter = String::new();
    for i in 0..inputs {
        filter.push_str(&format!("[{i}:a]apad=pad_dur={gap:.3}[a{i}];"));
    }
    for i in 0..inputs {
        filter.push_str(&format!("[a{i}]"));
    }
    filter.push_str(&format!("concat=n={inputs}:v=0:a=1[out]"));
    filter
}

/// Join narration chunks into one MP3.
pub async fn concat_audio_with_gaps(inputs: &[PathBuf], gap: f64, output: &Path) -> Result<()> {
    if inputs.is_empty() {
        bail!("No audio inputs to join");
    }
    let mut args = Vec::new();
    for input in inputs {
        args.push(OsString::from("-i"));
        args.push(safe_arg_path(input).into());
    }
    args.push("-filter_complex".into());
    args.push(gap_concat_filter(inputs.len(), gap).into());
    args.extend(os(&["-map", "[out]", "-c:a", "libmp3lame", "-b:a", "128k"]));
    args.push(safe_arg_path(output).into());
    run_ffmpeg("concat_audio", args).await
}

/// Test tone, used by integration tests and the health check.
pub async fn sine_tone(seconds: f64, output: &Path) -> Result<()> {
    let mut args = os(&["-f", "lavfi", "-i"]);
    args.push(format!("sine=frequency=440:duration={}", seconds).into());
    args.extend(os(&["-c:a", "libmp3lame", "-b:a", "64k"]));
    args.push(safe_arg_path(output).into());
    run_ffmpeg("sine_tone", args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_arg_path() {
        assert_eq!(safe_arg_path(Path::new("-out.mp4")), PathBuf::from("./-out.mp4"));
        assert_eq!(safe_arg_path(Path::new("/tmp/out.mp4")), PathBuf::from("/tmp/out.mp4"));
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("AI: 50% of jobs"), "AI\\: 50\\% of jobs");
        assert_eq!(escape_drawtext("Robots' rise"), "Robots\\' rise");
    }

    #[test]
    fn test_fit_filter() {
        let frame = FrameSpec { width: 1920, height: 1080, fps: 30 };
        let filter = frame.fit_filter();
        assert!(filter.starts_with("scale=1920:1080:force_original_aspect_ratio=decrease"));
        assert!(filter.ends_with("fps=30"));
    }

    #[test]
    fn test_gap_concat_filter() {
        assert_eq!(
            gap_concat_filter(2, 0.3),
            "[0:a]apad=pad_dur=0.300[a0];[1:a]apad=pad_dur=0.300[a1];[a0][a1]concat=n=2:v=0:a=1[out]"
        );
    }

    #[tokio::test]
    async fn test_concat_requires_inputs() {
        let err = concat_audio_with_gaps(&[], 0.3, Path::new("/tmp/none.mp3")).await.unwrap_err();
        assert!(err.to_string().contains("No audio inputs"));
    }
}
