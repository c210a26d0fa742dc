// VIDFORGE Health Check
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Pre-flight checks run before a pipeline starts: external binaries on
// PATH, writable working directories, configured credentials.

use crate::config::Settings;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{error, info, warn};

const REQUIRED_BINARIES: &[&str] = &["ffmpeg", "ffprobe"];

/// Health status of a subsystem
#[derive(Debug, Clone, PartialEq)]
pub enum SubsystemStatus {
    Healthy,
    Degraded(String),
    Down(String),
}

fn binary_available(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// External binaries the renderer needs that are not on PATH.
pub fn check_dependencies() -> Vec<&'static str> {
    REQUIRED_BINARIES
        .iter()
        .copied()
        .filter(|bin| !binary_available(bin))
        .collect()
}

/// Can we create and remove a file in `dir`?
pub fn check_writable(dir: &Path) -> bool {
    let probe = dir.join(".vidforge_health_check");
    match std::fs::write(&probe, b"ok") {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(e) => {
            error!("[HEALTH] Write check failed in {:?}: {}", dir, e);
            false
        }
    }
}

/// Status of each subsystem a run touches, in pipeline order.
pub fn preflight(settings: &Settings) -> Vec<(&'static str, SubsystemStatus)> {
    let missing = check_dependencies();
    let renderer = if missing.is_empty() {
        SubsystemStatus::Healthy
    } else {
        SubsystemStatus::Down(format!("missing {}", missing.join(", ")))
    };

    let script = if settings.keys.gemini.is_some() {
        SubsystemStatus::Healthy
    } else {
        SubsystemStatus::Down("GEMINI_API_KEY not set".to_string())
    };

    let visuals = match (settings.keys.pexels.is_some(), settings.keys.pixabay.is_some()) {
        (true, _) => SubsystemStatus::Healthy,
        (false, true) => SubsystemStatus::Degraded("Pixabay only".to_string()),
        (false, false) => SubsystemStatus::Degraded("AI images only".to_string()),
    };

    let voice = if settings.keys.cloud_tts.is_some() {
        SubsystemStatus::Healthy
    } else {
        SubsystemStatus::Degraded("free translate voice".to_string())
    };

    let storage = if settings.output_dir.is_dir() && check_writable(&settings.output_dir) {
        SubsystemStatus::Healthy
    } else {
        SubsystemStatus::Down(format!("{:?} not writable", settings.output_dir))
    };

    vec![
        ("storage", storage),
        ("script", script),
        ("visuals", visuals),
        ("voice", voice),
        ("renderer", renderer),
    ]
}

/// Log every subsystem; true when nothing is down.
pub fn log_report(report: &[(&'static str, SubsystemStatus)]) -> bool {
    let mut ok = true;
    for (name, status) in report {
        match status {
            SubsystemStatus::Healthy => info!("[HEALTH] ✓ {}", name),
            SubsystemStatus::Degraded(why) => warn!("[HEALTH] ⚠️ {}: {}", name, why),
            SubsystemStatus::Down(why) => {
                error!("[HEALTH] ✗ {}: {}", name, why);
                ok = false;
            }
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_binary_is_missing() {
        assert!(!binary_available("vidforge-no-such-binary"));
    }

    #[test]
    fn test_check_writable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_writable(dir.path()));
        assert!(!check_writable(&dir.path().join("absent")));
    }

    #[test]
    fn test_preflight_without_keys() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        settings.ensure_dirs().unwrap();
        let report = preflight(&settings);
        let status = |name: &str| report.iter().find(|(n, _)| *n == name).map(|(_, s)| s.clone()).unwrap();

        assert_eq!(status("storage"), SubsystemStatus::Healthy);
        assert!(matches!(status("script"), SubsystemStatus::Down(_)));
        assert_eq!(status("visuals"), SubsystemStatus::Degraded("AI images only".to_string()));
        assert!(!log_report(&report));
    }
}
