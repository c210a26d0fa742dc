// VIDFORGE Agent Modules
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE

pub mod download_guard;
pub mod gemini_bridge;
pub mod retry;
pub mod text_tools;

pub mod script_generator;
pub mod topic_discovery;
pub mod visual_sourcer;
pub mod voice;

pub mod assembler;
pub mod production_tools;
pub mod video_stitcher;

pub mod compliance;
pub mod health;
pub mod learning;
pub mod metadata;
pub mod quality;
pub mod reasoning;
pub mod youtube;

pub mod core; // Pipeline orchestrator
