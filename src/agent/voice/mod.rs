// VIDFORGE Voice Module
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE

pub mod tts;
pub mod voiceover;

pub use tts::{CloudTts, SpeechBackend, TranslateTts};
pub use voiceover::{audio_duration, clean_for_speech, Voiceover};
