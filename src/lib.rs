// VIDFORGE Library Root
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE

pub mod agent;
pub mod config;
