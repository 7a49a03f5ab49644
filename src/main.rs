// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! EASEL - infinite canvas workspace
//!
//! A desktop canvas for placing, arranging, annotating and framing images
//! ahead of crop or outpaint generation.

mod app;

use anyhow::Result;
use app::EaselApp;
use easel::config::EngineConfig;
use std::path::PathBuf;

/// Engine config from the optional first argument, or the defaults.
fn load_config() -> EngineConfig {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return EngineConfig::default();
    };
    match easel::io::serialization::import_config(&path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Failed to load config {}: {:#}, using defaults", path.display(), e);
            EngineConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = load_config();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("EASEL"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "EASEL",
        options,
        Box::new(|_cc| Ok(Box::new(EaselApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
