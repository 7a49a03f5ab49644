// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Engine tuning parameters.
//!
//! Every field has a default, so a config file only needs to name the
//! values it overrides.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::models::layer::Rgba;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lower zoom clamp
    pub min_zoom: f32,
    /// Upper zoom clamp
    pub max_zoom: f32,
    /// Zoom factor per ctrl+wheel tick
    pub wheel_zoom_step: f32,
    /// Screen-space grab radius of resize handles
    pub handle_margin_px: f32,
    /// Screen-space minimum item/frame dimension during resize
    pub min_size_px: f32,
    /// Screen-space movement that turns a click into a drag
    pub drag_threshold_px: f32,
    /// Fill behind the image in crop results when fill is enabled
    pub frame_fill: Rgba,
    /// Opaque fill used for the outpaint placeholder
    pub outpaint_fill: Rgba,
    /// Whether crop results are filled (true) or transparent (false) by default
    pub fill_by_default: bool,
    pub corner_radius: f32,
    /// Longest world-space side of a newly added image
    pub placement_max_side: f32,
    /// Workspace undo depth, 0 for unbounded
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.05,
            max_zoom: 20.0,
            wheel_zoom_step: 1.1,
            handle_margin_px: 20.0,
            min_size_px: 20.0,
            drag_threshold_px: 5.0,
            frame_fill: [255, 255, 255, 255],
            outpaint_fill: [255, 255, 255, 255],
            fill_by_default: false,
            corner_radius: 8.0,
            placement_max_side: 512.0,
            history_limit: 100,
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = |value: f32| value.is_finite() && value > 0.0;
        ensure!(
            positive(self.min_zoom) && positive(self.max_zoom),
            "zoom bounds must be positive, got {} and {}",
            self.min_zoom,
            self.max_zoom
        );
        ensure!(
            self.min_zoom <= self.max_zoom,
            "min_zoom {} exceeds max_zoom {}",
            self.min_zoom,
            self.max_zoom
        );
        ensure!(
            positive(self.wheel_zoom_step),
            "wheel_zoom_step must be positive, got {}",
            self.wheel_zoom_step
        );
        ensure!(
            positive(self.placement_max_side),
            "placement_max_side must be positive, got {}",
            self.placement_max_side
        );
        for (name, value) in [
            ("handle_margin_px", self.handle_margin_px),
            ("min_size_px", self.min_size_px),
            ("drag_threshold_px", self.drag_threshold_px),
            ("corner_radius", self.corner_radius),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{} must be a non-negative number, got {}",
                name,
                value
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: EngineConfig = serde_yaml::from_str("max_zoom: 8.0\ndrag_threshold_px: 3").expect("yaml");
        assert_eq!(config.max_zoom, 8.0);
        assert_eq!(config.drag_threshold_px, 3.0);
        assert_eq!(config.min_zoom, EngineConfig::default().min_zoom);
    }

    #[test]
    fn test_validate_rejects_bad_zoom_bounds() {
        assert!(EngineConfig::default().validate().is_ok());
        let swapped = EngineConfig {
            min_zoom: 30.0,
            max_zoom: 20.0,
            ..EngineConfig::default()
        };
        assert!(swapped.validate().is_err());
        let nan = EngineConfig {
            max_zoom: f32::NAN,
            ..EngineConfig::default()
        };
        assert!(nan.validate().is_err());
    }
}
