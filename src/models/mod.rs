// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for the workspace scene.

pub mod item;
pub mod layer;
pub mod scene;

use serde::{Deserialize, Serialize};

/// Handle to a raster owned by the engine's raster store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RasterId(pub u64);
