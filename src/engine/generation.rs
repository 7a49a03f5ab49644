// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Boundary to the external generation service.
//!
//! The workspace hands an [`OutpaintRequest`] to a [`Generator`] and keeps
//! working; the generator answers later through the reply channel with
//! either a replacement raster or an error.

use image::RgbaImage;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use super::raster::RasterSource;
use crate::models::item::ItemId;
use crate::util::geometry::Rect;

/// Placeholder composition and target geometry for an outpaint.
#[derive(Debug, Clone)]
pub struct OutpaintRequest {
    pub item_id: ItemId,
    /// Opaque-filled composition of the image inside the frame
    pub image: Arc<RgbaImage>,
    /// Final world rectangle of the frame
    pub frame: Rect,
    pub pixel_size: (u32, u32),
}

/// Completion of a generation round-trip.
#[derive(Debug, Clone)]
pub struct GenerationReply {
    pub item_id: ItemId,
    pub result: Result<RasterSource, String>,
}

/// External collaborator that produces replacement rasters.
pub trait Generator {
    /// Start an outpaint. Must eventually send exactly one reply.
    fn outpaint(&mut self, request: OutpaintRequest, reply: Sender<GenerationReply>);
}

/// Generator used when no backend is configured; every request fails.
#[derive(Debug, Default)]
pub struct OfflineGenerator;

impl Generator for OfflineGenerator {
    fn outpaint(&mut self, request: OutpaintRequest, reply: Sender<GenerationReply>) {
        log::warn!(
            "no generation backend configured, rejecting outpaint of {:?}",
            request.item_id
        );
        let _ = reply.send(GenerationReply {
            item_id: request.item_id,
            result: Err("no generation backend configured".to_string()),
        });
    }
}
