// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Placed images ("items") on the workspace.
//!
//! An item couples a raster with its world-space placement and its natural
//! pixel size. Together they define the pixel density that every crop,
//! outpaint and flatten operation relies on.

use serde::{Deserialize, Serialize};

use super::layer::{Layer, LayerId};
use super::RasterId;
use crate::history::History;
use crate::util::geometry::{Point, Rect, Size};

/// Unique item identifier within a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Prompt and source rasters that produced an item, carried for regeneration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationContext {
    pub prompt: String,
    pub sources: Vec<RasterId>,
}

/// A placed image with its layers and annotation history.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub raster: RasterId,
    /// World-space placement
    pub rect: Rect,
    /// Pixel dimensions of the raster as placed
    pub natural: Size,
    pub layers: Vec<Layer>,
    /// Layer-list snapshots, independent of the workspace history
    pub annotation_history: History<Vec<Layer>>,
    pub is_loading: bool,
    pub is_reasoning: bool,
    pub generation: Option<GenerationContext>,
}

impl Item {
    pub fn new(id: ItemId, raster: RasterId, rect: Rect, natural: Size) -> Self {
        Self {
            id,
            raster,
            rect,
            natural,
            layers: Vec::new(),
            annotation_history: History::new(Vec::new()),
            is_loading: false,
            is_reasoning: false,
            generation: None,
        }
    }

    /// Item pixels per world unit along each axis.
    pub fn density(&self) -> (f32, f32) {
        if self.rect.width <= 0.0 || self.rect.height <= 0.0 {
            return (1.0, 1.0);
        }
        (
            self.natural.width / self.rect.width,
            self.natural.height / self.rect.height,
        )
    }

    /// World point to item-pixel point.
    pub fn to_local(&self, world: Point) -> Point {
        let (dx, dy) = self.density();
        let offset = world - self.rect.origin();
        Point::new(offset.x * dx, offset.y * dy)
    }

    /// Item-pixel point to world point.
    pub fn to_world(&self, local: Point) -> Point {
        let (dx, dy) = self.density();
        self.rect.origin() + Point::new(local.x / dx, local.y / dy)
    }

    /// World-space rectangle of an item-pixel rectangle.
    pub fn local_rect_to_world(&self, rect: &Rect) -> Rect {
        let (dx, dy) = self.density();
        let origin = self.to_world(rect.origin());
        Rect::new(origin.x, origin.y, rect.width / dx, rect.height / dy)
    }

    /// Item-pixel rectangle of a world-space rectangle.
    pub fn world_rect_to_local(&self, rect: &Rect) -> Rect {
        let (dx, dy) = self.density();
        let origin = self.to_local(rect.origin());
        Rect::new(origin.x, origin.y, rect.width * dx, rect.height * dy)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    /// Topmost layer under an item-pixel point.
    pub fn layer_at(&self, local: Point, tolerance: f32) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.contains(local, tolerance))
            .map(|layer| layer.id)
    }

    /// Record the current layer list in the annotation history.
    pub fn commit_layers(&mut self) {
        self.annotation_history.commit(self.layers.clone());
    }

    pub fn undo_layers(&mut self) -> bool {
        match self.annotation_history.undo() {
            Some(layers) => {
                self.layers = layers;
                true
            }
            None => false,
        }
    }

    pub fn redo_layers(&mut self) -> bool {
        match self.annotation_history.redo() {
            Some(layers) => {
                self.layers = layers;
                true
            }
            None => false,
        }
    }

    /// Change the pixel size, scaling layers so they stay put over the image.
    /// The annotation history restarts from the rescaled layers.
    pub fn set_natural(&mut self, natural: Size) {
        if natural == self.natural || natural.width <= 0.0 || natural.height <= 0.0 {
            return;
        }
        if self.natural.width > 0.0 && self.natural.height > 0.0 {
            let sx = natural.width / self.natural.width;
            let sy = natural.height / self.natural.height;
            for layer in &mut self.layers {
                layer.scale(sx, sy);
            }
        }
        self.natural = natural;
        self.annotation_history = History::new(self.layers.clone());
    }

    /// Remove text, stroke, region and connector layers; raster layers stay.
    /// Returns whether anything was removed.
    pub fn clear_annotations(&mut self) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| !layer.is_annotation());
        if self.layers.len() == before {
            return false;
        }
        self.commit_layers();
        true
    }

    /// Every raster this item references, including its history snapshots.
    pub fn raster_ids(&self) -> impl Iterator<Item = RasterId> + '_ {
        std::iter::once(self.raster)
            .chain(self.layers.iter().filter_map(Layer::raster_id))
            .chain(
                self.annotation_history
                    .snapshots()
                    .flat_map(|layers| layers.iter().filter_map(Layer::raster_id)),
            )
            .chain(
                self.generation
                    .iter()
                    .flat_map(|context| context.sources.iter().copied()),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::layer::TextAlign;

    fn item() -> Item {
        Item::new(
            ItemId(1),
            RasterId(1),
            Rect::new(100.0, 50.0, 200.0, 100.0),
            Size::new(400.0, 200.0),
        )
    }

    #[test]
    fn test_local_world_roundtrip() {
        let item = item();
        let local = item.to_local(Point::new(150.0, 75.0));
        assert_eq!(local, Point::new(100.0, 50.0));
        assert_eq!(item.to_world(local), Point::new(150.0, 75.0));
    }

    #[test]
    fn test_clear_annotations_keeps_raster_layers() {
        let mut item = item();
        item.layers.push(Layer::raster(
            LayerId(1),
            Rect::new(0.0, 0.0, 10.0, 10.0),
            RasterId(7),
        ));
        item.layers.push(Layer::text(
            LayerId(2),
            Point::ZERO,
            "note".into(),
            16.0,
            [0, 0, 0, 255],
            TextAlign::Left,
        ));
        item.commit_layers();

        assert!(item.clear_annotations());
        assert_eq!(item.layers.len(), 1);
        assert_eq!(item.layers[0].id, LayerId(1));
        assert!(!item.clear_annotations());

        assert!(item.undo_layers());
        assert_eq!(item.layers.len(), 2);
        assert!(item.raster_ids().any(|id| id == RasterId(7)));
    }
}
