// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Aspect-ratio frame editor.
//!
//! The editor works on copies: `frame` is the target output rectangle and
//! `original` is where the existing pixels sit. Both move independently and
//! nothing touches the live item until the edit is cropped or confirmed.
//! Cancelling restores the untouched pre-edit copy.

use crate::models::item::{Item, ItemId};
use crate::models::RasterId;
use crate::history::History;
use crate::util::geometry::{
    enclose_with_ratio, reduce_ratio, resize_centered, Handle, Point, Rect, Size,
};

/// An item-shaped rectangle: world placement plus pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRect {
    pub rect: Rect,
    pub natural: Size,
}

#[derive(Debug, Clone)]
pub struct FrameEditor {
    item_id: ItemId,
    before: Item,
    pub frame: FrameRect,
    pub original: FrameRect,
    /// Reduced `width:height` shown in the ratio fields
    pub ratio: (u32, u32),
    /// Fill the area outside the image instead of leaving it transparent
    pub fill: bool,
}

impl FrameEditor {
    pub fn new(item: &Item, fill: bool) -> Self {
        let shape = FrameRect {
            rect: item.rect,
            natural: item.natural,
        };
        Self {
            item_id: item.id,
            before: item.clone(),
            frame: shape,
            original: shape,
            ratio: reduce_ratio(item.natural.width, item.natural.height),
            fill,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// The item exactly as it was when editing began.
    pub fn before(&self) -> &Item {
        &self.before
    }

    /// Pixels per world unit of the underlying image.
    pub fn density(&self) -> (f32, f32) {
        let FrameRect { rect, natural } = self.original;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return (1.0, 1.0);
        }
        (natural.width / rect.width, natural.height / rect.height)
    }

    fn natural_for(&self, rect: &Rect) -> Size {
        let (dx, dy) = self.density();
        Size::new(rect.width * dx, rect.height * dy)
    }

    /// Set the ratio fields and refit the frame around its center.
    ///
    /// The new frame is the smallest rectangle of that ratio that encloses
    /// the image. Zero components are rejected.
    pub fn set_ratio(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let base = Size::new(self.original.rect.width, self.original.rect.height);
        let rect = enclose_with_ratio(self.frame.rect.center(), base, width, height);
        self.frame = FrameRect {
            rect,
            natural: self.natural_for(&rect),
        };
        self.ratio = (width, height);
        true
    }

    /// Resize the frame from `start` (the frame at gesture start) and
    /// re-derive the ratio fields from the resulting pixel size.
    pub fn resize_from(
        &mut self,
        start: &Rect,
        handle: Handle,
        pointer: Point,
        keep_aspect: bool,
        min_size: f32,
    ) {
        let rect = resize_centered(start, handle, pointer, keep_aspect, min_size);
        let natural = self.natural_for(&rect);
        self.frame = FrameRect { rect, natural };
        self.ratio = reduce_ratio(natural.width, natural.height);
    }

    pub fn pan_frame(&mut self, delta: Point) {
        self.frame.rect = self.frame.rect.translate(delta);
    }

    pub fn pan_image(&mut self, delta: Point) {
        self.original.rect = self.original.rect.translate(delta);
    }

    /// Region where the image and the frame overlap.
    pub fn overlap(&self) -> Option<Rect> {
        self.frame.rect.intersect(&self.original.rect)
    }

    /// Output pixel size of the frame.
    pub fn pixel_size(&self) -> (u32, u32) {
        self.frame.natural.pixels()
    }

    /// Where the image lands inside the output, in output pixels.
    pub fn image_placement(&self) -> Rect {
        let (dx, dy) = self.density();
        let offset = self.original.rect.origin() - self.frame.rect.origin();
        Rect::new(
            offset.x * dx,
            offset.y * dy,
            self.original.natural.width,
            self.original.natural.height,
        )
    }

    /// Build the committed item: frame placement, new raster, and layers
    /// shifted into the new pixel space. The layer history restarts from the
    /// shifted layers since older snapshots use the previous origin.
    pub fn build_item(&self, raster: RasterId) -> Item {
        let (width, height) = self.pixel_size();
        let shift = {
            let placement = self.image_placement();
            Point::new(placement.x, placement.y)
        };

        let mut item = self.before.clone();
        item.raster = raster;
        item.rect = self.frame.rect;
        item.natural = Size::new(width as f32, height as f32);
        for layer in &mut item.layers {
            layer.translate(shift);
        }
        item.annotation_history = History::new(item.layers.clone());
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn editor() -> FrameEditor {
        let item = Item::new(
            ItemId(1),
            RasterId(1),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Size::new(100.0, 100.0),
        );
        FrameEditor::new(&item, false)
    }

    #[test]
    fn test_starts_equal_to_item() {
        let editor = editor();
        assert_eq!(editor.frame, editor.original);
        assert_eq!(editor.ratio, (1, 1));
    }

    #[test]
    fn test_ratio_two_to_one_doubles_width_around_center() {
        let mut editor = editor();
        assert!(editor.set_ratio(2, 1));
        let rect = editor.frame.rect;
        assert!((rect.width / rect.height - 2.0).abs() < EPS);
        assert!((rect.center().x - 50.0).abs() < EPS);
        assert!((rect.center().y - 50.0).abs() < EPS);
        assert_eq!(editor.pixel_size(), (200, 100));
        assert_eq!(editor.original.rect, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_zero_ratio_is_rejected() {
        let mut editor = editor();
        assert!(!editor.set_ratio(0, 3));
        assert_eq!(editor.ratio, (1, 1));
    }

    #[test]
    fn test_resize_recomputes_ratio_fields() {
        let mut editor = editor();
        let start = editor.frame.rect;
        editor.resize_from(&start, Handle::Right, Point::new(150.0, 50.0), false, 20.0);
        assert!((editor.frame.rect.width - 200.0).abs() < EPS);
        assert_eq!(editor.ratio, (2, 1));
        let (w, h) = editor.ratio;
        let rect = editor.frame.rect;
        assert!((rect.width / rect.height - w as f32 / h as f32).abs() < EPS);
    }

    #[test]
    fn test_placement_tracks_image_pan() {
        let mut editor = editor();
        editor.set_ratio(2, 1);
        assert_eq!(editor.image_placement(), Rect::new(50.0, 0.0, 100.0, 100.0));
        editor.pan_image(Point::new(-30.0, 10.0));
        assert_eq!(editor.image_placement(), Rect::new(20.0, 10.0, 100.0, 100.0));
        editor.pan_frame(Point::new(20.0, 0.0));
        assert_eq!(editor.image_placement(), Rect::new(0.0, 10.0, 100.0, 100.0));
    }
}
