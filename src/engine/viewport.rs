// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Screen/world coordinate transform.
//!
//! `screen = world * scale + pan` and `world = (screen - pan) / scale`.
//! Zooming solves for the pan that keeps the anchor's world point fixed.

use crate::util::geometry::{distance, Point, Rect};

/// Two touch positions in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchSample {
    pub a: Point,
    pub b: Point,
}

impl PinchSample {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn span(&self) -> f32 {
        distance(self.a, self.b)
    }

    pub fn midpoint(&self) -> Point {
        self.a.midpoint(self.b)
    }
}

/// Affine mapping between screen space and world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub pan: Point,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.05, 20.0)
    }
}

impl Viewport {
    /// Zoom bounds are sanitised: non-finite or non-positive values fall
    /// back to the defaults and swapped bounds are reordered.
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        let valid = |zoom: f32, fallback: f32| {
            if zoom.is_finite() && zoom > 0.0 {
                zoom
            } else {
                fallback
            }
        };
        let (min_zoom, max_zoom) = (valid(min_zoom, 0.05), valid(max_zoom, 20.0));
        Self {
            scale: 1.0,
            pan: Point::ZERO,
            min_zoom: min_zoom.min(max_zoom),
            max_zoom: max_zoom.max(min_zoom),
        }
    }

    /// Clamp a scale to the zoom bounds without panicking on bad bounds.
    fn clamp_scale(&self, scale: f32) -> f32 {
        scale.max(self.min_zoom).min(self.max_zoom)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        (p - self.pan) / self.scale
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        p * self.scale + self.pan
    }

    pub fn world_rect_to_screen(&self, rect: &Rect) -> Rect {
        let origin = self.world_to_screen(rect.origin());
        Rect::new(
            origin.x,
            origin.y,
            rect.width * self.scale,
            rect.height * self.scale,
        )
    }

    /// Convert a constant screen-space length to world units.
    pub fn screen_len_to_world(&self, px: f32) -> f32 {
        px / self.scale
    }

    /// Set the scale (clamped) keeping the world point under `anchor` fixed.
    pub fn zoom_to(&mut self, anchor: Point, scale: f32) {
        let new_scale = self.clamp_scale(scale);
        if !new_scale.is_finite() || new_scale <= 0.0 {
            return;
        }
        let ratio = new_scale / self.scale;
        self.pan = anchor - (anchor - self.pan) * ratio;
        self.scale = new_scale;
    }

    /// Multiply the scale by `factor` about `anchor`.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        self.zoom_to(anchor, self.scale * factor);
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.pan = self.pan + delta;
    }

    /// Apply one pinch step between consecutive samples.
    ///
    /// The midpoint translation pans the view, and the span ratio zooms about
    /// the previous sample's midpoint shifted by that translation, so zoom
    /// follows the live midpoint. Degenerate spans are ignored.
    pub fn pinch(&mut self, previous: &PinchSample, current: &PinchSample) {
        let previous_span = previous.span();
        let current_span = current.span();
        if previous_span <= f32::EPSILON || current_span <= f32::EPSILON {
            return;
        }
        let translation = current.midpoint() - previous.midpoint();
        self.pan_by(translation);
        self.zoom_at(current.midpoint(), current_span / previous_span);
    }

    /// World point at the center of a viewport of the given screen size.
    pub fn center_world(&self, viewport_size: Point) -> Point {
        self.screen_to_world(viewport_size * 0.5)
    }

    /// Center `rect` in the viewport, zooming out if needed so it fits with
    /// some margin. Never zooms in past 1:1.
    pub fn focus(&mut self, rect: &Rect, viewport_size: Point) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let margin = 0.8;
        let fit = (viewport_size.x * margin / rect.width)
            .min(viewport_size.y * margin / rect.height)
            .min(1.0);
        self.scale = self.clamp_scale(fit);
        self.pan = viewport_size * 0.5 - rect.center() * self.scale;
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.pan = Point::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: Point, b: Point) -> bool {
        distance(a, b) < EPS
    }

    #[test]
    fn test_screen_world_roundtrip() {
        for scale in [0.05, 0.3, 1.0, 4.5, 20.0] {
            let viewport = Viewport {
                scale,
                pan: Point::new(-123.5, 77.25),
                ..Viewport::default()
            };
            for p in [Point::ZERO, Point::new(640.0, 360.0), Point::new(-20.0, 999.0)] {
                assert!(close(viewport.world_to_screen(viewport.screen_to_world(p)), p));
            }
        }
    }

    #[test]
    fn test_zoom_keeps_anchor_world_point() {
        let mut viewport = Viewport {
            pan: Point::new(30.0, -40.0),
            ..Viewport::default()
        };
        let anchor = Point::new(200.0, 150.0);
        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at(anchor, 3.7);
        assert!(close(viewport.screen_to_world(anchor), before));
        viewport.zoom_at(anchor, 0.01);
        assert!((viewport.scale - viewport.min_zoom).abs() < EPS);
        assert!(close(viewport.screen_to_world(anchor), before));
    }

    #[test]
    fn test_zoom_clamps_to_range() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Point::ZERO, 1000.0);
        assert_eq!(viewport.scale, 20.0);
    }

    #[test]
    fn test_bad_zoom_bounds_are_sanitised() {
        let mut viewport = Viewport::new(30.0, 20.0);
        assert_eq!((viewport.min_zoom, viewport.max_zoom), (20.0, 30.0));
        viewport.zoom_at(Point::ZERO, 1.25);
        assert!((viewport.scale - 20.0).abs() < EPS);

        let mut viewport = Viewport::new(f32::NAN, -1.0);
        assert_eq!((viewport.min_zoom, viewport.max_zoom), (0.05, 20.0));
        viewport.focus(&Rect::new(0.0, 0.0, 10.0, 10.0), Point::new(800.0, 600.0));
        assert!((viewport.scale - 1.0).abs() < EPS);
    }

    #[test]
    fn test_pinch_doubling_span_with_fixed_midpoint() {
        let mut viewport = Viewport::default();
        let mid = Point::new(300.0, 200.0);
        let before = viewport.screen_to_world(mid);
        let previous = PinchSample::new(Point::new(250.0, 200.0), Point::new(350.0, 200.0));
        let current = PinchSample::new(Point::new(200.0, 200.0), Point::new(400.0, 200.0));
        viewport.pinch(&previous, &current);
        assert!((viewport.scale - 2.0).abs() < EPS);
        assert!(close(viewport.screen_to_world(mid), before));
    }

    #[test]
    fn test_pinch_translation_pans() {
        let mut viewport = Viewport::default();
        let previous = PinchSample::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let current = PinchSample::new(Point::new(10.0, 5.0), Point::new(110.0, 5.0));
        viewport.pinch(&previous, &current);
        assert!((viewport.scale - 1.0).abs() < EPS);
        assert!(close(viewport.pan, Point::new(10.0, 5.0)));
    }

    #[test]
    fn test_degenerate_pinch_is_ignored() {
        let mut viewport = Viewport::default();
        let collapsed = PinchSample::new(Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        let current = PinchSample::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        viewport.pinch(&collapsed, &current);
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn test_focus_centers_rect() {
        let mut viewport = Viewport::default();
        let rect = Rect::new(1000.0, 1000.0, 100.0, 100.0);
        let size = Point::new(800.0, 600.0);
        viewport.focus(&rect, size);
        assert!(close(viewport.world_to_screen(rect.center()), size * 0.5));
        assert!(close(viewport.center_world(size), rect.center()));
    }
}
