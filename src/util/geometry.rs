// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the plain value types shared by the whole workspace
//! (points, sizes, rectangles, resize handles) together with the two resize
//! policies: anchored resizing for normal placement editing and
//! center-relative resizing for the frame editor.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// A 2D point (or offset) in world, screen or layer-local units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Midpoint between two points.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;

    fn div(self, rhs: f32) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl From<egui::Pos2> for Point {
    fn from(value: egui::Pos2) -> Self {
        Point::new(value.x, value.y)
    }
}

impl From<Point> for egui::Pos2 {
    fn from(value: Point) -> Self {
        egui::pos2(value.x, value.y)
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f32 {
    (b - a).length()
}

/// Pixel dimensions of a raster ("natural" size).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whole-pixel dimensions, never smaller than 1x1.
    pub fn pixels(self) -> (u32, u32) {
        (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }
}

/// Axis-aligned rectangle stored as origin plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two arbitrary corners.
    pub fn from_points(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn from_center_size(center: Point, width: f32, height: f32) -> Self {
        Self::new(center.x - width * 0.5, center.y - height * 0.5, width, height)
    }

    /// Tight bounding box of a point list, `None` when the list is empty.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::from_points(min, max))
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// True when `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Overlapping region of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| Rect::new(x, y, right - x, bottom - y))
    }

    pub fn translate(&self, delta: Point) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    pub fn expand(&self, amount: f32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    /// Position of a resize handle on this rectangle.
    pub fn handle_position(&self, handle: Handle) -> Point {
        let c = self.center();
        match handle {
            Handle::TopLeft => Point::new(self.x, self.y),
            Handle::Top => Point::new(c.x, self.y),
            Handle::TopRight => Point::new(self.right(), self.y),
            Handle::Right => Point::new(self.right(), c.y),
            Handle::BottomRight => Point::new(self.right(), self.bottom()),
            Handle::Bottom => Point::new(c.x, self.bottom()),
            Handle::BottomLeft => Point::new(self.x, self.bottom()),
            Handle::Left => Point::new(self.x, c.y),
        }
    }
}

impl From<Rect> for egui::Rect {
    fn from(value: Rect) -> Self {
        egui::Rect::from_min_size(
            egui::pos2(value.x, value.y),
            egui::vec2(value.width, value.height),
        )
    }
}

/// Resize handle on a rectangle. Sides are only exposed by the frame editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
    ];

    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomRight | Handle::BottomLeft
        )
    }

    /// -1 when the handle moves the left edge, 1 for the right edge, 0 otherwise.
    pub fn x_dir(self) -> f32 {
        match self {
            Handle::TopLeft | Handle::Left | Handle::BottomLeft => -1.0,
            Handle::TopRight | Handle::Right | Handle::BottomRight => 1.0,
            Handle::Top | Handle::Bottom => 0.0,
        }
    }

    /// -1 when the handle moves the top edge, 1 for the bottom edge, 0 otherwise.
    pub fn y_dir(self) -> f32 {
        match self {
            Handle::TopLeft | Handle::Top | Handle::TopRight => -1.0,
            Handle::BottomLeft | Handle::Bottom | Handle::BottomRight => 1.0,
            Handle::Left | Handle::Right => 0.0,
        }
    }
}

/// Handles exposed for a rectangle: corners always, sides only when requested.
pub fn handle_positions(rect: &Rect, include_sides: bool) -> Vec<(Handle, Point)> {
    let handles: &[Handle] = if include_sides {
        &Handle::ALL
    } else {
        &Handle::CORNERS
    };
    handles
        .iter()
        .map(|&handle| (handle, rect.handle_position(handle)))
        .collect()
}

/// Grow `(width, height)` to keep `aspect` while making the smaller side at
/// least `min_size`.
fn clamp_with_aspect(width: f32, aspect: f32, min_size: f32) -> (f32, f32) {
    let min_width = if aspect >= 1.0 {
        min_size * aspect
    } else {
        min_size
    };
    let width = width.max(min_width);
    (width, width / aspect)
}

/// Anchored resize: the corner (or edge) opposite the dragged handle stays
/// fixed while the pointer defines the new extent.
///
/// With `keep_aspect`, whichever of the pointer's implied width or implied
/// height (converted through the original aspect) is larger wins, and the
/// other dimension is derived from it. Dimensions never drop below
/// `min_size`, even when the pointer crosses the anchor.
pub fn resize_anchored(
    original: &Rect,
    handle: Handle,
    pointer: Point,
    keep_aspect: bool,
    min_size: f32,
) -> Rect {
    let (dir_x, dir_y) = (handle.x_dir(), handle.y_dir());
    let anchor_x = if dir_x < 0.0 { original.right() } else { original.x };
    let anchor_y = if dir_y < 0.0 { original.bottom() } else { original.y };

    let mut width = if dir_x != 0.0 {
        (pointer.x - anchor_x) * dir_x
    } else {
        original.width
    };
    let mut height = if dir_y != 0.0 {
        (pointer.y - anchor_y) * dir_y
    } else {
        original.height
    };

    if keep_aspect && handle.is_corner() && original.width > 0.0 && original.height > 0.0 {
        let aspect = original.width / original.height;
        let candidate = width.max(height * aspect);
        (width, height) = clamp_with_aspect(candidate, aspect, min_size);
    } else {
        if dir_x != 0.0 {
            width = width.max(min_size);
        }
        if dir_y != 0.0 {
            height = height.max(min_size);
        }
    }

    let x = if dir_x < 0.0 { anchor_x - width } else { anchor_x };
    let y = if dir_y < 0.0 { anchor_y - height } else { anchor_y };
    Rect::new(x, y, width, height)
}

/// Center-relative resize used by the frame editor.
///
/// Side handles resize symmetrically about the center along one axis.
/// Corner handles with `keep_aspect` resize about the center keeping the
/// original aspect; without it they fall back to a free anchored resize.
pub fn resize_centered(
    original: &Rect,
    handle: Handle,
    pointer: Point,
    keep_aspect: bool,
    min_size: f32,
) -> Rect {
    let center = original.center();
    if !handle.is_corner() {
        return if handle.x_dir() != 0.0 {
            let width = ((pointer.x - center.x).abs() * 2.0).max(min_size);
            Rect::new(center.x - width * 0.5, original.y, width, original.height)
        } else {
            let height = ((pointer.y - center.y).abs() * 2.0).max(min_size);
            Rect::new(original.x, center.y - height * 0.5, original.width, height)
        };
    }

    if !keep_aspect || original.width <= 0.0 || original.height <= 0.0 {
        return resize_anchored(original, handle, pointer, false, min_size);
    }

    let aspect = original.width / original.height;
    let width = (pointer.x - center.x).abs() * 2.0;
    let height = (pointer.y - center.y).abs() * 2.0;
    let (width, height) = clamp_with_aspect(width.max(height * aspect), aspect, min_size);
    Rect::from_center_size(center, width, height)
}

/// Natural pixel size after a world-space resize, keeping the pixel density
/// that `original_rect` and `original_natural` define.
pub fn rescale_natural(original_rect: &Rect, original_natural: Size, new_rect: &Rect) -> Size {
    if original_rect.width <= 0.0 || original_rect.height <= 0.0 {
        return original_natural;
    }
    Size::new(
        new_rect.width * original_natural.width / original_rect.width,
        new_rect.height * original_natural.height / original_rect.height,
    )
}

/// Greatest common divisor.
pub fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Smallest integer ratio equivalent to the rounded `width:height`.
pub fn reduce_ratio(width: f32, height: f32) -> (u32, u32) {
    let w = width.round().max(1.0) as u32;
    let h = height.round().max(1.0) as u32;
    let divisor = gcd(w, h).max(1);
    (w / divisor, h / divisor)
}

/// Smallest rectangle with ratio `ratio_w:ratio_h` that encloses `base`,
/// centered on `center`.
pub fn enclose_with_ratio(center: Point, base: Size, ratio_w: u32, ratio_h: u32) -> Rect {
    let target = ratio_w.max(1) as f32 / ratio_h.max(1) as f32;
    let (width, height) = if base.height > 0.0 && base.width / base.height > target {
        (base.width, base.width / target)
    } else {
        (base.height * target, base.height)
    };
    Rect::from_center_size(center, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_aspect_locked_corner_resize_example() {
        let original = Rect::new(0.0, 0.0, 100.0, 100.0);
        let resized = resize_anchored(
            &original,
            Handle::BottomRight,
            Point::new(150.0, 150.0),
            true,
            20.0,
        );
        assert!((resized.width - 150.0).abs() < EPS);
        assert!((resized.height - 150.0).abs() < EPS);
        assert_eq!(resized.origin(), Point::ZERO);

        let natural = rescale_natural(&original, Size::new(100.0, 100.0), &resized);
        assert!((natural.width - 150.0).abs() < EPS);
        assert!((natural.height - 150.0).abs() < EPS);
    }

    #[test]
    fn test_aspect_lock_holds_for_any_pointer() {
        let original = Rect::new(10.0, 20.0, 160.0, 90.0);
        let aspect = original.width / original.height;
        for handle in Handle::CORNERS {
            for (px, py) in [(-500.0, 3.0), (400.0, 900.0), (95.0, 60.0), (0.0, 0.0)] {
                let r = resize_anchored(&original, handle, Point::new(px, py), true, 20.0);
                assert!((r.width / r.height - aspect).abs() < EPS, "{handle:?} {px},{py}");
                assert!(r.width >= 20.0 && r.height >= 20.0);
            }
        }
    }

    #[test]
    fn test_anchored_resize_keeps_opposite_corner() {
        let original = Rect::new(0.0, 0.0, 100.0, 50.0);
        let r = resize_anchored(&original, Handle::TopLeft, Point::new(-20.0, -10.0), false, 20.0);
        assert!((r.right() - 100.0).abs() < EPS);
        assert!((r.bottom() - 50.0).abs() < EPS);
        assert!((r.width - 120.0).abs() < EPS);
        assert!((r.height - 60.0).abs() < EPS);
    }

    #[test]
    fn test_crossing_anchor_clamps_to_minimum() {
        let original = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r = resize_anchored(&original, Handle::BottomRight, Point::new(-50.0, -80.0), false, 20.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_centered_side_resize_is_symmetric() {
        let original = Rect::new(0.0, 0.0, 100.0, 60.0);
        let r = resize_centered(&original, Handle::Right, Point::new(80.0, 999.0), false, 20.0);
        assert!((r.width - 60.0).abs() < EPS);
        assert!((r.center().x - 50.0).abs() < EPS);
        assert_eq!(r.height, 60.0);
        assert_eq!(r.y, 0.0);
    }

    #[test]
    fn test_centered_corner_with_lock_keeps_center_and_aspect() {
        let original = Rect::new(0.0, 0.0, 200.0, 100.0);
        let r = resize_centered(&original, Handle::TopLeft, Point::new(-50.0, 40.0), true, 20.0);
        assert!((r.center().x - 100.0).abs() < EPS);
        assert!((r.center().y - 50.0).abs() < EPS);
        assert!((r.width / r.height - 2.0).abs() < EPS);
        assert!((r.width - 300.0).abs() < EPS);
    }

    #[test]
    fn test_centered_corner_without_lock_is_anchored() {
        let original = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r = resize_centered(&original, Handle::BottomRight, Point::new(130.0, 70.0), false, 20.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 130.0, 70.0));
    }

    #[test]
    fn test_reduce_ratio() {
        assert_eq!(reduce_ratio(1920.0, 1080.0), (16, 9));
        assert_eq!(reduce_ratio(200.4, 99.6), (2, 1));
        assert_eq!(reduce_ratio(0.0, 0.0), (1, 1));
    }

    #[test]
    fn test_enclose_with_ratio() {
        let r = enclose_with_ratio(Point::new(50.0, 50.0), Size::new(100.0, 100.0), 2, 1);
        assert!((r.width - 200.0).abs() < EPS);
        assert!((r.height - 100.0).abs() < EPS);
        assert!((r.center().x - 50.0).abs() < EPS);

        let tall = enclose_with_ratio(Point::ZERO, Size::new(100.0, 100.0), 1, 3);
        assert!((tall.height / tall.width - 3.0).abs() < EPS);
        assert!((tall.width - 100.0).abs() < EPS);
    }

    #[test]
    fn test_containment_and_intersection() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_rect(&Rect::new(90.0, 10.0, 20.0, 20.0)));
        assert_eq!(
            outer.intersect(&Rect::new(50.0, 50.0, 100.0, 100.0)),
            Some(Rect::new(50.0, 50.0, 50.0, 50.0))
        );
        assert_eq!(outer.intersect(&Rect::new(200.0, 0.0, 10.0, 10.0)), None);
    }
}
