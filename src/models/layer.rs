// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation and content layers owned by a single item.
//!
//! Layer geometry is expressed in the owning item's natural pixel space, so
//! layers follow the item through moves and resizes and flatten at native
//! resolution. Stroke, region and connector layers keep their path data
//! relative to their own rectangle origin.

use serde::{Deserialize, Serialize};

use super::RasterId;
use crate::util::geometry::{Point, Rect};

/// Unique layer identifier within a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

/// Straight-alpha RGBA color.
pub type Rgba = [u8; 4];

/// Horizontal alignment of text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Type-specific layer payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Raster {
        raster: RasterId,
    },
    Text {
        content: String,
        font_size: f32,
        color: Rgba,
        align: TextAlign,
    },
    /// Freehand brush stroke, points relative to the layer origin.
    Stroke {
        points: Vec<Point>,
        color: Rgba,
        width: f32,
    },
    /// Closed lasso polygon, points relative to the layer origin.
    Region {
        points: Vec<Point>,
        color: Rgba,
    },
    /// Arrow from `start` to `end`, relative to the layer origin.
    Connector {
        start: Point,
        end: Point,
        color: Rgba,
        width: f32,
    },
}

/// A drawable element inside an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub rect: Rect,
    pub kind: LayerKind,
}

/// Rough text box estimate used for hit-testing and resize handles.
fn text_extent(content: &str, font_size: f32) -> (f32, f32) {
    let lines = content.lines().count().max(1);
    let longest = content
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .max(1);
    (
        (longest as f32 * font_size * 0.6).max(font_size),
        lines as f32 * font_size * 1.4,
    )
}

impl Layer {
    pub fn raster(id: LayerId, rect: Rect, raster: RasterId) -> Self {
        Self {
            id,
            rect,
            kind: LayerKind::Raster { raster },
        }
    }

    pub fn text(
        id: LayerId,
        origin: Point,
        content: String,
        font_size: f32,
        color: Rgba,
        align: TextAlign,
    ) -> Self {
        let (width, height) = text_extent(&content, font_size);
        Self {
            id,
            rect: Rect::new(origin.x, origin.y, width, height),
            kind: LayerKind::Text {
                content,
                font_size,
                color,
                align,
            },
        }
    }

    /// Brush stroke from absolute item-pixel points. `None` for an empty path.
    pub fn stroke(id: LayerId, points: &[Point], color: Rgba, width: f32) -> Option<Self> {
        let rect = Rect::bounding(points)?;
        Some(Self {
            id,
            rect,
            kind: LayerKind::Stroke {
                points: points.iter().map(|&p| p - rect.origin()).collect(),
                color,
                width,
            },
        })
    }

    /// Lasso region from absolute item-pixel points. `None` for an empty path.
    pub fn region(id: LayerId, points: &[Point], color: Rgba) -> Option<Self> {
        let rect = Rect::bounding(points)?;
        Some(Self {
            id,
            rect,
            kind: LayerKind::Region {
                points: points.iter().map(|&p| p - rect.origin()).collect(),
                color,
            },
        })
    }

    pub fn connector(id: LayerId, start: Point, end: Point, color: Rgba, width: f32) -> Self {
        let rect = Rect::from_points(start, end);
        Self {
            id,
            rect,
            kind: LayerKind::Connector {
                start: start - rect.origin(),
                end: end - rect.origin(),
                color,
                width,
            },
        }
    }

    /// Only raster and text layers can be resized; paths move by drag only.
    pub fn supports_resize(&self) -> bool {
        match self.kind {
            LayerKind::Raster { .. } | LayerKind::Text { .. } => true,
            LayerKind::Stroke { .. } | LayerKind::Region { .. } | LayerKind::Connector { .. } => {
                false
            }
        }
    }

    /// Annotation layers are removed by "clear annotations"; raster layers stay.
    pub fn is_annotation(&self) -> bool {
        match self.kind {
            LayerKind::Raster { .. } => false,
            LayerKind::Text { .. }
            | LayerKind::Stroke { .. }
            | LayerKind::Region { .. }
            | LayerKind::Connector { .. } => true,
        }
    }

    pub fn raster_id(&self) -> Option<RasterId> {
        match self.kind {
            LayerKind::Raster { raster } => Some(raster),
            _ => None,
        }
    }

    pub fn translate(&mut self, delta: Point) {
        self.rect = self.rect.translate(delta);
    }

    /// Apply a resized rectangle. Text scales its font with the box height.
    pub fn resize_to(&mut self, rect: Rect) {
        match &mut self.kind {
            LayerKind::Raster { .. } => self.rect = rect,
            LayerKind::Text { font_size, .. } => {
                if self.rect.height > 0.0 {
                    *font_size *= rect.height / self.rect.height;
                }
                self.rect = rect;
            }
            LayerKind::Stroke { .. } | LayerKind::Region { .. } | LayerKind::Connector { .. } => {
                log::debug!("ignoring resize of path layer {:?}", self.id);
            }
        }
    }

    /// Scale geometry about the item origin, e.g. when the owning item's
    /// pixel size changes. Path data, fonts and line widths follow.
    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.rect = Rect::new(
            self.rect.x * sx,
            self.rect.y * sy,
            self.rect.width * sx,
            self.rect.height * sy,
        );
        let mean = (sx + sy) * 0.5;
        match &mut self.kind {
            LayerKind::Raster { .. } => {}
            LayerKind::Text { font_size, .. } => *font_size *= sy,
            LayerKind::Stroke { points, width, .. } => {
                points.iter_mut().for_each(|p| *p = Point::new(p.x * sx, p.y * sy));
                *width *= mean;
            }
            LayerKind::Region { points, .. } => {
                points.iter_mut().for_each(|p| *p = Point::new(p.x * sx, p.y * sy));
            }
            LayerKind::Connector {
                start, end, width, ..
            } => {
                *start = Point::new(start.x * sx, start.y * sy);
                *end = Point::new(end.x * sx, end.y * sy);
                *width *= mean;
            }
        }
    }

    /// Replace text content and refit the box, keeping the font size.
    pub fn set_text(&mut self, text: &str) -> bool {
        let LayerKind::Text {
            content, font_size, ..
        } = &mut self.kind
        else {
            return false;
        };
        if content == text {
            return false;
        }
        *content = text.to_owned();
        let (width, height) = text_extent(content, *font_size);
        self.rect.width = width;
        self.rect.height = height;
        true
    }

    /// Path points in item-pixel space (empty for raster and text layers).
    pub fn path_points(&self) -> Vec<Point> {
        let origin = self.rect.origin();
        match &self.kind {
            LayerKind::Stroke { points, .. } | LayerKind::Region { points, .. } => {
                points.iter().map(|&p| p + origin).collect()
            }
            LayerKind::Connector { start, end, .. } => vec![*start + origin, *end + origin],
            LayerKind::Raster { .. } | LayerKind::Text { .. } => Vec::new(),
        }
    }

    /// Hit test in item-pixel space with a tolerance in the same units.
    pub fn contains(&self, point: Point, tolerance: f32) -> bool {
        match &self.kind {
            LayerKind::Raster { .. } | LayerKind::Text { .. } => {
                self.rect.expand(tolerance).contains(point)
            }
            LayerKind::Stroke { width, .. } => {
                let reach = tolerance + width * 0.5;
                self.path_points()
                    .windows(2)
                    .any(|seg| distance_to_segment(point, seg[0], seg[1]) <= reach)
            }
            LayerKind::Connector { width, .. } => {
                let pts = self.path_points();
                distance_to_segment(point, pts[0], pts[1]) <= tolerance + width * 0.5
            }
            LayerKind::Region { .. } => point_in_polygon(point, &self.path_points()),
        }
    }
}

fn distance_to_segment(point: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_len_sq = ab.x * ab.x + ab.y * ab.y;
    if ab_len_sq <= f32::EPSILON {
        return ap.length();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).length()
}

/// Even-odd ray casting.
fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
