// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster composition.
//!
//! Flattening paints an item's layer stack over its base raster at natural
//! resolution. Frame composition places the base raster inside a new canvas
//! sized to the frame, optionally filling the uncovered area.

use ab_glyph::{FontArc, PxScale};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::sync::OnceLock;
use tiny_skia::{
    ColorU8, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use super::raster::RasterStore;
use crate::models::item::Item;
use crate::models::layer::{Layer, LayerKind, TextAlign};
use crate::util::geometry::{Point, Rect};

/// Line height relative to font size, matching the layer box estimate.
const LINE_HEIGHT: f32 = 1.4;

/// Resample `image` to `width`x`height` unless it already has that size.
fn fit_to(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, width.max(1), height.max(1), imageops::FilterType::Triangle)
    }
}

/// Draw `image` scaled into `rect` (pixel space of `canvas`), clipped.
fn overlay_into(canvas: &mut RgbaImage, image: &RgbaImage, rect: &Rect) {
    let width = rect.width.round().max(1.0) as u32;
    let height = rect.height.round().max(1.0) as u32;
    let scaled = fit_to(image, width, height);
    imageops::overlay(
        canvas,
        &scaled,
        rect.x.round() as i64,
        rect.y.round() as i64,
    );
}

/// Compose an image into a new canvas of `size` pixels at `placement`.
///
/// Only the overlap with the canvas survives; the rest of the canvas is
/// `fill` or transparent.
pub fn compose_frame(
    source: &RgbaImage,
    size: (u32, u32),
    placement: &Rect,
    fill: Option<[u8; 4]>,
) -> RgbaImage {
    let background = Rgba(fill.unwrap_or([0, 0, 0, 0]));
    let mut canvas = RgbaImage::from_pixel(size.0.max(1), size.1.max(1), background);
    overlay_into(&mut canvas, source, placement);
    canvas
}

/// Flatten an item with its layers at natural resolution.
///
/// `None` while the base raster is not decoded (or failed to decode).
/// Raster layers that are not decoded yet are skipped.
pub fn flatten(item: &Item, store: &RasterStore) -> Option<RgbaImage> {
    let base = store.image(item.raster)?;
    let (width, height) = item.natural.pixels();
    let mut surface = Surface::Image(fit_to(base, width, height));

    for layer in &item.layers {
        match &layer.kind {
            LayerKind::Raster { raster } => match store.image(*raster) {
                Some(image) => overlay_into(surface.image(), image, &layer.rect),
                None => log::warn!("skipping undecoded raster layer {:?}", layer.id),
            },
            LayerKind::Text { .. } => draw_text_layer(surface.image(), layer),
            LayerKind::Stroke { .. } | LayerKind::Region { .. } | LayerKind::Connector { .. } => {
                match surface.pixmap() {
                    Some(pixmap) => draw_path_layer(pixmap, layer),
                    None => log::error!("cannot allocate pixmap for {}x{}", width, height),
                }
            }
        }
    }

    Some(surface.into_image())
}

/// Working surface that converts lazily between straight-alpha image
/// buffers and premultiplied pixmaps, so runs of path layers share one
/// conversion.
enum Surface {
    Image(RgbaImage),
    Pixmap(Pixmap),
}

impl Surface {
    fn image(&mut self) -> &mut RgbaImage {
        if let Surface::Pixmap(pixmap) = self {
            *self = Surface::Image(pixmap_to_image(pixmap));
        }
        match self {
            Surface::Image(image) => image,
            Surface::Pixmap(_) => unreachable!("surface converted above"),
        }
    }

    fn pixmap(&mut self) -> Option<&mut Pixmap> {
        if let Surface::Image(image) = self {
            *self = Surface::Pixmap(image_to_pixmap(image)?);
        }
        match self {
            Surface::Pixmap(pixmap) => Some(pixmap),
            Surface::Image(_) => None,
        }
    }

    fn into_image(self) -> RgbaImage {
        match self {
            Surface::Image(image) => image,
            Surface::Pixmap(pixmap) => pixmap_to_image(&pixmap),
        }
    }
}

fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

fn paint_for(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn draw_path_layer(pixmap: &mut Pixmap, layer: &Layer) {
    let points = layer.path_points();
    match &layer.kind {
        LayerKind::Stroke { color, width, .. } => {
            stroke_polyline(pixmap, &points, &paint_for(*color), *width);
        }
        LayerKind::Region { color, .. } => {
            let mut pb = PathBuilder::new();
            let Some((first, rest)) = points.split_first() else {
                return;
            };
            pb.move_to(first.x, first.y);
            for p in rest {
                pb.line_to(p.x, p.y);
            }
            pb.close();
            if let Some(path) = pb.finish() {
                pixmap.fill_path(
                    &path,
                    &paint_for(*color),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
        LayerKind::Connector { color, width, .. } => {
            let paint = paint_for(*color);
            stroke_polyline(pixmap, &points, &paint, *width);
            fill_arrow_head(pixmap, points[0], points[1], &paint, *width);
        }
        LayerKind::Raster { .. } | LayerKind::Text { .. } => {}
    }
}

fn stroke_polyline(pixmap: &mut Pixmap, points: &[Point], paint: &Paint, width: f32) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    let mut pb = PathBuilder::new();
    if rest.is_empty() {
        pb.push_circle(first.x, first.y, (width * 0.5).max(0.5));
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
}

fn fill_arrow_head(pixmap: &mut Pixmap, from: Point, to: Point, paint: &Paint, width: f32) {
    let direction = to - from;
    let length = direction.length().max(1.0);
    let unit = direction / length;
    let normal = Point::new(-unit.y, unit.x);
    let head_len = (width * 4.0).max(10.0);
    let head_half = head_len * 0.6;

    let base = to - unit * head_len;
    let left = base + normal * head_half;
    let right = base - normal * head_half;

    let mut pb = PathBuilder::new();
    pb.move_to(to.x, to.y);
    pb.line_to(left.x, left.y);
    pb.line_to(right.x, right.y);
    pb.close();
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Bundled UI font, parsed once.
fn text_font() -> Option<&'static FontArc> {
    static FONT: OnceLock<Option<FontArc>> = OnceLock::new();
    FONT.get_or_init(|| {
        let definitions = egui::FontDefinitions::default();
        let data = definitions.font_data.get("Ubuntu-Light")?;
        match FontArc::try_from_vec(data.font.to_vec()) {
            Ok(font) => Some(font),
            Err(e) => {
                log::error!("cannot parse text layer font: {}", e);
                None
            }
        }
    })
    .as_ref()
}

fn draw_text_layer(image: &mut RgbaImage, layer: &Layer) {
    let LayerKind::Text {
        content,
        font_size,
        color,
        align,
    } = &layer.kind
    else {
        return;
    };
    let Some(font) = text_font() else {
        return;
    };
    let scale = PxScale::from(*font_size);
    for (row, line) in content.lines().enumerate() {
        let (line_width, _) = text_size(scale, font, line);
        let slack = (layer.rect.width - line_width as f32).max(0.0);
        let x = match align {
            TextAlign::Left => layer.rect.x,
            TextAlign::Center => layer.rect.x + slack * 0.5,
            TextAlign::Right => layer.rect.x + slack,
        };
        let y = layer.rect.y + row as f32 * font_size * LINE_HEIGHT;
        draw_text_mut(
            image,
            Rgba(*color),
            x.round() as i32,
            y.round() as i32,
            scale,
            font,
            line,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::ItemId;
    use crate::models::layer::LayerId;
    use crate::util::geometry::Size;
    use std::sync::Arc;

    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[test]
    fn test_frame_composition_fills_uncovered_area() {
        let source = RgbaImage::from_pixel(100, 100, Rgba(BLUE));
        let out = compose_frame(
            &source,
            (200, 100),
            &Rect::new(50.0, 0.0, 100.0, 100.0),
            Some([255, 255, 255, 255]),
        );
        assert_eq!(out.dimensions(), (200, 100));
        assert_eq!(out.get_pixel(10, 50), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(100, 50), &Rgba(BLUE));
        assert_eq!(out.get_pixel(190, 50), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_frame_composition_crops_to_overlap() {
        let source = RgbaImage::from_pixel(100, 100, Rgba(BLUE));
        let out = compose_frame(&source, (50, 50), &Rect::new(-25.0, -25.0, 100.0, 100.0), None);
        assert_eq!(out.dimensions(), (50, 50));
        assert!(out.pixels().all(|p| p == &Rgba(BLUE)));

        let transparent =
            compose_frame(&source, (50, 50), &Rect::new(40.0, 0.0, 100.0, 100.0), None);
        assert_eq!(transparent.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_flatten_requires_decoded_base() {
        let store = RasterStore::new();
        let item = Item::new(
            ItemId(1),
            crate::models::RasterId(99),
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Size::new(10.0, 10.0),
        );
        assert!(flatten(&item, &store).is_none());
    }

    #[test]
    fn test_flatten_draws_layers_at_natural_size() {
        let mut store = RasterStore::new();
        let base = store.insert_decoded(Arc::new(RgbaImage::from_pixel(
            20,
            20,
            Rgba([255, 255, 255, 255]),
        )));
        let mut item = Item::new(
            ItemId(1),
            base,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Size::new(40.0, 40.0),
        );
        let square = [
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(0.0, 20.0),
        ];
        item.layers
            .push(Layer::region(LayerId(1), &square, [255, 0, 0, 255]).expect("region"));

        let flat = flatten(&item, &store).expect("flattened");
        assert_eq!(flat.dimensions(), (40, 40));
        assert_eq!(flat.get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(flat.get_pixel(30, 30), &Rgba([255, 255, 255, 255]));
    }
}
