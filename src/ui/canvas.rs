// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Workspace canvas: event translation and painting.
//!
//! Raw egui events are translated into engine input in canvas-local screen
//! coordinates, then the scene is painted from the workspace's read-only
//! state. Items are painted in scene order; handles, the frame overlay and
//! the marquee go on top in a final pass.

use std::collections::{BTreeMap, HashMap};

use crate::engine::input::{CursorHint, Key, Modifiers, PointerButton, Tool};
use crate::engine::{GestureKind, RasterState, RasterStore, Workspace};
use crate::models::item::Item;
use crate::models::layer::{Layer, LayerKind, Rgba, TextAlign};
use crate::models::RasterId;
use crate::util::geometry::{handle_positions, Point, Rect};

const HANDLE_SIZE: f32 = 8.0;
const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(66, 133, 244);
const ANNOTATION_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 160, 40);
const FRAME_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 220, 120);

/// Canvas state that lives outside the engine: GPU textures and touches.
#[derive(Default)]
pub struct CanvasView {
    textures: HashMap<RasterId, egui::TextureHandle>,
    /// Active touch points keyed by the raw touch id
    touches: BTreeMap<u64, Point>,
}

/// Screen mapping for one frame: viewport transform plus canvas origin.
struct Mapper<'a> {
    workspace: &'a Workspace,
    origin: egui::Pos2,
}

impl Mapper<'_> {
    fn pos(&self, world: Point) -> egui::Pos2 {
        let screen = self.workspace.viewport().world_to_screen(world);
        self.origin + egui::vec2(screen.x, screen.y)
    }

    fn rect(&self, world: &Rect) -> egui::Rect {
        let screen = self.workspace.viewport().world_rect_to_screen(world);
        egui::Rect::from(screen).translate(self.origin.to_vec2())
    }

    fn len(&self, world: f32) -> f32 {
        world * self.workspace.viewport().scale
    }
}

fn color(rgba: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn cursor_icon(hint: CursorHint) -> egui::CursorIcon {
    match hint {
        CursorHint::Default => egui::CursorIcon::Default,
        CursorHint::Grab => egui::CursorIcon::Grab,
        CursorHint::Grabbing => egui::CursorIcon::Grabbing,
        CursorHint::Move => egui::CursorIcon::Move,
        CursorHint::PointingHand => egui::CursorIcon::PointingHand,
        CursorHint::Crosshair => egui::CursorIcon::Crosshair,
        CursorHint::Text => egui::CursorIcon::Text,
        CursorHint::ResizeNwSe => egui::CursorIcon::ResizeNwSe,
        CursorHint::ResizeNeSw => egui::CursorIcon::ResizeNeSw,
        CursorHint::ResizeHorizontal => egui::CursorIcon::ResizeHorizontal,
        CursorHint::ResizeVertical => egui::CursorIcon::ResizeVertical,
    }
}

fn modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: m.shift,
        command: m.command,
        alt: m.alt,
    }
}

impl CanvasView {
    /// Display the canvas, feed it input and paint the workspace.
    pub fn show(&mut self, ui: &mut egui::Ui, workspace: &mut Workspace) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        workspace.set_viewport_size(Point::new(rect.width(), rect.height()));

        self.handle_input(ui.ctx(), rect, workspace);

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

        if workspace.items().is_empty() {
            paint_welcome(&painter, rect);
        } else {
            self.paint_scene(ui, &painter, rect, workspace);
        }

        if response.hovered() || workspace.gesture_kind() != GestureKind::None {
            ui.ctx().set_cursor_icon(cursor_icon(workspace.cursor()));
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context, rect: egui::Rect, workspace: &mut Workspace) {
        let events = ctx.input(|i| i.events.clone());
        let keyboard_free = !ctx.wants_keyboard_input();
        let local = |pos: egui::Pos2| Point::new(pos.x - rect.min.x, pos.y - rect.min.y);

        for event in events {
            match event {
                egui::Event::PointerMoved(pos) => {
                    if rect.contains(pos) || workspace.gesture_kind() != GestureKind::None {
                        workspace.pointer_move(local(pos), modifiers(ctx.input(|i| i.modifiers)));
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    modifiers: m,
                } => {
                    let button = match button {
                        egui::PointerButton::Primary => PointerButton::Primary,
                        egui::PointerButton::Secondary => PointerButton::Secondary,
                        egui::PointerButton::Middle => PointerButton::Middle,
                        _ => continue,
                    };
                    if pressed {
                        if rect.contains(pos) {
                            workspace.pointer_down(local(pos), button, modifiers(m));
                        }
                    } else {
                        workspace.pointer_up(local(pos), modifiers(m));
                    }
                }
                egui::Event::MouseWheel {
                    unit,
                    delta,
                    modifiers: m,
                } => {
                    let Some(pos) = ctx.input(|i| i.pointer.hover_pos()) else {
                        continue;
                    };
                    if !rect.contains(pos) {
                        continue;
                    }
                    let delta = match unit {
                        egui::MouseWheelUnit::Point => delta,
                        egui::MouseWheelUnit::Line => delta * 40.0,
                        egui::MouseWheelUnit::Page => delta * rect.height(),
                    };
                    workspace.wheel(local(pos), Point::new(delta.x, delta.y), modifiers(m));
                }
                // Trackpad pinch; ctrl+wheel already arrives as MouseWheel
                egui::Event::Zoom(factor) if !ctx.input(|i| i.modifiers.command) => {
                    if let Some(pos) = ctx.input(|i| i.pointer.hover_pos()).filter(|p| rect.contains(*p)) {
                        workspace.zoom_at(local(pos), factor);
                    }
                }
                egui::Event::Touch { id, phase, pos, .. } => {
                    self.handle_touch(id, phase, local(pos), workspace);
                }
                egui::Event::Key { key, pressed, .. } if keyboard_free => {
                    let key = match key {
                        egui::Key::Escape => Key::Escape,
                        egui::Key::Space => Key::Space,
                        egui::Key::Delete | egui::Key::Backspace => Key::Delete,
                        _ => continue,
                    };
                    if pressed {
                        workspace.key_down(key);
                    } else {
                        workspace.key_up(key);
                    }
                }
                egui::Event::WindowFocused(false) => workspace.key_up(Key::Space),
                _ => {}
            }
        }
    }

    /// Two simultaneous touches drive a pinch; anything else ends it.
    fn handle_touch(
        &mut self,
        id: egui::TouchId,
        phase: egui::TouchPhase,
        pos: Point,
        workspace: &mut Workspace,
    ) {
        let was_pinching = self.touches.len() == 2;
        match phase {
            egui::TouchPhase::Start | egui::TouchPhase::Move => {
                self.touches.insert(id.0, pos);
            }
            egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                self.touches.remove(&id.0);
            }
        }

        let mut points = self.touches.values().copied();
        match (self.touches.len(), points.next(), points.next()) {
            (2, Some(a), Some(b)) if was_pinching => workspace.pinch_update(a, b),
            (2, Some(a), Some(b)) => workspace.pinch_begin(a, b),
            _ if was_pinching => workspace.pinch_end(),
            _ => {}
        }
    }

    /// GPU texture for a raster, uploading it on first use.
    fn texture(
        &mut self,
        ctx: &egui::Context,
        store: &RasterStore,
        id: RasterId,
    ) -> Option<egui::TextureId> {
        if let Some(handle) = self.textures.get(&id) {
            return Some(handle.id());
        }
        let image = store.image(id)?;
        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        let handle = ctx.load_texture(
            format!("raster-{}", id.0),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        let texture_id = handle.id();
        self.textures.insert(id, handle);
        Some(texture_id)
    }

    fn paint_scene(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        rect: egui::Rect,
        workspace: &Workspace,
    ) {
        let store = workspace.rasters();
        self.textures.retain(|id, _| store.contains(*id));

        let map = Mapper {
            workspace,
            origin: rect.min,
        };
        let frame_item = workspace.frame_editor().map(|editor| editor.item_id());
        let annotated = workspace.annotation().map(|session| session.item);

        for (index, item) in workspace.items().iter().enumerate() {
            if Some(item.id) == frame_item {
                continue;
            }
            self.paint_item(ui, painter, &map, item, workspace);
            self.paint_layers(ui.ctx(), painter, &map, item, store);

            let screen = map.rect(&item.rect);
            if Some(item.id) == annotated {
                painter.rect_stroke(screen, 0.0, egui::Stroke::new(2.0, ANNOTATION_COLOR));
                self.paint_active_layer(painter, &map, item, workspace);
            } else if workspace.selection().contains(item.id) {
                painter.rect_stroke(screen, 0.0, egui::Stroke::new(2.0, SELECTION_COLOR));
            }
            paint_badge(painter, screen, index + 1);
        }

        self.paint_frame_editor(ui, painter, &map, workspace);
        paint_sketch(painter, &map, workspace);

        if workspace.frame_editor().is_none() && workspace.annotation().is_none() {
            if let Some(item) = workspace.selection().sole().and_then(|id| workspace.item(id)) {
                paint_handles(painter, &item.rect, &map, false);
            }
        }

        if let Some(marquee) = workspace.marquee_rect() {
            let screen = map.rect(&marquee);
            painter.rect_filled(
                screen,
                0.0,
                egui::Color32::from_rgba_unmultiplied(66, 133, 244, 40),
            );
            painter.rect_stroke(screen, 0.0, egui::Stroke::new(1.0, SELECTION_COLOR));
        }
    }

    /// Rounded raster with a loading overlay until it is ready.
    fn paint_item(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        map: &Mapper,
        item: &Item,
        workspace: &Workspace,
    ) {
        let screen = map.rect(&item.rect);
        let selected = workspace.selection().contains(item.id);
        let target = if selected {
            2.0
        } else {
            map.len(workspace.config().corner_radius)
        };
        let radius = ui.ctx().animate_value_with_time(
            egui::Id::new(("corner-radius", item.id.0)),
            target,
            0.15,
        );

        let store = workspace.rasters();
        match self.texture(ui.ctx(), store, item.raster) {
            Some(texture) => {
                egui::Image::new((texture, screen.size()))
                    .rounding(radius)
                    .paint_at(ui, screen);
            }
            None => {
                painter.rect_filled(screen, radius, egui::Color32::from_gray(60));
            }
        }

        let failed = matches!(store.state(item.raster), Some(RasterState::Failed));
        if item.is_loading || !matches!(store.state(item.raster), Some(RasterState::Ready(_))) {
            painter.rect_filled(
                screen,
                radius,
                egui::Color32::from_rgba_unmultiplied(0, 0, 0, 110),
            );
            if failed && !item.is_loading {
                painter.text(
                    screen.center(),
                    egui::Align2::CENTER_CENTER,
                    "image unavailable",
                    egui::FontId::proportional(14.0),
                    egui::Color32::from_gray(200),
                );
            } else {
                let size = screen.size().min_elem().clamp(8.0, 32.0);
                egui::Spinner::new()
                    .size(size)
                    .paint_at(ui, egui::Rect::from_center_size(screen.center(), egui::vec2(size, size)));
            }
        }
    }

    /// Layer stack in item-pixel space mapped through the item's rectangle.
    fn paint_layers(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        map: &Mapper,
        item: &Item,
        store: &RasterStore,
    ) {
        let (_, density_y) = item.density();
        let to_screen = |local: Point| map.pos(item.to_world(local));
        let pixel_len = |len: f32| map.len(len / density_y);
        let clipped = painter.with_clip_rect(map.rect(&item.rect).intersect(painter.clip_rect()));

        for layer in &item.layers {
            match &layer.kind {
                LayerKind::Raster { raster } => {
                    let screen = map.rect(&item.local_rect_to_world(&layer.rect));
                    if let Some(texture) = self.texture(ctx, store, *raster) {
                        clipped.image(
                            texture,
                            screen,
                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                            egui::Color32::WHITE,
                        );
                    }
                }
                LayerKind::Text {
                    content,
                    font_size,
                    color: rgba,
                    align,
                } => {
                    let screen = map.rect(&item.local_rect_to_world(&layer.rect));
                    let (anchor, pos) = match align {
                        TextAlign::Left => (egui::Align2::LEFT_TOP, screen.left_top()),
                        TextAlign::Center => (egui::Align2::CENTER_TOP, screen.center_top()),
                        TextAlign::Right => (egui::Align2::RIGHT_TOP, screen.right_top()),
                    };
                    clipped.text(
                        pos,
                        anchor,
                        content,
                        egui::FontId::proportional(pixel_len(*font_size)),
                        color(*rgba),
                    );
                }
                LayerKind::Stroke {
                    color: rgba, width, ..
                } => {
                    let points: Vec<egui::Pos2> =
                        layer.path_points().into_iter().map(to_screen).collect();
                    clipped.add(egui::Shape::line(
                        points,
                        egui::Stroke::new(pixel_len(*width), color(*rgba)),
                    ));
                }
                LayerKind::Region { color: rgba, .. } => {
                    let points: Vec<egui::Pos2> =
                        layer.path_points().into_iter().map(to_screen).collect();
                    let [r, g, b, a] = *rgba;
                    clipped.add(egui::Shape::convex_polygon(
                        points.clone(),
                        egui::Color32::from_rgba_unmultiplied(r, g, b, a / 3),
                        egui::Stroke::NONE,
                    ));
                    clipped.add(egui::Shape::closed_line(
                        points,
                        egui::Stroke::new(1.5, color(*rgba)),
                    ));
                }
                LayerKind::Connector {
                    color: rgba, width, ..
                } => {
                    let points = layer.path_points();
                    let (start, end) = (to_screen(points[0]), to_screen(points[1]));
                    clipped.arrow(
                        start,
                        end - start,
                        egui::Stroke::new(pixel_len(*width), color(*rgba)),
                    );
                }
            }
        }
    }

    fn paint_active_layer(
        &self,
        painter: &egui::Painter,
        map: &Mapper,
        item: &Item,
        workspace: &Workspace,
    ) {
        let Some(layer) = workspace.active_layer().and_then(|id| item.layer(id)) else {
            return;
        };
        let world = item.local_rect_to_world(&layer_bounds(layer));
        let screen = map.rect(&world);
        painter.rect_stroke(
            screen.expand(2.0),
            0.0,
            egui::Stroke::new(1.0, ANNOTATION_COLOR),
        );
        if layer.supports_resize() {
            paint_handles(painter, &world, map, false);
        }
    }

    /// Frame editor: fill preview, the image at its panned position, the
    /// frame outline and all eight handles.
    fn paint_frame_editor(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        map: &Mapper,
        workspace: &Workspace,
    ) {
        let Some(editor) = workspace.frame_editor() else {
            return;
        };
        let frame = map.rect(&editor.frame.rect);
        let original = map.rect(&editor.original.rect);

        let fill = if editor.fill {
            color(workspace.config().frame_fill)
        } else {
            egui::Color32::from_gray(70)
        };
        painter.rect_filled(frame, 0.0, fill);

        if let Some(texture) = self.texture(ui.ctx(), workspace.rasters(), editor.before().raster) {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(
                texture,
                original,
                uv,
                egui::Color32::from_white_alpha(90),
            );
            painter
                .with_clip_rect(frame.intersect(painter.clip_rect()))
                .image(texture, original, uv, egui::Color32::WHITE);
        }

        painter.rect_stroke(frame, 0.0, egui::Stroke::new(2.0, FRAME_COLOR));
        painter.rect_stroke(
            original,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::from_white_alpha(120)),
        );
        let (w, h) = editor.ratio;
        let (pw, ph) = editor.pixel_size();
        painter.text(
            frame.left_bottom() + egui::vec2(0.0, 4.0),
            egui::Align2::LEFT_TOP,
            format!("{}:{}  {}x{}", w, h, pw, ph),
            egui::FontId::monospace(12.0),
            FRAME_COLOR,
        );
        paint_handles(painter, &editor.frame.rect, map, true);
    }
}

/// Bounding box of a layer in item pixels, including stroke width.
fn layer_bounds(layer: &Layer) -> Rect {
    match &layer.kind {
        LayerKind::Stroke { width, .. } | LayerKind::Connector { width, .. } => {
            layer.rect.expand(width * 0.5)
        }
        _ => layer.rect,
    }
}

fn paint_handles(painter: &egui::Painter, world: &Rect, map: &Mapper, include_sides: bool) {
    for (_, position) in handle_positions(world, include_sides) {
        let handle = egui::Rect::from_center_size(
            map.pos(position),
            egui::vec2(HANDLE_SIZE, HANDLE_SIZE),
        );
        painter.rect_filled(handle, 1.0, egui::Color32::WHITE);
        painter.rect_stroke(handle, 1.0, egui::Stroke::new(1.0, SELECTION_COLOR));
    }
}

/// Small index tag in the item's top-left corner.
fn paint_badge(painter: &egui::Painter, screen: egui::Rect, index: usize) {
    let center = screen.left_top() + egui::vec2(12.0, 12.0);
    painter.circle_filled(center, 9.0, egui::Color32::from_black_alpha(160));
    painter.text(
        center,
        egui::Align2::CENTER_CENTER,
        index.to_string(),
        egui::FontId::proportional(11.0),
        egui::Color32::WHITE,
    );
}

fn paint_sketch(painter: &egui::Painter, map: &Mapper, workspace: &Workspace) {
    let Some((tool, points)) = workspace.sketch_preview() else {
        return;
    };
    let brush = workspace.brush();
    let stroke = egui::Stroke::new(2.0, color(brush.color));
    let points: Vec<egui::Pos2> = points.into_iter().map(|p| map.pos(p)).collect();
    match (tool, points.as_slice()) {
        (Tool::Arrow, [start, .., end]) => painter.arrow(*start, *end - *start, stroke),
        (Tool::Lasso, pts) if pts.len() > 2 => {
            painter.add(egui::Shape::closed_line(points.clone(), stroke));
        }
        (_, pts) if pts.len() > 1 => {
            painter.add(egui::Shape::line(points.clone(), stroke));
        }
        _ => {}
    }
}

fn paint_welcome(painter: &egui::Painter, rect: egui::Rect) {
    let center = rect.center();
    painter.text(
        center - egui::vec2(0.0, 30.0),
        egui::Align2::CENTER_CENTER,
        "EASEL",
        egui::FontId::proportional(32.0),
        egui::Color32::from_gray(200),
    );
    painter.text(
        center + egui::vec2(0.0, 10.0),
        egui::Align2::CENTER_CENTER,
        "Drop images here or use File → Add Image...",
        egui::FontId::proportional(14.0),
        egui::Color32::from_gray(150),
    );
}
