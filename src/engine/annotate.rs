// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation mode: editing the layer stack of a single item.
//!
//! Layer edits are recorded in the item's own history. The workspace history
//! receives a single snapshot when a session that changed something ends.

use super::hit::handle_at;
use super::input::{
    CursorHint, DragGesture, DragTarget, Gesture, ResizeGesture, ResizeTarget, SketchGesture,
    Tool,
};
use super::raster::RasterSource;
use super::workspace::{AnnotationSession, Workspace};
use crate::models::item::ItemId;
use crate::models::layer::{Layer, LayerId};
use crate::util::geometry::{distance, Point, Rect};

/// Screen-space reach for picking thin layers.
const LAYER_HIT_TOLERANCE_PX: f32 = 4.0;

impl Workspace {
    pub fn enter_annotation(&mut self, id: ItemId) -> bool {
        self.cancel_frame_editor();
        if self.annotation.as_ref().is_some_and(|session| session.item == id) {
            return true;
        }
        self.exit_annotation();

        let Some(item) = self.scene.get(id) else {
            return false;
        };
        if item.is_loading {
            log::warn!("cannot annotate {:?} while it is loading", id);
            return false;
        }
        self.annotation = Some(AnnotationSession {
            item: id,
            active_layer: None,
            changed: false,
        });
        log::info!("annotation mode on {:?}", id);
        self.select([id]);
        self.request_render();
        true
    }

    /// Leave annotation mode, committing one workspace snapshot if the
    /// session changed the item.
    pub fn exit_annotation(&mut self) -> bool {
        if self.annotation.is_none() {
            return false;
        }
        if matches!(
            self.gesture,
            Gesture::Sketch(_)
                | Gesture::Drag(DragGesture {
                    target: DragTarget::Layer { .. },
                    ..
                })
                | Gesture::Resize(ResizeGesture {
                    target: ResizeTarget::Layer { .. },
                    ..
                })
        ) {
            let gesture = std::mem::take(&mut self.gesture);
            self.settle(gesture);
        }
        let Some(session) = self.annotation.take() else {
            return false;
        };
        if session.changed {
            self.commit_if_changed("annotate");
        }
        log::info!("annotation mode off {:?}", session.item);
        self.request_render();
        true
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.annotation.as_ref().and_then(|session| session.active_layer)
    }

    pub fn set_active_layer(&mut self, layer: Option<LayerId>) {
        if let Some(session) = self.annotation.as_mut() {
            if session.active_layer != layer {
                session.active_layer = layer;
                self.request_render();
            }
        }
    }

    /// Record a layer edit in the item's history and mark the session dirty.
    pub(crate) fn commit_layer_edit(&mut self, id: ItemId) {
        let Some(item) = self.scene.get_mut(id) else {
            return;
        };
        if item.layers == item.annotation_history.current().as_slice() {
            return;
        }
        item.commit_layers();
        log::debug!("layer edit on {:?} ({} layers)", id, item.layers.len());
        if let Some(session) = self.annotation.as_mut().filter(|s| s.item == id) {
            session.changed = true;
        }
        self.notify_mutation(true);
    }

    /// Commit a layer change made outside annotation mode: item history and
    /// workspace history both get one entry.
    fn commit_layers_outside_session(&mut self, id: ItemId, reason: &str) {
        if self.annotation.as_ref().is_some_and(|session| session.item == id) {
            self.commit_layer_edit(id);
        } else {
            if let Some(item) = self.scene.get_mut(id) {
                if item.layers != item.annotation_history.current().as_slice() {
                    item.commit_layers();
                }
            }
            self.commit_if_changed(reason);
        }
    }

    /// Pointer-down while annotating. Returns false when the pointer is
    /// outside the annotated item; the session then ends and normal
    /// selection handling takes over.
    pub(crate) fn annotation_pointer_down(&mut self, world: Point) -> bool {
        let Some(session) = self.annotation.clone() else {
            return false;
        };
        let Some(item) = self.scene.get(session.item) else {
            self.annotation = None;
            return false;
        };
        if !item.rect.contains(world) {
            let on_handle = session
                .active_layer
                .and_then(|id| item.layer(id))
                .filter(|layer| layer.supports_resize())
                .and_then(|layer| {
                    handle_at(
                        &item.local_rect_to_world(&layer.rect),
                        world,
                        self.config.handle_margin_px,
                        self.viewport.scale,
                        false,
                    )
                })
                .is_some();
            if !on_handle {
                self.exit_annotation();
                return false;
            }
        }

        let local = item.to_local(world);
        let (density_x, _) = item.density();
        let tolerance = self.viewport.screen_len_to_world(LAYER_HIT_TOLERANCE_PX) * density_x;

        match self.tool {
            Tool::Brush | Tool::Lasso | Tool::Arrow => {
                self.gesture = Gesture::Sketch(SketchGesture {
                    item: session.item,
                    tool: self.tool,
                    points: vec![local],
                });
            }
            Tool::Text => {
                let id = self.scene.next_layer_id();
                let layer = Layer::text(
                    id,
                    local,
                    self.brush.text.clone(),
                    self.brush.font_size,
                    self.brush.color,
                    self.brush.align,
                );
                if let Some(item) = self.scene.get_mut(session.item) {
                    item.layers.push(layer);
                }
                self.set_active_layer(Some(id));
                self.commit_layer_edit(session.item);
            }
            Tool::Select | Tool::Pan => {
                let handle = session
                    .active_layer
                    .and_then(|id| item.layer(id))
                    .filter(|layer| layer.supports_resize())
                    .and_then(|layer| {
                        let handle = handle_at(
                            &item.local_rect_to_world(&layer.rect),
                            world,
                            self.config.handle_margin_px,
                            self.viewport.scale,
                            false,
                        )?;
                        Some((handle, layer.clone()))
                    });

                if let Some((handle, layer)) = handle {
                    self.gesture = Gesture::Resize(ResizeGesture {
                        target: ResizeTarget::Layer {
                            item: session.item,
                            original: layer.clone(),
                        },
                        handle,
                        original: layer.rect,
                    });
                } else if let Some(hit) = item.layer_at(local, tolerance) {
                    let origin = item.layer(hit).map_or(Point::ZERO, |layer| layer.rect.origin());
                    self.set_active_layer(Some(hit));
                    self.gesture = Gesture::Drag(DragGesture {
                        target: DragTarget::Layer {
                            item: session.item,
                            layer: hit,
                            origin,
                        },
                        start_screen: self.viewport.world_to_screen(world),
                        start_world: world,
                        committed: false,
                    });
                } else {
                    self.set_active_layer(None);
                }
            }
        }
        true
    }

    /// Turn a finished sketch into a layer unless it is degenerate.
    pub(crate) fn finish_sketch(&mut self, sketch: SketchGesture) {
        let id = self.scene.next_layer_id();
        let brush = &self.brush;
        let layer = match sketch.tool {
            Tool::Brush if sketch.points.len() >= 2 => {
                Layer::stroke(id, &sketch.points, brush.color, brush.width)
            }
            Tool::Lasso if sketch.points.len() >= 3 => {
                Layer::region(id, &sketch.points, brush.color)
            }
            Tool::Arrow => match sketch.points.as_slice() {
                [start, .., end] => {
                    let min_len = self
                        .scene
                        .get(sketch.item)
                        .map(|item| {
                            self.viewport.screen_len_to_world(self.config.drag_threshold_px)
                                * item.density().0
                        })
                        .unwrap_or(0.0);
                    (distance(*start, *end) >= min_len)
                        .then(|| Layer::connector(id, *start, *end, brush.color, brush.width))
                }
                _ => None,
            },
            _ => None,
        };

        let Some(layer) = layer else {
            log::debug!("discarding degenerate {:?} sketch", sketch.tool);
            self.request_render();
            return;
        };
        let Some(item) = self.scene.get_mut(sketch.item) else {
            return;
        };
        item.layers.push(layer);
        self.set_active_layer(Some(id));
        self.commit_layer_edit(sketch.item);
    }

    /// Points of the sketch in progress, in world space, for live preview.
    pub fn sketch_preview(&self) -> Option<(Tool, Vec<Point>)> {
        let Gesture::Sketch(sketch) = &self.gesture else {
            return None;
        };
        let item = self.scene.get(sketch.item)?;
        Some((
            sketch.tool,
            sketch.points.iter().map(|&p| item.to_world(p)).collect(),
        ))
    }

    pub(crate) fn annotation_cursor(&self, world: Point) -> Option<CursorHint> {
        let session = self.annotation.as_ref()?;
        let item = self.scene.get(session.item)?;

        if let Some(layer) = session
            .active_layer
            .and_then(|id| item.layer(id))
            .filter(|layer| layer.supports_resize())
        {
            let rect = item.local_rect_to_world(&layer.rect);
            if let Some(handle) = handle_at(
                &rect,
                world,
                self.config.handle_margin_px,
                self.viewport.scale,
                false,
            ) {
                return Some(CursorHint::for_handle(handle));
            }
        }
        if !item.rect.contains(world) {
            return Some(CursorHint::Default);
        }
        Some(match self.tool {
            Tool::Brush | Tool::Lasso | Tool::Arrow => CursorHint::Crosshair,
            Tool::Text => CursorHint::Text,
            Tool::Select | Tool::Pan => {
                let (density_x, _) = item.density();
                let tolerance =
                    self.viewport.screen_len_to_world(LAYER_HIT_TOLERANCE_PX) * density_x;
                if item.layer_at(item.to_local(world), tolerance).is_some() {
                    CursorHint::Move
                } else {
                    CursorHint::Default
                }
            }
        })
    }

    pub fn delete_active_layer(&mut self) -> bool {
        let Some(session) = self.annotation.as_mut() else {
            return false;
        };
        let Some(layer_id) = session.active_layer.take() else {
            return false;
        };
        let item_id = session.item;
        let Some(item) = self.scene.get_mut(item_id) else {
            return false;
        };
        let before = item.layers.len();
        item.layers.retain(|layer| layer.id != layer_id);
        if item.layers.len() == before {
            return false;
        }
        self.commit_layer_edit(item_id);
        true
    }

    /// Remove every annotation layer of an item, keeping raster layers.
    pub fn clear_annotations(&mut self, id: ItemId) -> bool {
        let Some(item) = self.scene.get_mut(id) else {
            return false;
        };
        if !item.clear_annotations() {
            return false;
        }
        if let Some(session) = self.annotation.as_mut().filter(|s| s.item == id) {
            session.changed = true;
            if session
                .active_layer
                .is_some_and(|layer| item.layer(layer).is_none())
            {
                session.active_layer = None;
            }
            self.notify_mutation(true);
        } else {
            self.commit("clear annotations");
        }
        true
    }

    /// Place an image as a raster layer, centered in the item and scaled
    /// down to fit its pixel space.
    pub fn add_raster_layer(&mut self, id: ItemId, source: RasterSource) -> Option<LayerId> {
        let natural = self.scene.get(id)?.natural;
        let (width, height) = source.dimensions()?;
        let fit = (natural.width / width as f32)
            .min(natural.height / height as f32)
            .min(1.0);
        let rect = Rect::from_center_size(
            Point::new(natural.width * 0.5, natural.height * 0.5),
            width as f32 * fit,
            height as f32 * fit,
        );

        let raster = self.rasters.insert(source);
        let layer_id = self.scene.next_layer_id();
        self.scene
            .get_mut(id)?
            .layers
            .push(Layer::raster(layer_id, rect, raster));
        self.set_active_layer(Some(layer_id));
        self.commit_layers_outside_session(id, "add raster layer");
        Some(layer_id)
    }

    /// Replace the content of a text layer on the annotated item.
    pub fn set_text(&mut self, layer: LayerId, content: &str) -> bool {
        let Some(item_id) = self.annotation.as_ref().map(|session| session.item) else {
            return false;
        };
        let changed = self
            .scene
            .get_mut(item_id)
            .and_then(|item| item.layer_mut(layer))
            .is_some_and(|layer| layer.set_text(content));
        if changed {
            self.commit_layer_edit(item_id);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::input::{Key, Modifiers, PointerButton};
    use crate::engine::workspace::WorkspaceEvent;
    use crate::models::layer::LayerKind;
    use crate::util::geometry::Handle;
    use image::RgbaImage;
    use std::sync::Arc;

    const EPS: f32 = 1e-3;

    /// Workspace with one 100x100 item (200x200 pixels) at the origin.
    fn workspace() -> (Workspace, ItemId) {
        let mut ws = Workspace::new(EngineConfig {
            placement_max_side: 100.0,
            ..EngineConfig::default()
        });
        let id = ws.add_image(
            RasterSource::Decoded(Arc::new(RgbaImage::new(200, 200))),
            Some(Point::new(50.0, 50.0)),
        );
        (ws, id)
    }

    fn click(ws: &mut Workspace, p: Point) {
        ws.pointer_down(p, PointerButton::Primary, Modifiers::NONE);
        ws.pointer_up(p, Modifiers::NONE);
    }

    fn stroke(ws: &mut Workspace, points: &[Point]) {
        ws.pointer_down(points[0], PointerButton::Primary, Modifiers::NONE);
        for &p in &points[1..] {
            ws.pointer_move(p, Modifiers::NONE);
        }
        ws.pointer_up(points[points.len() - 1], Modifiers::NONE);
    }

    #[test]
    fn test_brush_stroke_lands_in_item_pixels() {
        let (mut ws, id) = workspace();
        assert!(ws.enter_annotation(id));
        ws.set_tool(Tool::Brush);
        stroke(&mut ws, &[Point::new(10.0, 10.0), Point::new(20.0, 10.0), Point::new(30.0, 20.0)]);

        let item = ws.item(id).expect("item");
        assert_eq!(item.layers.len(), 1);
        let points = item.layers[0].path_points();
        assert!((points[0].x - 20.0).abs() < EPS);
        assert!((points[2].y - 40.0).abs() < EPS);
        assert!(item.annotation_history.can_undo());
    }

    #[test]
    fn test_single_point_sketch_is_discarded() {
        let (mut ws, id) = workspace();
        ws.enter_annotation(id);
        ws.set_tool(Tool::Brush);
        click(&mut ws, Point::new(10.0, 10.0));
        ws.set_tool(Tool::Arrow);
        stroke(&mut ws, &[Point::new(10.0, 10.0), Point::new(11.0, 11.0)]);
        assert!(ws.item(id).expect("item").layers.is_empty());
    }

    #[test]
    fn test_undo_routes_to_item_history_while_annotating() {
        let (mut ws, id) = workspace();
        let workspace_depth = ws.history.len();
        ws.enter_annotation(id);
        ws.set_tool(Tool::Arrow);
        stroke(&mut ws, &[Point::new(10.0, 10.0), Point::new(60.0, 60.0)]);
        ws.set_tool(Tool::Text);
        click(&mut ws, Point::new(20.0, 80.0));
        assert_eq!(ws.item(id).expect("item").layers.len(), 2);
        assert_eq!(ws.history.len(), workspace_depth);

        assert!(ws.undo());
        assert_eq!(ws.item(id).expect("item").layers.len(), 1);
        assert!(ws.redo());
        assert_eq!(ws.item(id).expect("item").layers.len(), 2);

        assert!(ws.key_down(Key::Escape));
        assert!(ws.annotation().is_none());
        assert_eq!(ws.history.len(), workspace_depth + 1);

        assert!(ws.undo());
        assert!(ws.item(id).expect("item").layers.is_empty());
    }

    #[test]
    fn test_session_without_changes_adds_no_snapshot() {
        let (mut ws, id) = workspace();
        let depth = ws.history.len();
        ws.enter_annotation(id);
        ws.exit_annotation();
        assert_eq!(ws.history.len(), depth);
    }

    #[test]
    fn test_select_tool_drags_layer() {
        let (mut ws, id) = workspace();
        ws.enter_annotation(id);
        ws.set_tool(Tool::Text);
        ws.brush_mut().font_size = 64.0;
        click(&mut ws, Point::new(10.0, 10.0));
        let layer = ws.active_layer().expect("active layer");

        // Away from the corner handles of the active layer
        ws.set_tool(Tool::Select);
        stroke(&mut ws, &[Point::new(48.0, 32.0), Point::new(58.0, 52.0)]);
        let rect = ws.item(id).and_then(|item| item.layer(layer)).expect("layer").rect;
        assert!((rect.x - 40.0).abs() < EPS);
        assert!((rect.y - 60.0).abs() < EPS);
    }

    #[test]
    fn test_text_layer_resize_scales_font() {
        let (mut ws, id) = workspace();
        ws.enter_annotation(id);
        ws.set_tool(Tool::Text);
        ws.brush_mut().font_size = 20.0;
        click(&mut ws, Point::new(10.0, 10.0));
        let layer_id = ws.active_layer().expect("active layer");
        let rect = ws.item(id).and_then(|item| item.layer(layer_id)).expect("layer").rect;

        ws.set_tool(Tool::Select);
        let item = ws.item(id).expect("item").clone();
        let corner = item
            .local_rect_to_world(&rect)
            .handle_position(Handle::BottomRight);
        let target = corner + Point::new(rect.width * 0.5, rect.height * 0.5) / 2.0;
        stroke(&mut ws, &[corner, target]);

        let layer = ws.item(id).and_then(|item| item.layer(layer_id)).expect("layer");
        assert!((layer.rect.height / rect.height - 1.5).abs() < 1e-2);
        let LayerKind::Text { font_size, .. } = layer.kind else {
            panic!("expected text layer");
        };
        assert!((font_size - 30.0).abs() < 0.1);
    }

    #[test]
    fn test_delete_and_edit_text_layer() {
        let (mut ws, id) = workspace();
        ws.enter_annotation(id);
        ws.set_tool(Tool::Text);
        click(&mut ws, Point::new(10.0, 10.0));
        let layer = ws.active_layer().expect("active layer");

        assert!(ws.set_text(layer, "hello"));
        assert!(!ws.set_text(layer, "hello"));
        assert!(ws.key_down(Key::Delete));
        assert!(ws.item(id).expect("item").layers.is_empty());
        assert!(ws.active_layer().is_none());
    }

    #[test]
    fn test_click_outside_item_ends_session_and_selects() {
        let (mut ws, id) = workspace();
        ws.enter_annotation(id);
        ws.drain_events();
        click(&mut ws, Point::new(400.0, 400.0));
        assert!(ws.annotation().is_none());
        assert!(ws.selection().is_empty());
        assert!(ws
            .drain_events()
            .contains(&WorkspaceEvent::SelectionChanged(Vec::new())));
    }

    #[test]
    fn test_clear_and_raster_layers_outside_session() {
        let (mut ws, id) = workspace();
        let layer = ws
            .add_raster_layer(id, RasterSource::Decoded(Arc::new(RgbaImage::new(400, 100))))
            .expect("layer");
        let rect = ws.item(id).and_then(|item| item.layer(layer)).expect("layer").rect;
        assert_eq!(rect, Rect::new(0.0, 75.0, 200.0, 50.0));

        ws.enter_annotation(id);
        ws.set_tool(Tool::Brush);
        stroke(&mut ws, &[Point::new(10.0, 10.0), Point::new(40.0, 40.0)]);
        ws.exit_annotation();
        assert_eq!(ws.item(id).expect("item").layers.len(), 2);

        assert!(ws.clear_annotations(id));
        let item = ws.item(id).expect("item");
        assert_eq!(item.layers.len(), 1);
        assert_eq!(item.layers[0].id, layer);
    }
}
