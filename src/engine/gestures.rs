// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer, wheel, keyboard and pinch handling.
//!
//! Pointer-down picks exactly one gesture by priority: panning first, then
//! the frame editor, then annotation mode, then handle/item/marquee in normal
//! mode. Moves only update the live scene; pointer-up settles the gesture
//! and commits at most one history snapshot.

use super::hit::{handle_at, item_at, items_in_rect};
use super::input::{
    CursorHint, DragGesture, DragTarget, Gesture, Key, Modifiers, PointerButton, ResizeGesture,
    ResizeTarget, Tool,
};
use super::viewport::PinchSample;
use super::workspace::Workspace;
use crate::util::geometry::{distance, rescale_natural, resize_anchored, Point, Rect};

#[cfg(test)]
#[path = "gestures_test.rs"]
mod gestures_test;

impl Workspace {
    fn min_size_world(&self) -> f32 {
        self.viewport.screen_len_to_world(self.config.min_size_px)
    }

    pub fn pointer_down(&mut self, screen: Point, button: PointerButton, modifiers: Modifiers) {
        self.pointer = Some(screen);
        if self.pinch.is_some() {
            return;
        }
        if self.gesture != Gesture::None {
            log::debug!("pointer down during {:?}, settling it first", self.gesture.kind());
            let previous = std::mem::take(&mut self.gesture);
            self.settle(previous);
        }
        let world = self.viewport.screen_to_world(screen);

        if button == PointerButton::Middle || self.space_held || self.tool == Tool::Pan {
            self.gesture = Gesture::Pan {
                last_screen: screen,
            };
            self.cursor = CursorHint::Grabbing;
            self.request_render();
            return;
        }
        if button != PointerButton::Primary {
            return;
        }

        if self.frame.is_some() {
            self.frame_pointer_down(world);
        } else if !(self.annotation.is_some() && self.annotation_pointer_down(world)) {
            self.select_pointer_down(screen, world, modifiers);
        }
        self.cursor = self.hover_cursor(screen);
        self.request_render();
    }

    fn frame_pointer_down(&mut self, world: Point) {
        let Some(editor) = self.frame.as_ref() else {
            return;
        };
        let frame_rect = editor.frame.rect;
        let handle = handle_at(
            &frame_rect,
            world,
            self.config.handle_margin_px,
            self.viewport.scale,
            true,
        );

        self.gesture = if let Some(handle) = handle {
            Gesture::Resize(ResizeGesture {
                target: ResizeTarget::Frame,
                handle,
                original: frame_rect,
            })
        } else if editor.original.rect.contains(world) {
            Gesture::PanImageInFrame { last_world: world }
        } else if frame_rect.contains(world) {
            Gesture::PanFrame { last_world: world }
        } else {
            self.cancel_frame_editor();
            Gesture::None
        };
    }

    fn select_pointer_down(&mut self, screen: Point, world: Point, modifiers: Modifiers) {
        let handle = self.selection.sole().and_then(|id| {
            let item = self.scene.get(id)?;
            let handle = handle_at(
                &item.rect,
                world,
                self.config.handle_margin_px,
                self.viewport.scale,
                false,
            )?;
            Some((id, item.natural, item.rect, handle))
        });

        self.gesture = if let Some((id, natural, rect, handle)) = handle {
            Gesture::Resize(ResizeGesture {
                target: ResizeTarget::Item { id, natural },
                handle,
                original: rect,
            })
        } else if let Some(hit) = item_at(world, self.scene.items()) {
            Gesture::Drag(DragGesture {
                target: DragTarget::Items {
                    hit,
                    origins: Vec::new(),
                },
                start_screen: screen,
                start_world: world,
                committed: false,
            })
        } else {
            Gesture::Marquee {
                start_screen: screen,
                current_screen: screen,
                start_world: world,
                current_world: world,
                additive: modifiers.shift,
            }
        };
    }

    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        self.pointer = Some(screen);
        if self.pinch.is_some() {
            return;
        }
        let world = self.viewport.screen_to_world(screen);
        let mut gesture = std::mem::take(&mut self.gesture);

        match &mut gesture {
            Gesture::None => {}
            Gesture::Pan { last_screen } => {
                self.viewport.pan_by(screen - *last_screen);
                *last_screen = screen;
                self.request_render();
            }
            Gesture::Drag(drag) => self.update_drag(drag, screen, world, modifiers),
            Gesture::Resize(resize) => self.update_resize(resize, world, modifiers),
            Gesture::Marquee {
                current_screen,
                current_world,
                ..
            } => {
                *current_screen = screen;
                *current_world = world;
                self.request_render();
            }
            Gesture::PanImageInFrame { last_world } => {
                if let Some(editor) = self.frame.as_mut() {
                    editor.pan_image(world - *last_world);
                }
                *last_world = world;
                self.request_render();
            }
            Gesture::PanFrame { last_world } => {
                if let Some(editor) = self.frame.as_mut() {
                    editor.pan_frame(world - *last_world);
                }
                *last_world = world;
                self.request_render();
            }
            Gesture::Sketch(sketch) => {
                if let Some(item) = self.scene.get(sketch.item) {
                    let local = item.to_local(world);
                    if sketch.tool == Tool::Arrow {
                        sketch.points.truncate(1);
                        sketch.points.push(local);
                    } else if sketch
                        .points
                        .last()
                        .map_or(true, |&last| distance(last, local) >= 1.0)
                    {
                        sketch.points.push(local);
                    }
                    self.request_render();
                }
            }
        }

        self.gesture = gesture;
        self.cursor = self.hover_cursor(screen);
    }

    fn update_drag(
        &mut self,
        drag: &mut DragGesture,
        screen: Point,
        world: Point,
        modifiers: Modifiers,
    ) {
        if !drag.committed {
            if distance(screen, drag.start_screen) < self.config.drag_threshold_px {
                return;
            }
            self.promote_drag(drag, modifiers);
            drag.committed = true;
        }

        match &drag.target {
            DragTarget::Items { origins, .. } => {
                let delta = world - drag.start_world;
                for &(id, origin) in origins {
                    if let Some(item) = self.scene.get_mut(id) {
                        item.rect.x = origin.x + delta.x;
                        item.rect.y = origin.y + delta.y;
                    }
                }
            }
            DragTarget::Layer {
                item,
                layer,
                origin,
            } => {
                let Some(item) = self.scene.get_mut(*item) else {
                    return;
                };
                let delta = item.to_local(world) - item.to_local(drag.start_world);
                if let Some(layer) = item.layer_mut(*layer) {
                    layer.rect.x = origin.x + delta.x;
                    layer.rect.y = origin.y + delta.y;
                }
            }
        }
        self.notify_mutation(false);
    }

    /// Turn a potential drag into a move: settle the selection and capture
    /// every moving item's starting position.
    fn promote_drag(&mut self, drag: &mut DragGesture, modifiers: Modifiers) {
        let DragTarget::Items { hit, origins } = &mut drag.target else {
            return;
        };
        if !self.selection.contains(*hit) {
            let changed = if modifiers.shift {
                self.selection.extend([*hit])
            } else {
                self.selection.replace([*hit])
            };
            if changed {
                self.notify_selection();
            }
        }
        *origins = self
            .selection
            .ids()
            .iter()
            .filter_map(|&id| self.scene.get(id).map(|item| (id, item.rect.origin())))
            .collect();
        log::debug!("drag started with {} item(s)", origins.len());
    }

    fn update_resize(&mut self, resize: &ResizeGesture, world: Point, modifiers: Modifiers) {
        let min_size = self.min_size_world();
        match &resize.target {
            ResizeTarget::Item { id, natural } => {
                let rect = resize_anchored(
                    &resize.original,
                    resize.handle,
                    world,
                    !modifiers.shift,
                    min_size,
                );
                if let Some(item) = self.scene.get_mut(*id) {
                    item.rect = rect;
                    item.natural = rescale_natural(&resize.original, *natural, &rect);
                }
            }
            ResizeTarget::Layer { item, original } => {
                let Some(item) = self.scene.get_mut(*item) else {
                    return;
                };
                let (density_x, _) = item.density();
                let rect = resize_anchored(
                    &resize.original,
                    resize.handle,
                    item.to_local(world),
                    !modifiers.shift,
                    min_size * density_x,
                );
                let mut resized = original.clone();
                resized.resize_to(rect);
                if let Some(layer) = item.layer_mut(original.id) {
                    *layer = resized;
                }
            }
            ResizeTarget::Frame => {
                if let Some(editor) = self.frame.as_mut() {
                    editor.resize_from(
                        &resize.original,
                        resize.handle,
                        world,
                        modifiers.shift,
                        min_size,
                    );
                }
            }
        }
        self.notify_mutation(false);
    }

    pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) {
        self.pointer = Some(screen);
        let gesture = std::mem::take(&mut self.gesture);

        match gesture {
            Gesture::Drag(DragGesture {
                target: DragTarget::Items { hit, .. },
                committed: false,
                ..
            }) => {
                if modifiers.shift {
                    self.selection.toggle(hit);
                    self.notify_selection();
                } else {
                    self.select([hit]);
                }
            }
            Gesture::Marquee {
                start_screen,
                start_world,
                additive,
                ..
            } => {
                let span = screen - start_screen;
                let threshold = self.config.drag_threshold_px;
                if span.x.abs() < threshold && span.y.abs() < threshold {
                    if !additive {
                        self.clear_selection();
                    }
                } else {
                    let world = self.viewport.screen_to_world(screen);
                    let marquee = Rect::from_points(start_world, world);
                    let hits = items_in_rect(&marquee, self.scene.items());
                    let changed = if additive {
                        self.selection.extend(hits)
                    } else {
                        self.selection.replace(hits)
                    };
                    if changed {
                        self.notify_selection();
                    }
                }
            }
            other => self.settle(other),
        }

        self.cursor = self.hover_cursor(screen);
        self.request_render();
    }

    /// Finish a gesture's mutation without click semantics.
    pub(crate) fn settle(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Drag(DragGesture {
                target: DragTarget::Items { .. },
                committed: true,
                ..
            }) => {
                self.commit_if_changed("move");
            }
            Gesture::Resize(ResizeGesture {
                target: ResizeTarget::Item { .. },
                ..
            }) => {
                self.commit_if_changed("resize");
            }
            Gesture::Drag(DragGesture {
                target: DragTarget::Layer { item, .. },
                committed: true,
                ..
            })
            | Gesture::Resize(ResizeGesture {
                target: ResizeTarget::Layer { item, .. },
                ..
            }) => self.commit_layer_edit(item),
            Gesture::Sketch(sketch) => self.finish_sketch(sketch),
            _ => {}
        }
    }

    /// Wheel: zoom about the pointer with command held, pan otherwise.
    pub fn wheel(&mut self, screen: Point, delta: Point, modifiers: Modifiers) {
        self.pointer = Some(screen);
        if modifiers.command {
            if delta.y == 0.0 {
                return;
            }
            let step = self.config.wheel_zoom_step;
            let factor = if delta.y > 0.0 { step } else { 1.0 / step };
            self.viewport.zoom_at(screen, factor);
        } else {
            self.viewport.pan_by(delta);
        }
        self.request_render();
    }

    /// Zoom about a screen point by an arbitrary factor (trackpad pinch).
    pub fn zoom_at(&mut self, screen: Point, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.viewport.zoom_at(screen, factor);
        self.request_render();
    }

    /// Returns whether the key was consumed.
    pub fn key_down(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => {
                if self.cancel_frame_editor() {
                    true
                } else if self.annotation.is_some() {
                    self.exit_annotation()
                } else {
                    false
                }
            }
            Key::Space => {
                if !self.space_held {
                    self.space_held = true;
                    self.refresh_cursor();
                }
                true
            }
            Key::Delete => {
                if self.annotation.is_some() {
                    self.delete_active_layer()
                } else {
                    self.delete_selected()
                }
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if key == Key::Space && self.space_held {
            self.space_held = false;
            self.refresh_cursor();
        }
    }

    /// Start a two-finger gesture. Any single-pointer gesture is reset.
    pub fn pinch_begin(&mut self, a: Point, b: Point) {
        let previous = std::mem::take(&mut self.gesture);
        if previous != Gesture::None {
            log::debug!("pinch interrupts {:?}", previous.kind());
            self.settle(previous);
        }
        self.pinch = Some(PinchSample::new(a, b));
    }

    pub fn pinch_update(&mut self, a: Point, b: Point) {
        let Some(previous) = self.pinch else {
            self.pinch_begin(a, b);
            return;
        };
        let current = PinchSample::new(a, b);
        self.viewport.pinch(&previous, &current);
        self.pinch = Some(current);
        self.request_render();
    }

    pub fn pinch_end(&mut self) {
        self.pinch = None;
    }

    fn refresh_cursor(&mut self) {
        self.cursor = match self.pointer {
            Some(screen) => self.hover_cursor(screen),
            None if self.space_held => CursorHint::Grab,
            None => CursorHint::Default,
        };
        self.request_render();
    }

    /// Cursor for the pointer at `screen` given the current state.
    pub fn hover_cursor(&self, screen: Point) -> CursorHint {
        match &self.gesture {
            Gesture::Pan { .. } | Gesture::PanImageInFrame { .. } | Gesture::PanFrame { .. } => {
                return CursorHint::Grabbing
            }
            Gesture::Drag(drag) if drag.committed => return CursorHint::Move,
            Gesture::Resize(resize) => return CursorHint::for_handle(resize.handle),
            Gesture::Sketch(_) | Gesture::Marquee { .. } => return CursorHint::Crosshair,
            _ => {}
        }
        if self.space_held || self.tool == Tool::Pan {
            return CursorHint::Grab;
        }

        let world = self.viewport.screen_to_world(screen);
        let margin = self.config.handle_margin_px;
        let scale = self.viewport.scale;

        if let Some(editor) = &self.frame {
            if let Some(handle) = handle_at(&editor.frame.rect, world, margin, scale, true) {
                return CursorHint::for_handle(handle);
            }
            if editor.original.rect.contains(world) || editor.frame.rect.contains(world) {
                return CursorHint::Grab;
            }
            return CursorHint::Default;
        }

        if let Some(cursor) = self.annotation_cursor(world) {
            return cursor;
        }

        if let Some(item) = self.selection.sole().and_then(|id| self.scene.get(id)) {
            if let Some(handle) = handle_at(&item.rect, world, margin, scale, false) {
                return CursorHint::for_handle(handle);
            }
        }
        if item_at(world, self.scene.items()).is_some() {
            return CursorHint::Grab;
        }
        CursorHint::Default
    }
}
