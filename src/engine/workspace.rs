// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Workspace state and its host-facing operations.
//!
//! The workspace owns the scene, the viewport, the selection, the workspace
//! history, every raster, and the optional frame editor and annotation
//! session. Input handlers mutate the live scene directly and request a
//! repaint; a history snapshot is committed once an operation reaches its
//! terminal state.

use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use super::compose::{compose_frame, flatten};
use super::frame::FrameEditor;
use super::generation::{GenerationReply, Generator, OutpaintRequest};
use super::hit::Selection;
use super::input::{CursorHint, Gesture, GestureKind, Tool};
use super::raster::{RasterSource, RasterStore};
use super::viewport::{PinchSample, Viewport};
use crate::config::EngineConfig;
use crate::history::History;
use crate::models::item::{Item, ItemId};
use crate::models::layer::{LayerId, Rgba, TextAlign};
use crate::models::scene::Scene;
use crate::models::RasterId;
use crate::util::geometry::{Point, Rect, Size};

#[cfg(test)]
#[path = "workspace_test.rs"]
mod workspace_test;

/// Zoom factor of the zoom in/out commands.
const ZOOM_BUTTON_STEP: f32 = 1.25;

/// Notifications for the host, drained with [`Workspace::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceEvent {
    SelectionChanged(Vec<ItemId>),
    /// The scene changed; `committed` is false for live previews
    SceneMutated { committed: bool },
}

/// Drawing settings for new annotation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushSettings {
    pub color: Rgba,
    pub width: f32,
    pub font_size: f32,
    pub text: String,
    pub align: TextAlign,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: [229, 62, 62, 255],
            width: 6.0,
            font_size: 32.0,
            text: "Text".to_string(),
            align: TextAlign::Left,
        }
    }
}

/// Per-item annotation editing state.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSession {
    pub item: ItemId,
    /// Layer selection, separate from item selection
    pub active_layer: Option<LayerId>,
    /// Whether the item's layers changed during this session
    pub(crate) changed: bool,
}

pub struct Workspace {
    pub(crate) config: EngineConfig,
    pub(crate) scene: Scene,
    pub(crate) viewport: Viewport,
    pub(crate) viewport_size: Point,
    pub(crate) selection: Selection,
    pub(crate) history: History<Vec<Item>>,
    pub(crate) rasters: RasterStore,
    pub(crate) gesture: Gesture,
    pub(crate) frame: Option<FrameEditor>,
    pub(crate) annotation: Option<AnnotationSession>,
    pub(crate) tool: Tool,
    pub(crate) brush: BrushSettings,
    pub(crate) space_held: bool,
    pub(crate) pinch: Option<PinchSample>,
    /// Last known pointer position in screen space
    pub(crate) pointer: Option<Point>,
    pub(crate) cursor: CursorHint,
    render_requested: bool,
    events: Vec<WorkspaceEvent>,
    /// Pre-edit items of outpaints awaiting a reply, for rollback
    pending_outpaints: HashMap<ItemId, Item>,
    /// Host-inserted placeholders, never recorded in history
    placeholders: HashSet<ItemId>,
    generation_sender: Sender<GenerationReply>,
    generation_receiver: Receiver<GenerationReply>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Workspace {
    pub fn new(config: EngineConfig) -> Self {
        let (generation_sender, generation_receiver) = channel();
        Self {
            viewport: Viewport::new(config.min_zoom, config.max_zoom),
            history: History::with_limit(Vec::new(), config.history_limit),
            config,
            scene: Scene::new(),
            viewport_size: Point::new(1280.0, 720.0),
            selection: Selection::default(),
            rasters: RasterStore::new(),
            gesture: Gesture::None,
            frame: None,
            annotation: None,
            tool: Tool::Select,
            brush: BrushSettings::default(),
            space_held: false,
            pinch: None,
            pointer: None,
            cursor: CursorHint::Default,
            render_requested: true,
            events: Vec::new(),
            pending_outpaints: HashMap::new(),
            placeholders: HashSet::new(),
            generation_sender,
            generation_receiver,
        }
    }

    // --- Queries ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn items(&self) -> &[Item] {
        self.scene.items()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.scene.get(id)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn rasters(&self) -> &RasterStore {
        &self.rasters
    }

    pub fn gesture_kind(&self) -> GestureKind {
        self.gesture.kind()
    }

    /// Marquee rectangle in world space while a marquee is being dragged.
    pub fn marquee_rect(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Marquee {
                start_world,
                current_world,
                ..
            } => Some(Rect::from_points(start_world, current_world)),
            _ => None,
        }
    }

    pub fn frame_editor(&self) -> Option<&FrameEditor> {
        self.frame.as_ref()
    }

    pub fn annotation(&self) -> Option<&AnnotationSession> {
        self.annotation.as_ref()
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            log::debug!("tool: {:?}", tool);
            self.tool = tool;
            self.request_render();
        }
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut BrushSettings {
        &mut self.brush
    }

    pub fn can_undo(&self) -> bool {
        match &self.annotation {
            Some(session) => self
                .scene
                .get(session.item)
                .is_some_and(|item| item.annotation_history.can_undo()),
            None => self.history.can_undo(),
        }
    }

    pub fn can_redo(&self) -> bool {
        match &self.annotation {
            Some(session) => self
                .scene
                .get(session.item)
                .is_some_and(|item| item.annotation_history.can_redo()),
            None => self.history.can_redo(),
        }
    }

    /// True while decodes or generation round-trips are outstanding.
    pub fn is_busy(&self) -> bool {
        self.rasters.is_pending() || !self.pending_outpaints.is_empty()
    }

    // --- Render scheduling and notifications ---

    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Per-frame tick: apply finished decodes and generation replies, then
    /// report (and clear) whether a repaint is needed.
    pub fn tick(&mut self) -> bool {
        if self.rasters.poll() > 0 {
            self.request_render();
        }
        while let Ok(reply) = self.generation_receiver.try_recv() {
            self.complete_generation(reply);
        }
        std::mem::take(&mut self.render_requested)
    }

    pub fn drain_events(&mut self) -> Vec<WorkspaceEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn notify_selection(&mut self) {
        self.events
            .push(WorkspaceEvent::SelectionChanged(self.selection.ids().to_vec()));
        self.request_render();
    }

    pub(crate) fn notify_mutation(&mut self, committed: bool) {
        self.events.push(WorkspaceEvent::SceneMutated { committed });
        self.request_render();
    }

    /// Replace the selection, notifying only when it changed.
    pub fn select(&mut self, ids: impl IntoIterator<Item = ItemId>) {
        if self.selection.replace(ids) {
            self.notify_selection();
        }
    }

    pub fn select_all(&mut self) {
        let ids: Vec<ItemId> = self.scene.items().iter().map(|item| item.id).collect();
        self.select(ids);
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.notify_selection();
        }
    }

    // --- History ---

    /// The live scene as history records it: items awaiting an outpaint
    /// reply appear in their pre-edit state and placeholders are left out.
    fn committed_items(&self) -> Vec<Item> {
        self.scene
            .items()
            .iter()
            .filter(|item| !self.placeholders.contains(&item.id))
            .map(|item| match self.pending_outpaints.get(&item.id) {
                Some(before) => before.clone(),
                None => item.clone(),
            })
            .collect()
    }

    /// Restore a snapshot while keeping busy items on screen. A pending
    /// outpaint whose item is absent from the snapshot is abandoned.
    fn restore_snapshot(&mut self, items: Vec<Item>) {
        let busy: Vec<Item> = self
            .scene
            .items()
            .iter()
            .filter(|item| {
                self.placeholders.contains(&item.id) || self.pending_outpaints.contains_key(&item.id)
            })
            .cloned()
            .collect();
        self.scene.restore(items);
        for item in busy {
            if self.placeholders.contains(&item.id) {
                self.scene.push(item);
            } else if self.scene.get(item.id).is_some() {
                self.scene.replace(item);
            } else {
                log::debug!("history step abandons pending outpaint on {:?}", item.id);
                self.pending_outpaints.remove(&item.id);
            }
        }
    }

    /// Record the live scene as a new workspace snapshot.
    pub(crate) fn commit(&mut self, reason: &str) {
        self.history.commit(self.committed_items());
        log::info!("commit: {} ({} items)", reason, self.scene.len());
        self.release_unused_rasters();
        self.notify_mutation(true);
    }

    /// Commit only when the live scene differs from the current snapshot.
    pub(crate) fn commit_if_changed(&mut self, reason: &str) -> bool {
        if self.committed_items() == *self.history.current() {
            return false;
        }
        self.commit(reason);
        true
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(true)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(false)
    }

    fn step_history(&mut self, backwards: bool) -> bool {
        self.gesture = Gesture::None;

        if let Some(session) = self.annotation.as_mut() {
            let Some(item) = self.scene.get_mut(session.item) else {
                return false;
            };
            let moved = if backwards {
                item.undo_layers()
            } else {
                item.redo_layers()
            };
            if moved {
                if session
                    .active_layer
                    .is_some_and(|layer| item.layer(layer).is_none())
                {
                    session.active_layer = None;
                }
                session.changed = true;
                log::info!("{} annotation on {:?}", if backwards { "undo" } else { "redo" }, item.id);
                self.notify_mutation(true);
            }
            return moved;
        }

        if let Some(editor) = self.frame.take() {
            log::debug!("history step closes frame editor on {:?}", editor.item_id());
            self.scene.replace(editor.before().clone());
        }

        let snapshot = if backwards {
            self.history.undo()
        } else {
            self.history.redo()
        };
        let Some(items) = snapshot else {
            return false;
        };
        self.restore_snapshot(items);
        log::info!("{} ({} items)", if backwards { "undo" } else { "redo" }, self.scene.len());
        if self.selection.prune(self.scene.items()) {
            self.notify_selection();
        }
        self.release_unused_rasters();
        self.notify_mutation(true);
        true
    }

    /// Release rasters no longer reachable from the scene, any snapshot, a
    /// pending rollback or the frame editor's pre-edit copy.
    pub(crate) fn release_unused_rasters(&mut self) {
        let mut live: HashSet<RasterId> = self.scene.raster_ids().collect();
        for snapshot in self.history.snapshots() {
            live.extend(snapshot.iter().flat_map(|item| item.raster_ids()));
        }
        live.extend(self.pending_outpaints.values().flat_map(|item| item.raster_ids()));
        if let Some(editor) = &self.frame {
            live.extend(editor.before().raster_ids());
        }
        self.rasters.retain(&live);
    }

    // --- Scene operations ---

    /// Add an image centered on `at` (default: the viewport center).
    ///
    /// The natural size comes from the image header; the item is placed with
    /// its longest side capped to `placement_max_side` world units.
    pub fn add_image(&mut self, source: RasterSource, at: Option<Point>) -> ItemId {
        let (width, height) = source.dimensions().unwrap_or_else(|| {
            log::warn!("unknown raster dimensions, using a 512x512 placeholder size");
            (512, 512)
        });
        let natural = Size::new(width as f32, height as f32);
        let fit = (self.config.placement_max_side / natural.width.max(natural.height)).min(1.0);
        let center = at.unwrap_or_else(|| self.viewport_center_world());
        let rect = Rect::from_center_size(center, natural.width * fit, natural.height * fit);

        let raster = self.rasters.insert(source);
        let id = self.scene.next_item_id();
        self.scene.push(Item::new(id, raster, rect, natural));
        log::info!("added {:?} ({}x{})", id, width, height);

        self.select([id]);
        self.commit("add image");
        id
    }

    /// Base raster and layers composited at natural resolution, `None` until
    /// the base raster has decoded.
    pub fn flattened_raster(&self, id: ItemId) -> Option<RgbaImage> {
        flatten(self.scene.get(id)?, &self.rasters)
    }

    /// Swap an item's raster, keeping its world rectangle, and clear its
    /// busy flags. `natural` defaults to the source's own pixel size.
    pub fn replace_raster(
        &mut self,
        id: ItemId,
        source: RasterSource,
        natural: Option<Size>,
    ) -> bool {
        if self.scene.get(id).is_none() {
            log::warn!("replace_raster: {:?} no longer exists", id);
            return false;
        }
        let natural = natural.or_else(|| {
            source
                .dimensions()
                .map(|(w, h)| Size::new(w as f32, h as f32))
        });
        let raster = self.rasters.insert(source);
        if let Some(item) = self.scene.get_mut(id) {
            item.raster = raster;
            if let Some(natural) = natural {
                item.set_natural(natural);
            }
            item.is_loading = false;
            item.is_reasoning = false;
        }
        self.placeholders.remove(&id);
        self.pending_outpaints.remove(&id);
        self.commit("replace raster");
        true
    }

    /// Insert a busy placeholder without a history entry. With `copy_from`,
    /// the placeholder shows that item's raster and layers.
    pub fn insert_placeholder(&mut self, rect: Rect, copy_from: Option<ItemId>) -> ItemId {
        let (raster, natural, layers) = match copy_from.and_then(|id| self.scene.get(id)) {
            Some(source) => (source.raster, source.natural, source.layers.clone()),
            None => (
                self.rasters.insert_decoded(Arc::new(RgbaImage::new(1, 1))),
                Size::new(rect.width.max(1.0), rect.height.max(1.0)),
                Vec::new(),
            ),
        };
        let id = self.scene.next_item_id();
        let mut item = Item::new(id, raster, rect, natural);
        item.annotation_history = History::new(layers.clone());
        item.layers = layers;
        item.is_loading = true;
        self.scene.push(item);
        self.placeholders.insert(id);
        log::debug!("inserted placeholder {:?}", id);
        self.notify_mutation(false);
        id
    }

    /// Remove an item (e.g. rolling back a failed generation).
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        if self.frame.as_ref().is_some_and(|editor| editor.item_id() == id) {
            self.frame = None;
        }
        if self.annotation.as_ref().is_some_and(|session| session.item == id) {
            self.annotation = None;
        }
        if self.scene.remove(id).is_none() {
            return false;
        }
        self.pending_outpaints.remove(&id);
        self.placeholders.remove(&id);
        if self.selection.remove(id) {
            self.notify_selection();
        }
        if !self.commit_if_changed("remove item") {
            self.release_unused_rasters();
            self.notify_mutation(false);
        }
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return false;
        }
        if self
            .frame
            .as_ref()
            .is_some_and(|editor| ids.contains(&editor.item_id()))
        {
            self.frame = None;
        }
        if self
            .annotation
            .as_ref()
            .is_some_and(|session| ids.contains(&session.item))
        {
            self.annotation = None;
        }
        for id in &ids {
            self.scene.remove(*id);
            self.pending_outpaints.remove(id);
            self.placeholders.remove(id);
        }
        self.clear_selection();
        self.commit("delete selection");
        true
    }

    pub fn bring_to_front(&mut self, id: ItemId) -> bool {
        if !self.scene.bring_to_front(id) {
            return false;
        }
        self.commit("bring to front");
        true
    }

    /// Empty the workspace, dropping both kinds of history and all rasters.
    pub fn reset(&mut self) {
        self.scene.clear();
        self.history.reset(Vec::new());
        self.gesture = Gesture::None;
        self.frame = None;
        self.annotation = None;
        self.pending_outpaints.clear();
        self.placeholders.clear();
        self.rasters.clear();
        self.viewport.reset();
        self.clear_selection();
        self.notify_mutation(true);
        log::info!("workspace reset");
    }

    // --- Viewport ---

    pub fn set_viewport_size(&mut self, size: Point) {
        if self.viewport_size != size {
            self.viewport_size = size;
            self.request_render();
        }
    }

    pub fn viewport_center_world(&self) -> Point {
        self.viewport.center_world(self.viewport_size)
    }

    /// Recenter the view on an item.
    pub fn focus(&mut self, id: ItemId) -> bool {
        let Some(rect) = self.scene.get(id).map(|item| item.rect) else {
            return false;
        };
        self.viewport.focus(&rect, self.viewport_size);
        self.request_render();
        true
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_at(self.viewport_size * 0.5, ZOOM_BUTTON_STEP);
        self.request_render();
    }

    pub fn zoom_out(&mut self) {
        self.viewport
            .zoom_at(self.viewport_size * 0.5, 1.0 / ZOOM_BUTTON_STEP);
        self.request_render();
    }

    pub fn reset_zoom(&mut self) {
        let anchor = self.viewport_size * 0.5;
        self.viewport.zoom_to(anchor, 1.0);
        self.request_render();
    }

    // --- Frame editor ---

    /// Open the frame editor on an item. Busy items cannot be framed.
    pub fn enter_frame_editor(&mut self, id: ItemId) -> bool {
        self.cancel_frame_editor();
        if self.annotation.is_some() {
            self.exit_annotation();
        }
        let Some(item) = self.scene.get(id) else {
            return false;
        };
        if item.is_loading {
            log::warn!("cannot frame {:?} while it is loading", id);
            return false;
        }
        self.frame = Some(FrameEditor::new(item, self.config.fill_by_default));
        self.gesture = Gesture::None;
        log::info!("frame editor opened on {:?}", id);
        self.select([id]);
        self.request_render();
        true
    }

    pub fn set_frame_ratio(&mut self, width: u32, height: u32) -> bool {
        let Some(editor) = self.frame.as_mut() else {
            return false;
        };
        let changed = editor.set_ratio(width, height);
        if changed {
            self.request_render();
        }
        changed
    }

    pub fn set_frame_fill(&mut self, fill: bool) {
        if let Some(editor) = self.frame.as_mut() {
            editor.fill = fill;
            self.request_render();
        }
    }

    /// Close the frame editor and restore the pre-edit item. No history entry.
    pub fn cancel_frame_editor(&mut self) -> bool {
        let Some(editor) = self.frame.take() else {
            return false;
        };
        self.scene.replace(editor.before().clone());
        if matches!(
            self.gesture,
            Gesture::PanFrame { .. } | Gesture::PanImageInFrame { .. } | Gesture::Resize(_)
        ) {
            self.gesture = Gesture::None;
        }
        log::info!("frame editor cancelled on {:?}", editor.item_id());
        self.request_render();
        true
    }

    /// Composition of the item's base raster inside the frame, if decoded.
    fn compose_editor(&self, editor: &FrameEditor, fill: Option<Rgba>) -> Option<RgbaImage> {
        let base = self.rasters.image(editor.before().raster)?;
        Some(compose_frame(
            base,
            editor.pixel_size(),
            &editor.image_placement(),
            fill,
        ))
    }

    /// Commit the frame as the item's new raster (one history entry).
    pub fn crop_frame(&mut self) -> bool {
        let Some(editor) = self.frame.take() else {
            return false;
        };
        let fill = editor.fill.then_some(self.config.frame_fill);
        let Some(composed) = self.compose_editor(&editor, fill) else {
            log::warn!("cannot crop {:?}: raster not decoded", editor.item_id());
            self.frame = Some(editor);
            return false;
        };
        let raster = self.rasters.insert_decoded(Arc::new(composed));
        let item = editor.build_item(raster);
        let (width, height) = editor.pixel_size();
        self.scene.replace(item);
        log::info!("cropped {:?} to {}x{}", editor.item_id(), width, height);
        self.commit("crop frame");
        true
    }

    /// Replace the item with an opaque placeholder of the frame and hand it
    /// to the generator. The item stays busy until the reply arrives.
    pub fn confirm_outpaint(&mut self, generator: &mut dyn Generator) -> bool {
        let Some(editor) = self.frame.take() else {
            return false;
        };
        let Some(composed) = self.compose_editor(&editor, Some(self.config.outpaint_fill)) else {
            log::warn!("cannot outpaint {:?}: raster not decoded", editor.item_id());
            self.frame = Some(editor);
            return false;
        };
        let image = Arc::new(composed);
        let raster = self.rasters.insert_decoded(image.clone());
        let mut item = editor.build_item(raster);
        item.is_loading = true;
        let id = item.id;
        self.scene.replace(item);
        self.pending_outpaints.insert(id, editor.before().clone());
        self.notify_mutation(false);

        log::info!("outpaint requested for {:?}", id);
        generator.outpaint(
            OutpaintRequest {
                item_id: id,
                image,
                frame: editor.frame.rect,
                pixel_size: editor.pixel_size(),
            },
            self.generation_sender.clone(),
        );
        true
    }

    /// Sender for replies to generation work started outside the frame
    /// editor (e.g. placeholders inserted by the host).
    pub fn generation_sender(&self) -> Sender<GenerationReply> {
        self.generation_sender.clone()
    }

    fn complete_generation(&mut self, reply: GenerationReply) {
        let before = self.pending_outpaints.remove(&reply.item_id);
        match reply.result {
            Ok(source) => {
                log::info!("generation finished for {:?}", reply.item_id);
                if !self.replace_raster(reply.item_id, source, None) {
                    self.release_unused_rasters();
                }
            }
            Err(e) => {
                log::error!("generation failed for {:?}: {}", reply.item_id, e);
                match before {
                    Some(item) => {
                        if self.scene.get(item.id).is_some() {
                            self.scene.replace(item);
                        }
                    }
                    None => {
                        self.scene.remove(reply.item_id);
                        self.placeholders.remove(&reply.item_id);
                        if self.selection.remove(reply.item_id) {
                            self.notify_selection();
                        }
                    }
                }
                if !self.commit_if_changed("generation rollback") {
                    self.release_unused_rasters();
                }
                self.request_render();
            }
        }
    }
}
