// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

use super::*;
use crate::engine::generation::OfflineGenerator;
use crate::models::layer::Layer;

const EPS: f32 = 1e-3;

fn solid(width: u32, height: u32) -> RasterSource {
    RasterSource::Decoded(Arc::new(RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([200, 30, 30, 255]),
    )))
}

/// Two 100x100 items side by side, the second one selected.
fn workspace() -> (Workspace, ItemId, ItemId) {
    let mut ws = Workspace::default();
    let a = ws.add_image(solid(100, 100), Some(Point::new(50.0, 50.0)));
    let b = ws.add_image(solid(100, 100), Some(Point::new(250.0, 50.0)));
    (ws, a, b)
}

/// Replies with the placeholder composition itself.
struct EchoGenerator;

impl Generator for EchoGenerator {
    fn outpaint(&mut self, request: OutpaintRequest, reply: Sender<GenerationReply>) {
        let _ = reply.send(GenerationReply {
            item_id: request.item_id,
            result: Ok(RasterSource::Decoded(request.image.clone())),
        });
    }
}

/// Holds requests until the test answers them.
#[derive(Default)]
struct DeferredGenerator {
    pending: Vec<(ItemId, Sender<GenerationReply>)>,
}

impl Generator for DeferredGenerator {
    fn outpaint(&mut self, request: OutpaintRequest, reply: Sender<GenerationReply>) {
        self.pending.push((request.item_id, reply));
    }
}

impl DeferredGenerator {
    fn answer(&mut self, source: RasterSource) {
        for (item_id, reply) in self.pending.drain(..) {
            let _ = reply.send(GenerationReply {
                item_id,
                result: Ok(source.clone()),
            });
        }
    }
}

#[test]
fn test_add_image_places_at_natural_size() {
    let (ws, a, b) = workspace();
    assert_eq!(ws.item(a).expect("a").rect, Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(ws.item(b).expect("b").natural, Size::new(100.0, 100.0));
    assert_eq!(ws.selection().ids(), &[b]);
    assert_eq!(ws.history.len(), 3);
}

#[test]
fn test_large_images_are_placed_scaled_down() {
    let mut ws = Workspace::default();
    let id = ws.add_image(solid(2048, 1024), None);
    let item = ws.item(id).expect("item");
    assert!((item.rect.width - 512.0).abs() < EPS);
    assert!((item.rect.height - 256.0).abs() < EPS);
    assert_eq!(item.natural, Size::new(2048.0, 1024.0));
    assert_eq!(item.rect.center(), ws.viewport_center_world());
}

#[test]
fn test_undo_then_redo_restores_identical_scenes() {
    let (mut ws, a, _) = workspace();
    let mut states = vec![ws.items().to_vec()];
    ws.bring_to_front(a);
    states.push(ws.items().to_vec());
    ws.select([a]);
    ws.delete_selected();
    states.push(ws.items().to_vec());

    for expected in states.iter().rev().skip(1) {
        assert!(ws.undo());
        assert_eq!(ws.items(), expected.as_slice());
    }
    for expected in states.iter().skip(1) {
        assert!(ws.redo());
        assert_eq!(ws.items(), expected.as_slice());
    }
    assert!(!ws.redo());
}

#[test]
fn test_undo_prunes_selection() {
    let (mut ws, _, b) = workspace();
    ws.drain_events();
    assert!(ws.undo());
    assert!(ws.item(b).is_none());
    assert!(ws.selection().is_empty());
    let events = ws.drain_events();
    assert!(events.contains(&WorkspaceEvent::SelectionChanged(Vec::new())));
    assert!(events.contains(&WorkspaceEvent::SceneMutated { committed: true }));
}

#[test]
fn test_replace_raster_keeps_rect_and_clears_busy_flags() {
    let (mut ws, a, _) = workspace();
    ws.scene.get_mut(a).expect("a").is_loading = true;
    assert!(ws.replace_raster(a, solid(300, 150), None));

    let item = ws.item(a).expect("a");
    assert_eq!(item.rect, Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(item.natural, Size::new(300.0, 150.0));
    assert!(!item.is_loading);
    assert!(!ws.replace_raster(ItemId(999), solid(1, 1), None));
}

#[test]
fn test_placeholder_is_silent_and_removable() {
    let (mut ws, a, _) = workspace();
    let depth = ws.history.len();
    let rect = Rect::new(400.0, 0.0, 80.0, 80.0);

    let copy = ws.insert_placeholder(rect, Some(a));
    assert_eq!(ws.history.len(), depth);
    let placeholder = ws.item(copy).expect("placeholder");
    assert!(placeholder.is_loading);
    assert_eq!(placeholder.raster, ws.item(a).expect("a").raster);
    assert_eq!(placeholder.rect, rect);
    assert!(ws.remove_item(copy));

    let blank = ws.insert_placeholder(rect, None);
    assert!(ws.flattened_raster(blank).is_some());
    assert!(ws.remove_item(blank));
    assert!(!ws.remove_item(blank));
    assert_eq!(ws.items().len(), 2);
    assert_eq!(ws.history.len(), depth);
}

#[test]
fn test_flattened_raster_waits_for_decode() {
    let mut ws = Workspace::default();
    let id = ws.add_image(RasterSource::encoded(vec![1u8, 2, 3]), None);
    assert!(ws.flattened_raster(id).is_none());
}

#[test]
fn test_rasters_released_once_unreachable() {
    let mut ws = Workspace::new(EngineConfig {
        history_limit: 1,
        ..EngineConfig::default()
    });
    let a = ws.add_image(solid(10, 10), None);
    let b = ws.add_image(solid(10, 10), None);
    let raster_b = ws.item(b).expect("b").raster;

    ws.select([b]);
    ws.delete_selected();
    assert!(ws.rasters().contains(raster_b));

    ws.select([a]);
    ws.delete_selected();
    assert!(!ws.rasters().contains(raster_b));

    ws.reset();
    assert_eq!(ws.rasters().len(), 0);
    assert!(!ws.can_undo());
}

#[test]
fn test_frame_cancel_restores_exact_item() {
    let (mut ws, a, _) = workspace();
    let before = ws.item(a).expect("a").clone();
    let depth = ws.history.len();

    assert!(ws.enter_frame_editor(a));
    assert!(ws.set_frame_ratio(2, 1));
    if let Some(editor) = ws.frame.as_mut() {
        editor.pan_image(Point::new(15.0, 5.0));
    }
    assert!(ws.cancel_frame_editor());

    assert_eq!(ws.item(a), Some(&before));
    assert_eq!(ws.history.len(), depth);
    assert!(ws.frame_editor().is_none());
}

#[test]
fn test_crop_to_two_by_one_pads_transparent() {
    let (mut ws, a, _) = workspace();
    ws.enter_frame_editor(a);
    ws.set_frame_ratio(2, 1);
    assert!(ws.crop_frame());

    let item = ws.item(a).expect("a");
    assert!((item.rect.width - 200.0).abs() < EPS);
    assert!((item.rect.height - 100.0).abs() < EPS);
    assert!((item.rect.center().x - 50.0).abs() < EPS);
    assert_eq!(item.natural, Size::new(200.0, 100.0));

    let image = ws.flattened_raster(a).expect("decoded");
    assert_eq!(image.dimensions(), (200, 100));
    assert_eq!(image.get_pixel(10, 50).0[3], 0);
    assert_eq!(image.get_pixel(100, 50).0, [200, 30, 30, 255]);

    assert!(ws.undo());
    assert_eq!(ws.item(a).expect("a").natural, Size::new(100.0, 100.0));
}

#[test]
fn test_crop_with_fill_is_opaque() {
    let (mut ws, a, _) = workspace();
    ws.enter_frame_editor(a);
    ws.set_frame_ratio(1, 2);
    ws.set_frame_fill(true);
    ws.crop_frame();
    let image = ws.flattened_raster(a).expect("decoded");
    assert_eq!(image.dimensions(), (100, 200));
    assert_eq!(image.get_pixel(50, 5).0, [255, 255, 255, 255]);
}

#[test]
fn test_failed_outpaint_rolls_back() {
    let (mut ws, a, _) = workspace();
    let before = ws.item(a).expect("a").clone();
    let depth = ws.history.len();

    ws.enter_frame_editor(a);
    ws.set_frame_ratio(2, 1);
    assert!(ws.confirm_outpaint(&mut OfflineGenerator));
    assert!(ws.item(a).expect("a").is_loading);
    assert!(ws.is_busy());

    ws.tick();
    assert_eq!(ws.item(a), Some(&before));
    assert_eq!(ws.history.len(), depth);
    assert!(!ws.is_busy());
}

#[test]
fn test_successful_outpaint_commits_once() {
    let (mut ws, a, _) = workspace();
    let depth = ws.history.len();

    ws.enter_frame_editor(a);
    ws.set_frame_ratio(2, 1);
    ws.confirm_outpaint(&mut EchoGenerator);
    assert!(ws.tick());

    let item = ws.item(a).expect("a");
    assert!(!item.is_loading);
    assert_eq!(item.natural, Size::new(200.0, 100.0));
    assert_eq!(ws.history.len(), depth + 1);
    let image = ws.flattened_raster(a).expect("decoded");
    assert_eq!(image.get_pixel(10, 50).0, [255, 255, 255, 255]);
}

#[test]
fn test_loading_items_cannot_be_framed() {
    let (mut ws, a, _) = workspace();
    ws.scene.get_mut(a).expect("a").is_loading = true;
    assert!(!ws.enter_frame_editor(a));
}

#[test]
fn test_zoom_helpers_keep_viewport_center() {
    let (mut ws, a, _) = workspace();
    ws.set_viewport_size(Point::new(800.0, 600.0));
    let center = ws.viewport_center_world();
    ws.zoom_in();
    assert!((ws.viewport().scale - 1.25).abs() < EPS);
    let after = ws.viewport_center_world();
    assert!((after.x - center.x).abs() < EPS && (after.y - center.y).abs() < EPS);
    ws.reset_zoom();
    assert!((ws.viewport().scale - 1.0).abs() < EPS);

    assert!(ws.focus(a));
    let focused = ws.viewport_center_world();
    assert!((focused.x - 50.0).abs() < EPS && (focused.y - 50.0).abs() < EPS);
}

#[test]
fn test_commits_during_outpaint_record_the_pre_edit_item() {
    let (mut ws, a, _) = workspace();
    let before = ws.item(a).expect("a").clone();
    let mut generator = DeferredGenerator::default();

    ws.enter_frame_editor(a);
    ws.set_frame_ratio(2, 1);
    assert!(ws.confirm_outpaint(&mut generator));
    assert!(ws.bring_to_front(a));
    assert!(ws.history.current().iter().all(|item| !item.is_loading));

    generator.answer(solid(200, 100));
    assert!(ws.tick());
    assert!(!ws.item(a).expect("a").is_loading);
    assert!(!ws.is_busy());

    assert!(ws.undo());
    let restored = ws.item(a).expect("a");
    assert!(!restored.is_loading);
    assert_eq!(restored.natural, before.natural);
    assert_eq!(restored.rect, before.rect);
    assert_eq!(ws.items().last().map(|item| item.id), Some(a));
}

#[test]
fn test_undo_during_outpaint_keeps_the_busy_item() {
    let (mut ws, a, b) = workspace();
    let mut generator = DeferredGenerator::default();
    ws.enter_frame_editor(a);
    ws.set_frame_ratio(2, 1);
    ws.confirm_outpaint(&mut generator);

    assert!(ws.undo());
    assert!(ws.item(b).is_none());
    assert!(ws.item(a).expect("a").is_loading);
    assert!(ws.is_busy());

    generator.answer(solid(200, 100));
    ws.tick();
    let item = ws.item(a).expect("a");
    assert!(!item.is_loading);
    assert_eq!(item.natural, Size::new(200.0, 100.0));
}

#[test]
fn test_placeholders_stay_out_of_history_until_replaced() {
    let (mut ws, a, _) = workspace();
    let placeholder = ws.insert_placeholder(Rect::new(400.0, 0.0, 80.0, 80.0), None);
    ws.bring_to_front(a);
    assert!(ws.history.current().iter().all(|item| item.id != placeholder));

    assert!(ws.undo());
    assert!(ws.item(placeholder).expect("placeholder").is_loading);

    assert!(ws.replace_raster(placeholder, solid(80, 80), None));
    assert!(ws.history.current().iter().any(|item| item.id == placeholder));
}

#[test]
fn test_replace_raster_rescales_layers() {
    let (mut ws, a, _) = workspace();
    let overlay = ws
        .rasters
        .insert_decoded(Arc::new(RgbaImage::from_pixel(20, 20, image::Rgba([0, 0, 255, 255]))));
    let layer_id = ws.scene.next_layer_id();
    if let Some(item) = ws.scene.get_mut(a) {
        item.layers.push(Layer::raster(layer_id, Rect::new(40.0, 40.0, 20.0, 20.0), overlay));
        item.commit_layers();
    }

    assert!(ws.replace_raster(a, solid(200, 200), None));
    let item = ws.item(a).expect("a");
    let layer = item.layer(layer_id).expect("layer");
    assert_eq!(layer.rect, Rect::new(80.0, 80.0, 40.0, 40.0));
    assert_eq!(item.local_rect_to_world(&layer.rect), Rect::new(40.0, 40.0, 20.0, 20.0));
    assert!(!item.annotation_history.can_undo());

    let image = ws.flattened_raster(a).expect("decoded");
    assert_eq!(image.get_pixel(100, 100).0, [0, 0, 255, 255]);
    assert_eq!(image.get_pixel(60, 60).0, [200, 30, 30, 255]);
}
