// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Properties panel.
//!
//! Shows the frame editor controls while framing, the layer list while
//! annotating, and the item list otherwise. The panel only reads the
//! workspace; edits come back as a [`PropertiesAction`].

use crate::engine::Workspace;
use crate::models::item::ItemId;
use crate::models::layer::{LayerId, LayerKind};

/// Result of properties panel interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesAction {
    None,
    SelectItem(ItemId),
    FocusItem(ItemId),
    BringToFront(ItemId),
    DeleteItem(ItemId),
    ClearAnnotations(ItemId),
    SetRatio(u32, u32),
    SetFill(bool),
    Crop,
    Outpaint,
    CancelFrame,
    SelectLayer(LayerId),
    SetText(LayerId, String),
    DeleteLayer,
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, workspace: &Workspace) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        if workspace.frame_editor().is_some() {
            frame_section(ui, workspace, &mut action);
            ui.separator();
        }
        if workspace.annotation().is_some() {
            layer_section(ui, workspace, &mut action);
            ui.separator();
        }
        item_section(ui, workspace, &mut action);
    });

    action
}

fn frame_section(ui: &mut egui::Ui, workspace: &Workspace, action: &mut PropertiesAction) {
    let Some(editor) = workspace.frame_editor() else {
        return;
    };
    ui.heading("Frame");

    let (mut width, mut height) = editor.ratio;
    ui.horizontal(|ui| {
        ui.label("Ratio");
        let w = ui.add(egui::DragValue::new(&mut width).range(1..=256));
        ui.label(":");
        let h = ui.add(egui::DragValue::new(&mut height).range(1..=256));
        if w.changed() || h.changed() {
            *action = PropertiesAction::SetRatio(width, height);
        }
    });

    ui.horizontal_wrapped(|ui| {
        for (w, h) in [(1, 1), (4, 3), (3, 2), (16, 9), (9, 16)] {
            if ui.small_button(format!("{}:{}", w, h)).clicked() {
                *action = PropertiesAction::SetRatio(w, h);
            }
        }
    });

    let (pw, ph) = editor.pixel_size();
    ui.label(format!("Output: {} x {} px", pw, ph));

    let mut fill = editor.fill;
    if ui.checkbox(&mut fill, "Fill empty area").changed() {
        *action = PropertiesAction::SetFill(fill);
    }

    ui.horizontal(|ui| {
        if ui.button("Crop").clicked() {
            *action = PropertiesAction::Crop;
        }
        if ui.button("Outpaint").clicked() {
            *action = PropertiesAction::Outpaint;
        }
        if ui.button("Cancel").clicked() {
            *action = PropertiesAction::CancelFrame;
        }
    });
}

fn layer_section(ui: &mut egui::Ui, workspace: &Workspace, action: &mut PropertiesAction) {
    let Some(item) = workspace
        .annotation()
        .and_then(|session| workspace.item(session.item))
    else {
        return;
    };
    ui.heading("Layers");

    let active = workspace.active_layer();
    if item.layers.is_empty() {
        ui.label(egui::RichText::new("No layers yet").weak());
    }
    for layer in item.layers.iter().rev() {
        let label = match &layer.kind {
            LayerKind::Raster { .. } => "Image".to_string(),
            LayerKind::Text { content, .. } => {
                format!("Text \"{}\"", content.lines().next().unwrap_or_default())
            }
            LayerKind::Stroke { points, .. } => format!("Stroke ({} pts)", points.len()),
            LayerKind::Region { points, .. } => format!("Region ({} pts)", points.len()),
            LayerKind::Connector { .. } => "Arrow".to_string(),
        };
        if ui
            .selectable_label(active == Some(layer.id), label)
            .clicked()
        {
            *action = PropertiesAction::SelectLayer(layer.id);
        }
    }

    if let Some(layer) = active.and_then(|id| item.layer(id)) {
        ui.separator();
        if let LayerKind::Text { content, .. } = &layer.kind {
            let mut text = content.clone();
            if ui.text_edit_multiline(&mut text).changed() {
                *action = PropertiesAction::SetText(layer.id, text);
            }
        }
        if ui.button("Delete layer").clicked() {
            *action = PropertiesAction::DeleteLayer;
        }
    }

    if ui
        .add_enabled(
            item.layers.iter().any(|layer| layer.is_annotation()),
            egui::Button::new("Clear annotations"),
        )
        .clicked()
    {
        *action = PropertiesAction::ClearAnnotations(item.id);
    }
}

fn item_section(ui: &mut egui::Ui, workspace: &Workspace, action: &mut PropertiesAction) {
    ui.heading("Items");
    if workspace.items().is_empty() {
        ui.label(egui::RichText::new("No images on the canvas").weak());
        return;
    }

    for (index, item) in workspace.items().iter().enumerate().rev() {
        let selected = workspace.selection().contains(item.id);
        let (w, h) = item.natural.pixels();
        let status = if item.is_loading { " (loading)" } else { "" };
        ui.horizontal(|ui| {
            if ui
                .selectable_label(selected, format!("{}. {}x{}{}", index + 1, w, h, status))
                .clicked()
            {
                *action = PropertiesAction::SelectItem(item.id);
            }
            if ui.small_button("🔍").on_hover_text("Focus").clicked() {
                *action = PropertiesAction::FocusItem(item.id);
            }
            if ui.small_button("⬆").on_hover_text("Bring to front").clicked() {
                *action = PropertiesAction::BringToFront(item.id);
            }
            if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                *action = PropertiesAction::DeleteItem(item.id);
            }
        });
    }
}
