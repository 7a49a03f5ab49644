// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! Tool buttons, brush settings and the mode toggles for annotation and
//! frame editing.

use crate::engine::{Tool, Workspace};
use crate::models::layer::TextAlign;

const TOOLS: [(Tool, &str); 6] = [
    (Tool::Select, "⬆ Select"),
    (Tool::Pan, "✋ Pan"),
    (Tool::Brush, "✏ Brush"),
    (Tool::Lasso, "◌ Lasso"),
    (Tool::Arrow, "➡ Arrow"),
    (Tool::Text, "T Text"),
];

/// Display the toolbar with tool selection buttons.
pub fn show(ui: &mut egui::Ui, workspace: &mut Workspace) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        let annotating = workspace.annotation().is_some();
        for (tool, label) in TOOLS {
            // Drawing tools only apply inside annotation mode
            let enabled = annotating || (!tool.draws() && tool != Tool::Text);
            let selected = workspace.tool() == tool;
            if ui
                .add_enabled(enabled, egui::SelectableLabel::new(selected, label))
                .clicked()
            {
                workspace.set_tool(tool);
            }
        }

        ui.separator();

        let target = workspace.selection().sole();
        if annotating {
            if ui.button("✔ Done").clicked() {
                workspace.exit_annotation();
                workspace.set_tool(Tool::Select);
            }
        } else if ui
            .add_enabled(target.is_some(), egui::Button::new("🖊 Annotate"))
            .clicked()
        {
            if let Some(id) = target {
                workspace.enter_annotation(id);
            }
        }

        let framing = workspace.frame_editor().is_some();
        if ui
            .add_enabled(target.is_some() && !framing, egui::Button::new("⬚ Frame"))
            .clicked()
        {
            if let Some(id) = target {
                workspace.enter_frame_editor(id);
            }
        }

        ui.separator();

        if annotating {
            brush_settings(ui, workspace);
            ui.separator();
        }

        // Tool description
        let tool_text = match workspace.tool() {
            Tool::Select if annotating => "Click a layer to select it, drag to move, corners to resize",
            Tool::Select => "Click to select, drag to move, drag empty space to marquee select",
            Tool::Pan => "Drag to pan the view (or hold Space / middle mouse)",
            Tool::Brush => "Drag to paint a stroke",
            Tool::Lasso => "Drag to outline a region",
            Tool::Arrow => "Drag to draw an arrow",
            Tool::Text => "Click to place text",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
}

fn brush_settings(ui: &mut egui::Ui, workspace: &mut Workspace) {
    let brush = workspace.brush_mut();
    ui.color_edit_button_srgba_unmultiplied(&mut brush.color);
    ui.add(
        egui::DragValue::new(&mut brush.width)
            .range(1.0..=64.0)
            .speed(0.25)
            .prefix("width "),
    );
    ui.add(
        egui::DragValue::new(&mut brush.font_size)
            .range(6.0..=256.0)
            .prefix("font "),
    );
    egui::ComboBox::from_id_source("text_align")
        .selected_text(format!("{:?}", brush.align))
        .width(70.0)
        .show_ui(ui, |ui| {
            for align in [TextAlign::Left, TextAlign::Center, TextAlign::Right] {
                ui.selectable_value(&mut brush.align, align, format!("{:?}", align));
            }
        });
}
