// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the workspace engine and wires it to the menu bar, the
//! toolbar, the properties panel and the canvas. File access and the
//! generation backend live here, outside the engine.

use anyhow::{Context, Result};
use easel::config::EngineConfig;
use easel::engine::{Generator, OfflineGenerator, RasterSource, Workspace, WorkspaceEvent};
use easel::io::{media, serialization};
use easel::models::item::ItemId;
use easel::ui::canvas::CanvasView;
use easel::ui::properties::{self, PropertiesAction};
use easel::ui::toolbar;
use std::path::{Path, PathBuf};
use std::time::Duration;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff"];

/// Main application state.
pub struct EaselApp {
    workspace: Workspace,
    canvas: CanvasView,
    /// Backend that fulfils outpaint requests
    generator: Box<dyn Generator>,
    /// Last message shown in the status bar
    status: Option<String>,
}

impl EaselApp {
    /// Create a new EASEL application instance.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            workspace: Workspace::new(config),
            canvas: CanvasView::default(),
            generator: Box::new(OfflineGenerator),
            status: None,
        }
    }

    fn pick_image() -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
    }

    /// Add an image file to the canvas at the viewport center.
    fn add_image_file(&mut self, path: &Path) -> Result<ItemId> {
        let bytes = media::read_image_file(path)?;
        let id = self.workspace.add_image(RasterSource::encoded(bytes), None);
        log::info!("Added {} as {:?}", path.display(), id);
        Ok(id)
    }

    /// Add an image file as a raster layer of the annotated item.
    fn add_layer_file(&mut self, path: &Path) -> Result<()> {
        let target = self
            .workspace
            .annotation()
            .map(|session| session.item)
            .context("no item is being annotated")?;
        let bytes = media::read_image_file(path)?;
        self.workspace
            .add_raster_layer(target, RasterSource::encoded(bytes))
            .with_context(|| format!("cannot read dimensions of {}", path.display()))?;
        Ok(())
    }

    /// Write the selected item, flattened with its layers, as PNG.
    fn export_selected(&self, path: &Path) -> Result<()> {
        let id = self
            .workspace
            .selection()
            .sole()
            .context("select exactly one item to export")?;
        let image = self
            .workspace
            .flattened_raster(id)
            .context("the image has not finished loading")?;
        let png = media::encode_png(&image)?;
        std::fs::write(path, png).with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("Exported {:?} to {}", id, path.display());
        Ok(())
    }

    fn report(&mut self, result: Result<()>, what: &str) {
        match result {
            Ok(()) => self.status = None,
            Err(e) => {
                log::error!("{} failed: {:#}", what, e);
                self.status = Some(format!("{} failed: {}", what, e));
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            let result = match (file.bytes, file.path) {
                (Some(bytes), _) => {
                    self.workspace.add_image(RasterSource::encoded(bytes), None);
                    Ok(())
                }
                (None, Some(path)) => self.add_image_file(&path).map(|_| ()),
                (None, None) => continue,
            };
            self.report(result, "Drop");
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // Only process if no text field is focused
        if ctx.wants_keyboard_input() {
            return;
        }

        // Handle undo (Ctrl+Z)
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
            self.workspace.undo();
        }

        // Handle redo (Ctrl+Shift+Z or Ctrl+Y)
        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            self.workspace.redo();
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::A)) {
            self.workspace.select_all();
        }
    }

    fn apply_properties(&mut self, action: PropertiesAction) {
        let ws = &mut self.workspace;
        match action {
            PropertiesAction::None => {}
            PropertiesAction::SelectItem(id) => ws.select([id]),
            PropertiesAction::FocusItem(id) => {
                ws.focus(id);
            }
            PropertiesAction::BringToFront(id) => {
                ws.bring_to_front(id);
            }
            PropertiesAction::DeleteItem(id) => {
                ws.remove_item(id);
            }
            PropertiesAction::ClearAnnotations(id) => {
                ws.clear_annotations(id);
            }
            PropertiesAction::SetRatio(w, h) => {
                ws.set_frame_ratio(w, h);
            }
            PropertiesAction::SetFill(fill) => ws.set_frame_fill(fill),
            PropertiesAction::Crop => {
                if !ws.crop_frame() {
                    self.status = Some("Crop needs a decoded image".to_string());
                }
            }
            PropertiesAction::Outpaint => {
                if !ws.confirm_outpaint(self.generator.as_mut()) {
                    self.status = Some("Outpaint needs a decoded image".to_string());
                }
            }
            PropertiesAction::CancelFrame => {
                ws.cancel_frame_editor();
            }
            PropertiesAction::SelectLayer(layer) => ws.set_active_layer(Some(layer)),
            PropertiesAction::SetText(layer, text) => {
                ws.set_text(layer, &text);
            }
            PropertiesAction::DeleteLayer => {
                ws.delete_active_layer();
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Add Image...").clicked() {
                    if let Some(path) = Self::pick_image() {
                        let result = self.add_image_file(&path).map(|_| ());
                        self.report(result, "Add image");
                    }
                    ui.close_menu();
                }
                let single = self.workspace.selection().sole().is_some();
                if ui
                    .add_enabled(single, egui::Button::new("Export Selected as PNG..."))
                    .clicked()
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("PNG", &["png"])
                        .set_file_name("export.png")
                        .save_file()
                    {
                        let result = self.export_selected(&path);
                        self.report(result, "Export");
                    }
                    ui.close_menu();
                }
                if ui.button("Export Settings...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("YAML", &["yaml", "yml"])
                        .add_filter("JSON", &["json"])
                        .set_file_name("easel.yaml")
                        .save_file()
                    {
                        let result = serialization::export_config(self.workspace.config(), &path);
                        self.report(result, "Export settings");
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Reset Workspace").clicked() {
                    self.workspace.reset();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                let can_undo = self.workspace.can_undo();
                if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                    self.workspace.undo();
                    ui.close_menu();
                }
                let can_redo = self.workspace.can_redo();
                if ui
                    .add_enabled(can_redo, egui::Button::new("Redo (Ctrl+Shift+Z)"))
                    .clicked()
                {
                    self.workspace.redo();
                    ui.close_menu();
                }

                ui.separator();

                let has_selection = !self.workspace.selection().is_empty();
                if ui
                    .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                    .clicked()
                {
                    self.workspace.delete_selected();
                    ui.close_menu();
                }
                if ui.button("Select All (Ctrl+A)").clicked() {
                    self.workspace.select_all();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(has_selection, egui::Button::new("Clear Selection"))
                    .clicked()
                {
                    self.workspace.clear_selection();
                    ui.close_menu();
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Zoom In").clicked() {
                    self.workspace.zoom_in();
                    ui.close_menu();
                }
                if ui.button("Zoom Out").clicked() {
                    self.workspace.zoom_out();
                    ui.close_menu();
                }
                if ui.button("Reset Zoom").clicked() {
                    self.workspace.reset_zoom();
                    ui.close_menu();
                }
                let target = self.workspace.selection().sole();
                if ui
                    .add_enabled(target.is_some(), egui::Button::new("Focus Selected"))
                    .clicked()
                {
                    if let Some(id) = target {
                        self.workspace.focus(id);
                    }
                    ui.close_menu();
                }
            });

            ui.menu_button("Annotate", |ui| {
                let annotating = self.workspace.annotation().is_some();
                if ui
                    .add_enabled(annotating, egui::Button::new("Add Image Layer..."))
                    .clicked()
                {
                    if let Some(path) = Self::pick_image() {
                        let result = self.add_layer_file(&path);
                        self.report(result, "Add layer");
                    }
                    ui.close_menu();
                }
                let target = self.workspace.selection().sole();
                if ui
                    .add_enabled(target.is_some(), egui::Button::new("Clear Annotations"))
                    .clicked()
                {
                    if let Some(id) = target {
                        self.workspace.clear_annotations(id);
                    }
                    ui.close_menu();
                }
            });
        });
    }
}

impl eframe::App for EaselApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply finished decodes and generation replies
        if self.workspace.tick() {
            ctx.request_repaint();
        }
        if self.workspace.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        for event in self.workspace.drain_events() {
            match event {
                WorkspaceEvent::SelectionChanged(ids) => log::debug!("selection: {:?}", ids),
                WorkspaceEvent::SceneMutated { committed } => {
                    log::trace!("scene mutated (committed: {})", committed)
                }
            }
        }

        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.workspace);
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Tool: {:?}", self.workspace.tool()));
                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.workspace.viewport().scale * 100.0));
                ui.separator();
                ui.label(format!("{} items", self.workspace.items().len()));
                if let Some(ref message) = self.status {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(230, 120, 100), message);
                }
            });
        });

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, &self.workspace))
            .inner;
        self.apply_properties(properties_action);

        // Main canvas (center)
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.canvas.show(ui, &mut self.workspace);
            });
    }
}
