// src/ui/inspector.rs

use std::sync::Arc;

use egui::{Context, Ui};
use log::warn;
use parking_lot::RwLock;

use crate::bsp::RenderFlags;
use crate::editor::Editor;

const RENDER_MENU: [(&str, RenderFlags); 7] = [
    ("Textures", RenderFlags::TEXTURES),
    ("Lightmaps", RenderFlags::LIGHTMAPS),
    ("Wireframe", RenderFlags::WIREFRAME),
    ("Entities", RenderFlags::ENTITIES),
    ("Special", RenderFlags::SPECIAL),
    ("Special Entities", RenderFlags::SPECIAL_ENTITIES),
    ("Point Entities", RenderFlags::POINT_ENTITIES),
];

/// A keyvalue edit made in the grid, applied once the frame's UI is done.
#[derive(Debug, Clone, PartialEq)]
enum PendingEdit {
    Value { key: String, value: String },
    Rename { index: usize, key: String },
}

/// Menu bar, debug window and raw keyvalue editor for the current selection.
pub struct Inspector {
    editor: Arc<RwLock<Editor>>,
    pub show_debug: bool,
    pub show_keyvalues: bool,
    key_buffers: Vec<String>,
    value_buffers: Vec<String>,
    last_pick_count: u64,
}

impl Inspector {
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self {
            editor,
            show_debug: true,
            show_keyvalues: true,
            key_buffers: Vec::new(),
            value_buffers: Vec::new(),
            last_pick_count: 0,
        }
    }

    /// Called each frame.
    pub fn update(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                self.widgets_menu(ui);
                self.render_menu(ui);
            });
        });

        if self.show_debug {
            let mut open = true;
            egui::Window::new("Debug info")
                .open(&mut open)
                .auto_sized()
                .show(ctx, |ui| self.debug_info(ui));
            self.show_debug = open;
        }

        if self.show_keyvalues {
            let mut open = true;
            egui::Window::new("Keyvalue Editor")
                .open(&mut open)
                .show(ctx, |ui| self.keyvalue_editor(ui));
            self.show_keyvalues = open;
        }
    }

    fn widgets_menu(&mut self, ui: &mut Ui) {
        ui.menu_button("Widgets", |ui| {
            ui.checkbox(&mut self.show_debug, "Debug");
            ui.checkbox(&mut self.show_keyvalues, "Keyvalue Editor");
        });
    }

    fn render_menu(&mut self, ui: &mut Ui) {
        ui.menu_button("Render", |ui| {
            let flags = self.editor.read().render_flags();
            for (i, (label, flag)) in RENDER_MENU.iter().enumerate() {
                if i == 3 {
                    ui.separator();
                }
                let mut checked = flags.contains(*flag);
                if ui.checkbox(&mut checked, *label).clicked() {
                    self.editor.write().toggle_render_flag(*flag);
                }
            }
        });
    }

    fn debug_info(&self, ui: &mut Ui) {
        let editor = self.editor.read();
        let pick = *editor.pick();
        let map = match pick.map_index.and_then(|i| editor.maps().get(i)) {
            Some(map) if pick.valid => map,
            _ => {
                ui.label("Click on an object for debug info");
                return;
            }
        };

        let level = map.level().read();
        ui.label(format!("Map: {}", level.name));
        ui.separator();
        let classname = pick
            .entity_index
            .and_then(|e| level.entities.get(e))
            .map_or("", |ent| ent.classname());
        ui.label(format!("Entity: {}", classname));
        ui.label(format!("Model: {}", describe(pick.model_index)));
        ui.separator();
        ui.label(format!("Face ID: {}", describe(pick.face_index)));
        ui.label(format!("Plane ID: {}", describe(pick.plane_index)));
        ui.label(format!("Distance: {:.1}", pick.best_dist));
    }

    /// Reloads the edit buffers when the selection or its keys changed.
    fn sync_buffers(&mut self, keyvalues: &[(String, String)], pick_count: u64) {
        let stale = pick_count != self.last_pick_count || keyvalues.len() != self.key_buffers.len();
        if stale {
            self.key_buffers = keyvalues.iter().map(|(k, _)| k.clone()).collect();
            self.value_buffers = keyvalues.iter().map(|(_, v)| v.clone()).collect();
            self.last_pick_count = pick_count;
        }
    }

    fn keyvalue_editor(&mut self, ui: &mut Ui) {
        let (keyvalues, pick_count, map, entity) = {
            let editor = self.editor.read();
            let pick = *editor.pick();
            (
                editor.selected_entity_keyvalues(),
                editor.pick_count(),
                pick.map_index,
                pick.entity_index,
            )
        };
        let (keyvalues, map, entity) = match (keyvalues, map, entity) {
            (Some(kv), Some(map), Some(entity)) => (kv, map, entity),
            _ => {
                ui.label("No entity selected");
                return;
            }
        };
        self.sync_buffers(&keyvalues, pick_count);

        let mut edits = Vec::new();
        egui::Grid::new("raw_keyvalues").num_columns(2).striped(true).show(ui, |ui| {
            for (index, (key, value)) in self.key_buffers.iter_mut().zip(self.value_buffers.iter_mut()).enumerate() {
                let key_done = ui.text_edit_singleline(key).lost_focus();
                let value_done = ui.text_edit_singleline(value).lost_focus();
                edits.extend(row_edits(index, &keyvalues[index], key, value, key_done, value_done));
                ui.end_row();
            }
        });

        if !edits.is_empty() {
            self.apply(map, entity, edits);
        }
    }

    fn apply(&mut self, map: usize, entity: usize, edits: Vec<PendingEdit>) {
        let mut editor = self.editor.write();
        for edit in edits {
            let result = match &edit {
                PendingEdit::Value { key, value } => editor.set_keyvalue(map, entity, key, value),
                PendingEdit::Rename { index, key } => editor.rename_key(map, entity, *index, key),
            };
            if let Err(err) = result {
                warn!("Keyvalue edit {:?} failed: {}", edit, err);
                editor.status_message = err.to_string();
            }
        }
    }
}

/// Edits for one grid row. Text is committed only when its field loses focus.
fn row_edits(
    index: usize,
    original: &(String, String),
    key: &str,
    value: &str,
    key_done: bool,
    value_done: bool,
) -> Vec<PendingEdit> {
    let mut edits = Vec::new();
    if value_done && original.1 != value {
        edits.push(PendingEdit::Value {
            key: original.0.clone(),
            value: value.to_string(),
        });
    }
    if key_done && original.0 != key {
        edits.push(PendingEdit::Rename {
            index,
            key: key.to_string(),
        });
    }
    edits
}

fn describe(index: Option<usize>) -> String {
    index.map_or_else(|| "-".to_string(), |i| i.to_string())
}
