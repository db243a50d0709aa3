// src/editor/core.rs

use glam::{Vec2, Vec3};
use log::{error, info};

use crate::bsp::bsp_pick::{pick_ray, pick_with_ray, PickResult};
use crate::bsp::map_renderer::MapRenderer;
use crate::bsp::RenderFlags;
use crate::config::ViewerConfig;
use crate::editor::commands::{Command, CommandType};
use crate::error::{Result, ViewerError};
use crate::map::Level;
use crate::render::camera::Camera;
use crate::render::scene::{DrawBackend, FrameStats, SceneRenderer};
use crate::render::transform::{FrameTransforms, Viewport};

/// An executed command and the map it ran against.
#[derive(Debug)]
struct HistoryEntry {
    map: usize,
    command: Box<dyn Command>,
}

/// The viewer session: loaded maps, camera, render flags, the current pick
/// and the keyvalue edit history.
pub struct Editor {
    config: ViewerConfig,
    maps: Vec<MapRenderer>,
    camera: Camera,
    render_flags: RenderFlags,
    scene: SceneRenderer,

    /// Last selection.
    pick: PickResult,
    /// Number of clicks so far; the inspector uses it to notice new selections.
    pick_count: u64,
    /// Where the last pick ray ended.
    pick_end: Option<Vec3>,

    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,

    /// Messages or status for UI.
    pub status_message: String,
}

impl Editor {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            camera: config.camera(),
            render_flags: config.render_flags,
            scene: SceneRenderer::new(config.highlight_color),
            config,
            maps: Vec::new(),
            pick: PickResult::default(),
            pick_count: 0,
            pick_end: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            status_message: String::new(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Builds batches for `level` and appends it. Returns the map index.
    pub fn add_map(&mut self, level: Level) -> usize {
        info!("Adding map '{}'", level.name);
        let map = MapRenderer::new(level, self.render_flags, self.config.build_options());
        self.maps.push(map);
        self.maps.len() - 1
    }

    pub fn maps(&self) -> &[MapRenderer] {
        &self.maps
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn render_flags(&self) -> RenderFlags {
        self.render_flags
    }

    /// Flips `flag`. Maps are rebuilt when the flag changes what geometry
    /// exists; draw-only flags just take effect on the next frame.
    pub fn toggle_render_flag(&mut self, flag: RenderFlags) {
        self.render_flags.toggle(flag);
        if RenderFlags::geometry_mask().intersects(flag) {
            for map in &self.maps {
                map.rebuild(self.render_flags);
            }
        }
        self.pick.validate(&self.maps);
        self.status_message = format!("Render flags: {:?}", self.render_flags);
    }

    pub fn pick(&self) -> &PickResult {
        &self.pick
    }

    pub fn pick_count(&self) -> u64 {
        self.pick_count
    }

    pub fn pick_end(&self) -> Option<Vec3> {
        self.pick_end
    }

    pub fn clear_selection(&mut self) {
        self.pick.reset();
        self.pick_end = None;
    }

    /// Handles a left click at `cursor` and returns the new selection.
    pub fn click(&mut self, cursor: Vec2, viewport: Viewport) -> &PickResult {
        self.pick_count += 1;
        self.pick_end = None;
        self.pick = match pick_ray(cursor, viewport, &self.camera) {
            Some(ray) => {
                let result = pick_with_ray(&ray, self.camera.z_far, &self.maps, self.render_flags);
                self.pick_end = result.hit_point(&ray);
                result
            }
            None => PickResult::default(),
        };
        &self.pick
    }

    /// Draws one frame from the current camera.
    pub fn render_frame<B: DrawBackend>(&self, backend: &mut B, viewport: Viewport) -> FrameStats {
        let mut frame = FrameTransforms::new(&self.camera, viewport);
        self.scene
            .render(backend, &mut frame, &self.maps, &self.pick, self.render_flags)
    }

    // --- Keyvalue editing ---

    pub fn set_keyvalue(&mut self, map: usize, entity: usize, key: &str, value: &str) -> Result<()> {
        self.execute_command(map, Box::new(CommandType::set_keyvalue(entity, key, value)))
    }

    pub fn rename_key(&mut self, map: usize, entity: usize, index: usize, new_key: &str) -> Result<()> {
        self.execute_command(map, Box::new(CommandType::rename_key(entity, index, new_key)))
    }

    pub fn remove_keyvalue(&mut self, map: usize, entity: usize, key: &str) -> Result<()> {
        self.execute_command(map, Box::new(CommandType::remove_keyvalue(entity, key)))
    }

    fn map_at(&self, map: usize) -> Result<&MapRenderer> {
        self.maps.get(map).ok_or(ViewerError::IndexOutOfRange {
            kind: "map",
            index: map,
            len: self.maps.len(),
        })
    }

    /// Runs `command` against `map`, refreshes it and clears the redo stack.
    pub fn execute_command(&mut self, map: usize, mut command: Box<dyn Command>) -> Result<()> {
        let renderer = self.map_at(map)?;
        if let Err(err) = command.execute(&mut renderer.level().write()) {
            error!("Error executing command {:?}: {}", command, err);
            return Err(err);
        }
        self.after_edit(map, command.entity());
        self.undo_stack.push(HistoryEntry { map, command });
        self.redo_stack.clear();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<()> {
        let mut entry = self.undo_stack.pop().ok_or(ViewerError::NothingToUndo)?;
        let result = match self.map_at(entry.map) {
            Ok(renderer) => entry.command.unexecute(&mut renderer.level().write()),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            error!("Error undoing command {:?}: {}", entry.command, err);
            self.undo_stack.push(entry);
            return Err(err);
        }
        self.after_edit(entry.map, entry.command.entity());
        self.redo_stack.push(entry);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        let mut entry = self.redo_stack.pop().ok_or(ViewerError::NothingToRedo)?;
        let result = match self.map_at(entry.map) {
            Ok(renderer) => entry.command.execute(&mut renderer.level().write()),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            error!("Error redoing command {:?}: {}", entry.command, err);
            self.redo_stack.push(entry);
            return Err(err);
        }
        self.after_edit(entry.map, entry.command.entity());
        self.undo_stack.push(entry);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn after_edit(&mut self, map: usize, entity: usize) {
        if let Some(renderer) = self.maps.get(map) {
            renderer.refresh_entity(entity, self.render_flags);
        }
        if !self.pick.validate(&self.maps) {
            self.pick_end = None;
        }
    }

    /// Raw keyvalues of the selected entity, in key order.
    pub fn selected_entity_keyvalues(&self) -> Option<Vec<(String, String)>> {
        let map = self.maps.get(self.pick.map_index?)?;
        let level = map.level().read();
        level
            .entities
            .get(self.pick.entity_index?)
            .map(|ent| ent.keyvalues.clone())
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Entity;
    use crate::render::scene::RecordingBackend;

    fn level() -> Level {
        let mut level = Level::new("editor");
        let tex = level.add_texture("wall", 64, 64, Vec3::NEG_Y);
        let wall = level.add_polygon(
            &[
                Vec3::new(-128.0, 200.0, -128.0),
                Vec3::new(128.0, 200.0, -128.0),
                Vec3::new(128.0, 200.0, 128.0),
                Vec3::new(-128.0, 200.0, 128.0),
            ],
            tex,
        );
        let door = level.add_polygon(
            &[
                Vec3::new(-16.0, 100.0, -16.0),
                Vec3::new(16.0, 100.0, -16.0),
                Vec3::new(16.0, 100.0, 16.0),
                Vec3::new(-16.0, 100.0, 16.0),
            ],
            tex,
        );
        level.add_model(wall..wall + 1);
        level.add_model(door..door + 1);
        level.entities.push(Entity::from_pairs(&[("classname", "worldspawn")]));
        level.entities.push(Entity::from_pairs(&[
            ("classname", "func_door"),
            ("model", "*1"),
            ("speed", "100"),
        ]));
        level
    }

    fn editor() -> (Editor, Viewport) {
        let mut editor = Editor::default();
        *editor.camera_mut() = Camera::new(Vec3::ZERO);
        editor.add_map(level());
        (editor, Viewport::new(800, 600))
    }

    #[test]
    fn test_click_selects_door() {
        let (mut editor, viewport) = editor();
        let pick = *editor.click(viewport.center(), viewport);
        assert!(pick.valid);
        assert_eq!(pick.entity_index, Some(1));
        assert_eq!(pick.face_index, Some(1));
        assert_eq!(editor.pick_count(), 1);
        let end = editor.pick_end().unwrap();
        assert!((end.y - 100.0).abs() < 1e-3);
        assert_eq!(
            editor.selected_entity_keyvalues().unwrap()[0],
            ("classname".to_string(), "func_door".to_string())
        );
    }

    #[test]
    fn test_toggle_entities_hides_and_rebuilds() {
        let (mut editor, viewport) = editor();
        editor.click(viewport.center(), viewport);
        editor.toggle_render_flag(RenderFlags::ENTITIES);
        assert!(!editor.render_flags().contains(RenderFlags::ENTITIES));
        assert!(editor.maps()[0].batches().face_span(1, 1).is_none());

        let pick = *editor.click(viewport.center(), viewport);
        assert_eq!(pick.entity_index, Some(0));
        assert_eq!(editor.pick_count(), 2);

        editor.toggle_render_flag(RenderFlags::ENTITIES);
        assert!(editor.maps()[0].batches().face_span(1, 1).is_some());
    }

    #[test]
    fn test_edit_undo_redo() {
        let (mut editor, _) = editor();
        editor.set_keyvalue(0, 1, "speed", "250").unwrap();
        assert_eq!(editor.maps()[0].level().read().entities[1].get("speed"), Some("250"));
        editor.undo().unwrap();
        assert_eq!(editor.maps()[0].level().read().entities[1].get("speed"), Some("100"));
        editor.redo().unwrap();
        assert_eq!(editor.maps()[0].level().read().entities[1].get("speed"), Some("250"));
        assert!(matches!(editor.redo(), Err(ViewerError::NothingToRedo)));

        editor.rename_key(0, 1, 2, "wait").unwrap();
        editor.remove_keyvalue(0, 1, "wait").unwrap();
        editor.undo().unwrap();
        editor.undo().unwrap();
        editor.undo().unwrap();
        assert_eq!(editor.maps()[0].level().read().entities[1], level().entities[1]);
        assert!(matches!(editor.undo(), Err(ViewerError::NothingToUndo)));
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let (mut editor, _) = editor();
        assert!(editor.remove_keyvalue(0, 1, "missing").is_err());
        assert!(editor.set_keyvalue(3, 1, "a", "b").is_err());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_origin_edit_moves_geometry() {
        let (mut editor, _) = editor();
        editor.set_keyvalue(0, 1, "origin", "0 -50 0").unwrap();
        let batches = editor.maps()[0].batches();
        let (batch, span) = batches.face_span(1, 1).unwrap();
        assert!((batch.span_vertices(span)[0].position.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_removing_model_clears_selection() {
        let (mut editor, viewport) = editor();
        editor.click(viewport.center(), viewport);
        assert_eq!(editor.pick().model_index, Some(1));

        editor.remove_keyvalue(0, 1, "model").unwrap();
        assert!(!editor.pick().valid);
        assert_eq!(editor.pick_end(), None);
        assert!(editor.selected_entity_keyvalues().is_none());
        assert!(editor.maps()[0].batches().point_entity_span(1).is_some());
    }

    #[test]
    fn test_render_frame_highlights_selection() {
        let (mut editor, viewport) = editor();
        let mut backend = RecordingBackend::new();
        assert!(!editor.render_frame(&mut backend, viewport).highlighted);
        editor.click(viewport.center(), viewport);
        backend.clear();
        let stats = editor.render_frame(&mut backend, viewport);
        assert!(stats.highlighted);
        assert_eq!(backend.highlighted_draws().count(), 1);
    }
}
