// tests/pick_scene.rs
//! End-to-end: level file → batches → frame → pick → edit.

use std::io::Write;

use assert_approx_eq::assert_approx_eq;
use glam::{Vec2, Vec3};

use bspview::bsp::{build_batches, BuildOptions, GeometryClass, RenderFlags};
use bspview::editor::Editor;
use bspview::map::{Entity, Level};
use bspview::render::{Camera, RecordingBackend, Viewport};
use bspview::ViewerConfig;

/// A room: floor, a back wall and a door brush entity, plus a light.
fn room() -> Level {
    let mut level = Level::new("room");
    let floor_tex = level.add_texture("floor", 64, 64, Vec3::Z);
    let wall_tex = level.add_texture("wall", 128, 128, Vec3::NEG_Y);
    let door_tex = level.add_texture("door", 64, 128, Vec3::NEG_Y);

    let floor = level.add_polygon(
        &[
            Vec3::new(-256.0, -256.0, -64.0),
            Vec3::new(256.0, -256.0, -64.0),
            Vec3::new(256.0, 256.0, -64.0),
            Vec3::new(-256.0, 256.0, -64.0),
        ],
        floor_tex,
    );
    // hexagonal wall panel: 4 triangles
    level.add_polygon(
        &[
            Vec3::new(-256.0, 256.0, -64.0),
            Vec3::new(256.0, 256.0, -64.0),
            Vec3::new(300.0, 256.0, 64.0),
            Vec3::new(256.0, 256.0, 192.0),
            Vec3::new(-256.0, 256.0, 192.0),
            Vec3::new(-300.0, 256.0, 64.0),
        ],
        wall_tex,
    );
    let door = level.add_polygon(
        &[
            Vec3::new(-32.0, 128.0, -64.0),
            Vec3::new(32.0, 128.0, -64.0),
            Vec3::new(32.0, 128.0, 64.0),
            Vec3::new(-32.0, 128.0, 64.0),
        ],
        door_tex,
    );
    level.add_model(floor..floor + 2);
    level.add_model(door..door + 1);

    level.entities.push(Entity::from_pairs(&[("classname", "worldspawn")]));
    level.entities.push(Entity::from_pairs(&[
        ("classname", "func_door"),
        ("model", "*1"),
        ("targetname", "door1"),
    ]));
    level.entities.push(Entity::from_pairs(&[
        ("classname", "light"),
        ("origin", "0 64 128"),
    ]));
    level
}

fn viewport() -> Viewport {
    Viewport::new(1024, 768)
}

fn editor() -> Editor {
    let mut editor = Editor::new(ViewerConfig::default());
    *editor.camera_mut() = Camera::new(Vec3::ZERO);
    editor.add_map(room());
    editor
}

#[test]
fn level_file_round_trip() {
    let level = room();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(level.to_json().unwrap().as_bytes()).unwrap();
    let loaded = Level::load(file.path()).unwrap();
    assert_eq!(loaded, level);
}

#[test]
fn batch_vertex_counts_follow_fan_rule() {
    let batches = build_batches(&room(), RenderFlags::default(), &BuildOptions::default());
    let counts: Vec<(GeometryClass, usize)> = batches
        .faces
        .values()
        .map(|b| (b.key.class, b.vertices.len()))
        .collect();
    // floor (4 → 2 tris), wall (6 → 4 tris), door (4 → 2 tris)
    assert_eq!(
        counts,
        vec![
            (GeometryClass::World, 6),
            (GeometryClass::World, 12),
            (GeometryClass::Entity, 6)
        ]
    );
    assert_eq!(batches.point_entities.vertices.len(), 36);
}

#[test]
fn toggling_a_flag_twice_rebuilds_identically() {
    let mut editor = editor();
    let before = editor.maps()[0].batches().clone();
    editor.toggle_render_flag(RenderFlags::ENTITIES);
    assert_ne!(*editor.maps()[0].batches(), before);
    editor.toggle_render_flag(RenderFlags::ENTITIES);
    assert_eq!(*editor.maps()[0].batches(), before);
}

#[test]
fn click_through_door_and_edit() {
    let mut editor = editor();
    let center = viewport().center();

    let pick = *editor.click(center, viewport());
    assert!(pick.valid);
    assert_eq!(pick.entity_index, Some(1));
    assert_eq!(pick.face_index, Some(2));
    assert_approx_eq!(pick.best_dist, 127.0, 1e-3);

    // hide brush entities: the ray now reaches the back wall
    editor.toggle_render_flag(RenderFlags::ENTITIES);
    let pick = *editor.click(center, viewport());
    assert_eq!(pick.entity_index, Some(0));
    assert_eq!(pick.face_index, Some(1));
    assert_approx_eq!(pick.best_dist, 255.0, 1e-3);
    editor.toggle_render_flag(RenderFlags::ENTITIES);

    // moving the door out of the way via its origin
    editor.click(center, viewport());
    editor.set_keyvalue(0, 1, "origin", "512 0 0").unwrap();
    let pick = *editor.click(center, viewport());
    assert_eq!(pick.face_index, Some(1));
    editor.undo().unwrap();
    let pick = *editor.click(center, viewport());
    assert_eq!(pick.face_index, Some(2));
}

#[test]
fn looking_up_picks_the_light() {
    let mut editor = editor();
    // 45 degrees up, entering the cube through its -Y face
    editor.camera_mut().pitch = -45.0;
    editor.camera_mut().origin = Vec3::new(0.0, 0.0, 70.0);
    let pick = *editor.click(viewport().center(), viewport());
    assert!(pick.valid);
    assert_eq!(pick.entity_index, Some(2));
    assert_eq!(pick.face_index, None);
    assert_eq!(pick.model_index, None);
}

#[test]
fn empty_sky_is_a_miss() {
    let mut editor = editor();
    editor.camera_mut().yaw = 180.0;
    editor.camera_mut().origin = Vec3::new(0.0, -300.0, 0.0);
    let pick = *editor.click(viewport().center(), viewport());
    assert!(!pick.valid);
    assert_eq!(pick.map_index, None);
    assert_eq!(editor.pick_end(), None);
}

#[test]
fn frame_highlights_only_the_pick() {
    let mut editor = editor();
    let mut backend = RecordingBackend::new();
    let stats = editor.render_frame(&mut backend, viewport());
    assert_eq!(stats.triangles, 2 + 4 + 2 + 12);
    assert!(!stats.highlighted);

    editor.click(Vec2::new(512.0, 384.0), viewport());
    backend.clear();
    let stats = editor.render_frame(&mut backend, viewport());
    assert!(stats.highlighted);
    assert_eq!(backend.highlighted_draws().count(), 1);
}
