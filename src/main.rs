#![warn(non_snake_case)]
//! # bspview
//!
//! Headless front end for the viewer core: loads one or more levels from their
//! JSON interchange form, builds render batches, renders a single frame into a
//! recording backend and optionally resolves a click or dumps the lightmap
//! atlas pages.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;
use log::info;

use bspview::editor::Editor;
use bspview::map::Level;
use bspview::render::{RecordingBackend, Viewport};
use bspview::ViewerConfig;

#[derive(Parser)]
#[command(name = "bspview")]
#[command(about = "Build render batches for BSP levels and pick faces from the command line")]
struct Cli {
    /// Level files (JSON)
    #[arg(required = true)]
    levels: Vec<PathBuf>,

    /// Viewer config (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport size, e.g. 1280x720
    #[arg(long, default_value = "1280x720", value_parser = parse_viewport)]
    viewport: Viewport,

    /// Pick at pixel X Y (origin top-left) and print the result
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    pick: Option<Vec<f32>>,

    /// Write lightmap atlas pages as PNG into this directory
    #[arg(long, value_name = "DIR")]
    dump_lightmaps: Option<PathBuf>,
}

fn parse_viewport(text: &str) -> Result<Viewport, String> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", text))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if width == 0 || height == 0 {
        return Err("viewport must not be empty".to_string());
    }
    Ok(Viewport::new(width, height))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    info!("bspview starting...");

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    let mut editor = Editor::new(config);
    for path in &cli.levels {
        let level = Level::load(path)?;
        editor.add_map(level);
    }

    let mut backend = RecordingBackend::new();
    let stats = editor.render_frame(&mut backend, cli.viewport);
    println!(
        "Rendered {} map(s): {} draw calls, {} triangles",
        editor.maps().len(),
        stats.draw_calls,
        stats.triangles
    );

    if let Some(coords) = &cli.pick {
        let cursor = Vec2::new(coords[0], coords[1]);
        let pick = *editor.click(cursor, cli.viewport);
        if pick.valid {
            let name = pick
                .map_index
                .and_then(|i| editor.maps().get(i))
                .map(|map| map.name())
                .unwrap_or_default();
            println!("Map:      {}", name);
            println!("Entity:   {:?}", pick.entity_index);
            println!("Model:    {:?}", pick.model_index);
            println!("Face ID:  {:?}", pick.face_index);
            println!("Plane ID: {:?}", pick.plane_index);
            println!("Distance: {:.3}", pick.best_dist);
        } else {
            println!("Nothing under the cursor");
        }
    }

    if let Some(dir) = &cli.dump_lightmaps {
        for map in editor.maps() {
            let name = map.name();
            map.batches().lightmaps.save_pages(dir, &name)?;
        }
    }

    info!("bspview exiting.");
    Ok(())
}
