// src/bsp/map_renderer.rs

use std::sync::Arc;

use log::info;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::bsp::bsp_mesh::{build_batches, BuildOptions, MapBatches};
use crate::bsp::RenderFlags;
use crate::map::Level;

/// A loaded level together with the batches drawn from it.
///
/// Rebuilding takes the write side of the batch lock; drawing and picking only
/// ever read.
#[derive(Debug)]
pub struct MapRenderer {
    level: Arc<RwLock<Level>>,
    batches: RwLock<MapBatches>,
    options: BuildOptions,
}

impl MapRenderer {
    pub fn new(level: Level, flags: RenderFlags, options: BuildOptions) -> Self {
        let batches = build_batches(&level, flags, &options);
        MapRenderer {
            level: Arc::new(RwLock::new(level)),
            batches: RwLock::new(batches),
            options,
        }
    }

    pub fn level(&self) -> &Arc<RwLock<Level>> {
        &self.level
    }

    pub fn name(&self) -> String {
        self.level.read().name.clone()
    }

    pub fn batches(&self) -> RwLockReadGuard<'_, MapBatches> {
        self.batches.read()
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Regenerates every batch from the current level contents.
    pub fn rebuild(&self, flags: RenderFlags) {
        let batches = {
            let level = self.level.read();
            build_batches(&level, flags, &self.options)
        };
        *self.batches.write() = batches;
    }

    /// Called after an entity's keyvalues change. Model references and
    /// origins can move geometry between batches, so this is a full rebuild.
    pub fn refresh_entity(&self, entity: usize, flags: RenderFlags) {
        info!("{}: refreshing entity {}", self.name(), entity);
        self.rebuild(flags);
    }
}
