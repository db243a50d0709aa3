// src/config.rs

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::bsp::{BuildOptions, RenderFlags, LIGHTMAP_PAGE_SIZE};
use crate::error::{Result, ViewerError};
use crate::render::camera::Camera;
use crate::render::primitives::Color3;

/// Viewer settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Vertical field of view, degrees.
    pub fov: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub move_speed: f32,
    pub render_flags: RenderFlags,
    pub lightmap_page_size: u32,
    pub point_entity_extent: f32,
    pub point_entity_color: Color3,
    pub highlight_color: Color3,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            fov: 75.0,
            z_near: 1.0,
            z_far: 262144.0,
            move_speed: 4.0,
            render_flags: RenderFlags::default(),
            lightmap_page_size: LIGHTMAP_PAGE_SIZE,
            point_entity_extent: 8.0,
            point_entity_color: Color3::new(220, 0, 220),
            highlight_color: Color3::new(255, 32, 32),
        }
    }
}

impl ViewerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ViewerError::InvalidConfig(format!("fov must be in (0, 180), got {}", self.fov)));
        }
        if self.z_near <= 0.0 {
            return Err(ViewerError::InvalidConfig(format!("z_near must be positive, got {}", self.z_near)));
        }
        if self.z_far <= self.z_near {
            return Err(ViewerError::InvalidConfig(format!(
                "z_far ({}) must be greater than z_near ({})",
                self.z_far, self.z_near
            )));
        }
        if self.lightmap_page_size == 0 {
            return Err(ViewerError::InvalidConfig("lightmap_page_size must be non-zero".into()));
        }
        if self.point_entity_extent <= 0.0 {
            return Err(ViewerError::InvalidConfig("point_entity_extent must be positive".into()));
        }
        Ok(())
    }

    /// A camera at `Camera::default()`'s origin with these projection settings.
    pub fn camera(&self) -> Camera {
        Camera {
            fov: self.fov,
            z_near: self.z_near,
            z_far: self.z_far,
            move_speed: self.move_speed,
            ..Default::default()
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            lightmap_page_size: self.lightmap_page_size,
            point_entity_extent: self.point_entity_extent,
            point_entity_color: self.point_entity_color,
        }
    }
}
