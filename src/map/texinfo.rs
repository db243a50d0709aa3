// src/map/texinfo.rs
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Texinfo flag for animated/sky surfaces that are never lightmapped.
pub const TEX_SPECIAL: u32 = 1;

/// Texture names that mark tool surfaces rather than visible walls.
const SPECIAL_TEXTURE_PREFIXES: [&str; 5] = ["sky", "aaatrigger", "clip", "origin", "null"];

/// Per-face texture projection.
///
/// A world position `p` maps to texel coordinates
/// `s = dot(p, s_axis) + s_offset`, `t = dot(p, t_axis) + t_offset`.
/// Offsets are in texels, so the normalized texture coordinate is
/// `(dot(p, s_axis) + s_offset) / width` and the offset is scaled with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TexInfo {
    pub s_axis: Vec3,
    pub s_offset: f32,
    pub t_axis: Vec3,
    pub t_offset: f32,
    pub texture: usize,
    #[serde(default)]
    pub flags: u32,
}

impl TexInfo {
    /// Texel coordinates of `point`.
    pub fn texel(&self, point: Vec3) -> (f32, f32) {
        (
            point.dot(self.s_axis) + self.s_offset,
            point.dot(self.t_axis) + self.t_offset,
        )
    }

    pub fn is_special(&self) -> bool {
        self.flags & TEX_SPECIAL != 0
    }
}

/// A texture header from the texture lump. Pixel data lives with the renderer's
/// texture cache, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MipTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl MipTexture {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        MipTexture {
            name: name.to_string(),
            width,
            height,
        }
    }

    /// Sky, trigger, clip and similar tool textures.
    pub fn is_special(&self) -> bool {
        let lower = self.name.to_ascii_lowercase();
        SPECIAL_TEXTURE_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
    }
}
