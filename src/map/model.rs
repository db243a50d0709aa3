// src/map/model.rs
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A brush model. Model 0 is the world; the others are referenced by brush
/// entities through their `"model" "*N"` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushModel {
    pub mins: Vec3,
    pub maxs: Vec3,
    #[serde(default)]
    pub origin: Vec3,
    pub first_face: usize,
    pub num_faces: usize,
}

impl BrushModel {
    pub fn new(mins: Vec3, maxs: Vec3, first_face: usize, num_faces: usize) -> Self {
        BrushModel {
            mins,
            maxs,
            origin: Vec3::ZERO,
            first_face,
            num_faces,
        }
    }

    /// Face indices owned by this model.
    pub fn faces(&self) -> std::ops::Range<usize> {
        self.first_face..self.first_face.saturating_add(self.num_faces)
    }
}
