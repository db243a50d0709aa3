// src/map/plane.rs
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A BSP splitting plane: the points `p` with `dot(normal, p) == dist`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

impl Plane {
    pub fn new(normal: Vec3, dist: f32) -> Self {
        Plane { normal, dist }
    }

    /// Signed distance of `point` from the plane (positive in front).
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.dist
    }

    /// The same plane seen from its back side.
    pub fn flipped(&self) -> Plane {
        Plane {
            normal: -self.normal,
            dist: -self.dist,
        }
    }
}
