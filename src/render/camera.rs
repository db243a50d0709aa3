// src/render/camera.rs
//! Free-flying editor camera.
//!
//! World space is Z-up. With zero yaw and pitch the camera looks down +Y with
//! +X to its right. Positive pitch looks down, positive yaw turns right.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::utils::util::{clamp, safe_normalize};

/// Degrees of rotation per pixel of mouse drag.
pub const DRAG_SENSITIVITY: f32 = 0.5;

/// Pitch is kept just short of straight up/down so the basis never collapses.
pub const MAX_PITCH: f32 = 89.0;

/// Frame rate the movement speed is tuned for.
pub const REFERENCE_FPS: f32 = 144.0;

const FAST_MULTIPLIER: f32 = 4.0;
const SLOW_MULTIPLIER: f32 = 0.25;

/// Orthonormal camera axes in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

/// Keys held this frame, as reported by the input layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub fast: bool,
    pub slow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub origin: Vec3,
    /// Degrees, positive looks down.
    pub pitch: f32,
    /// Degrees, positive turns right.
    pub yaw: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub move_speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            origin: Vec3::new(0.0, -50.0, 0.0),
            pitch: 0.0,
            yaw: 0.0,
            fov: 75.0,
            z_near: 1.0,
            z_far: 262144.0,
            move_speed: 4.0,
        }
    }
}

impl Camera {
    pub fn new(origin: Vec3) -> Self {
        Camera {
            origin,
            ..Default::default()
        }
    }

    /// Forward, right and up vectors.
    ///
    /// `right = forward × worldUp` and `up = right × forward`; a degenerate
    /// cross product falls back to a yaw-only right vector instead of dividing
    /// by zero.
    pub fn basis(&self) -> CameraBasis {
        let (pitch, yaw) = (self.pitch.to_radians(), self.yaw.to_radians());
        let forward = safe_normalize(
            Vec3::new(yaw.sin() * pitch.cos(), yaw.cos() * pitch.cos(), -pitch.sin()),
            Vec3::Y,
        );
        let yaw_right = Vec3::new(yaw.cos(), -yaw.sin(), 0.0);
        let right = safe_normalize(forward.cross(Vec3::Z), yaw_right);
        let up = safe_normalize(right.cross(forward), Vec3::Z);
        CameraBasis { forward, right, up }
    }

    /// Applies a right-mouse drag, in pixels.
    pub fn rotate_by_drag(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * DRAG_SENSITIVITY;
        self.pitch = clamp(self.pitch + dy * DRAG_SENSITIVITY, -MAX_PITCH, MAX_PITCH);
    }

    /// Wish direction for the held keys, scaled by speed modifiers.
    pub fn move_dir(&self, input: &MoveInput) -> Vec3 {
        let basis = self.basis();
        let mut wish = Vec3::ZERO;
        if input.left {
            wish -= basis.right;
        }
        if input.right {
            wish += basis.right;
        }
        if input.forward {
            wish += basis.forward;
        }
        if input.back {
            wish -= basis.forward;
        }

        wish *= self.move_speed;
        if input.fast {
            wish *= FAST_MULTIPLIER;
        }
        if input.slow {
            wish *= SLOW_MULTIPLIER;
        }
        wish
    }

    /// Moves the camera for one frame. `frame_time_scale` comes from
    /// [`frame_time_scale`].
    pub fn apply_movement(&mut self, input: &MoveInput, frame_time_scale: f32) {
        self.origin += self.move_dir(input) * frame_time_scale;
    }
}

/// Scale that keeps movement speed independent of frame rate.
pub fn frame_time_scale(fps: f32) -> f32 {
    if fps <= 0.0 || !fps.is_finite() {
        1.0
    } else {
        REFERENCE_FPS / fps
    }
}
