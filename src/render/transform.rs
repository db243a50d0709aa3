// src/render/transform.rs

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::render::camera::Camera;

/// Framebuffer size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Viewport { width, height }
    }

    /// Width over height; a zero-height viewport reports 1.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// The matrices for one frame.
///
/// Built once per frame from a camera snapshot and handed to the renderer and
/// the picker; nothing here is global. Only the model matrix changes during
/// the frame, through [`FrameTransforms::set_model`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub camera: Camera,
    pub viewport: Viewport,
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
    pub model_view: Mat4,
    pub model_view_projection: Mat4,
}

impl FrameTransforms {
    pub fn new(camera: &Camera, viewport: Viewport) -> Self {
        let projection = Mat4::perspective_rh_gl(
            camera.fov.to_radians(),
            viewport.aspect(),
            camera.z_near,
            camera.z_far,
        );
        let mut frame = FrameTransforms {
            camera: *camera,
            viewport,
            projection,
            view: view_matrix(camera),
            model: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            model_view_projection: Mat4::IDENTITY,
        };
        frame.update();
        frame
    }

    /// Replaces the model matrix and recomputes the derived products.
    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
        self.update();
    }

    pub fn load_identity(&mut self) {
        self.set_model(Mat4::IDENTITY);
    }

    fn update(&mut self) {
        self.model_view = self.view * self.model;
        self.model_view_projection = self.projection * self.model_view;
    }

    /// Projects a world point to pixel coordinates (origin top-left).
    /// Points behind the camera return `None`.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.model_view_projection * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width as f32,
            (1.0 - ndc.y) * 0.5 * self.viewport.height as f32,
        ))
    }
}

/// World (Z-up) to GL eye space: rotateX(pitch) after the Z-up base rotation,
/// then rotateZ(yaw), then the camera translation.
pub fn view_matrix(camera: &Camera) -> Mat4 {
    Mat4::from_rotation_x((camera.pitch - 90.0).to_radians())
        * Mat4::from_rotation_z(camera.yaw.to_radians())
        * Mat4::from_translation(-camera.origin)
}
