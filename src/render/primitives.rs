// src/render/primitives.rs
//! Vertex value types and the quad/cube builders used for overlays, point
//! entities and sky boxes.
//!
//! Quads are emitted as two triangles fanned around the first corner
//! (`v1 v2 v3`, `v1 v3 v4`). Cubes are six such quads wound counter-clockwise
//! when seen from outside, with each face's UV origin chosen so a texture wraps
//! seamlessly around an inside-out sky box.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::render::vertex_buffer::{write_floats, Vertex, VertexLayout};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color3 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color3 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color3 { r, g, b }
    }

    pub const WHITE: Color3 = Color3::new(255, 255, 255);

    /// Normalized RGBA, for shader uniforms.
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha,
        ]
    }
}

/// Position + texture coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TexturedVertex {
    pub position: Vec3,
    pub uv: Vec2,
}

impl TexturedVertex {
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        TexturedVertex { position, uv }
    }
}

impl Vertex for TexturedVertex {
    const LAYOUT: VertexLayout = VertexLayout::POS_3F.union(VertexLayout::TEX_2F);

    fn position(&self) -> Vec3 {
        self.position
    }

    fn write_le(&self, out: &mut [u8]) {
        let p = self.position;
        write_floats(out, &[p.x, p.y, p.z, self.uv.x, self.uv.y]);
    }
}

/// Position + flat color.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColoredVertex {
    pub position: Vec3,
    pub color: Color3,
}

impl ColoredVertex {
    pub fn new(position: Vec3, color: Color3) -> Self {
        ColoredVertex { position, color }
    }
}

impl Vertex for ColoredVertex {
    const LAYOUT: VertexLayout = VertexLayout::POS_3F.union(VertexLayout::COLOR_3B);

    fn position(&self) -> Vec3 {
        self.position
    }

    fn write_le(&self, out: &mut [u8]) {
        let p = self.position;
        let n = write_floats(out, &[p.x, p.y, p.z]);
        out[n] = self.color.r;
        out[n + 1] = self.color.g;
        out[n + 2] = self.color.b;
    }
}

/// Position + texture coordinate + lightmap atlas coordinate, for BSP faces.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightmapVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub lightmap_uv: Vec2,
}

impl Vertex for LightmapVertex {
    const LAYOUT: VertexLayout = VertexLayout::POS_3F
        .union(VertexLayout::TEX_2F)
        .union(VertexLayout::LIGHTMAP_2F);

    fn position(&self) -> Vec3 {
        self.position
    }

    fn write_le(&self, out: &mut [u8]) {
        let p = self.position;
        write_floats(
            out,
            &[
                p.x,
                p.y,
                p.z,
                self.uv.x,
                self.uv.y,
                self.lightmap_uv.x,
                self.lightmap_uv.y,
            ],
        );
    }
}

/// Fans four corners into two triangles.
fn fan_quad<V: Copy>(v1: V, v2: V, v3: V, v4: V) -> [V; 6] {
    [v1, v2, v3, v1, v3, v4]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedQuad {
    pub verts: [TexturedVertex; 6],
}

impl TexturedQuad {
    /// A screen-space rectangle at z = 0 covering the whole texture.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::with_uv(x, y, w, h, 0.0, 0.0, 1.0, 1.0)
    }

    /// A screen-space rectangle showing the texture sub-rectangle
    /// `(u1, v1)`–`(u2, v2)`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_uv(x: f32, y: f32, w: f32, h: f32, u1: f32, v1: f32, u2: f32, v2: f32) -> Self {
        let corner = |px: f32, py: f32, u: f32, v: f32| {
            TexturedVertex::new(Vec3::new(px, py, 0.0), Vec2::new(u, v))
        };
        Self::from_corners(
            corner(x, y, u1, v1),
            corner(x, y + h, u1, v2),
            corner(x + w, y + h, u2, v2),
            corner(x + w, y, u2, v1),
        )
    }

    pub fn from_corners(
        v1: TexturedVertex,
        v2: TexturedVertex,
        v3: TexturedVertex,
        v4: TexturedVertex,
    ) -> Self {
        TexturedQuad {
            verts: fan_quad(v1, v2, v3, v4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredQuad {
    pub verts: [ColoredVertex; 6],
}

impl ColoredQuad {
    pub fn from_corners(v1: ColoredVertex, v2: ColoredVertex, v3: ColoredVertex, v4: ColoredVertex) -> Self {
        ColoredQuad {
            verts: fan_quad(v1, v2, v3, v4),
        }
    }

    pub fn set_color(&mut self, c: Color3) {
        for v in self.verts.iter_mut() {
            v.color = c;
        }
    }

    /// Colors the four corners individually (in `from_corners` order).
    pub fn set_corner_colors(&mut self, c1: Color3, c2: Color3, c3: Color3, c4: Color3) {
        let colors = fan_quad(c1, c2, c3, c4);
        for (v, c) in self.verts.iter_mut().zip(colors) {
            v.color = c;
        }
    }
}

/// Corner positions of the six cube faces, each listed counter-clockwise when
/// seen from outside, starting at the corner that gets UV (0, 0).
///
/// Order: -X, +X, -Y, +Y, -Z, +Z.
fn cube_faces(mins: Vec3, maxs: Vec3) -> [[Vec3; 4]; 6] {
    let (a, b) = (mins, maxs);
    [
        [
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(a.x, a.y, b.z),
        ],
        [
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, a.y, a.z),
        ],
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, a.y, b.z),
        ],
        [
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
        ],
        [
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, a.y, a.z),
        ],
        [
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
        ],
    ]
}

const CUBE_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
];

/// A textured box; see the module docs for winding and UV layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedCube {
    /// Faces in -X, +X, -Y, +Y, -Z, +Z order.
    pub faces: [TexturedQuad; 6],
}

impl TexturedCube {
    pub fn new(mins: Vec3, maxs: Vec3) -> Self {
        let faces = cube_faces(mins, maxs).map(|c| {
            TexturedQuad::from_corners(
                TexturedVertex::new(c[0], CUBE_UVS[0]),
                TexturedVertex::new(c[1], CUBE_UVS[1]),
                TexturedVertex::new(c[2], CUBE_UVS[2]),
                TexturedVertex::new(c[3], CUBE_UVS[3]),
            )
        });
        TexturedCube { faces }
    }

    pub fn vertices(&self) -> Vec<TexturedVertex> {
        self.faces.iter().flat_map(|q| q.verts).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredCube {
    /// Faces in -X, +X, -Y, +Y, -Z, +Z order.
    pub faces: [ColoredQuad; 6],
}

impl ColoredCube {
    pub fn new(mins: Vec3, maxs: Vec3, color: Color3) -> Self {
        let faces = cube_faces(mins, maxs).map(|c| {
            ColoredQuad::from_corners(
                ColoredVertex::new(c[0], color),
                ColoredVertex::new(c[1], color),
                ColoredVertex::new(c[2], color),
                ColoredVertex::new(c[3], color),
            )
        });
        ColoredCube { faces }
    }

    pub fn set_color(&mut self, c: Color3) {
        for face in self.faces.iter_mut() {
            face.set_color(c);
        }
    }

    /// Colors each face, in -X, +X, -Y, +Y, -Z, +Z order.
    pub fn set_face_colors(&mut self, colors: [Color3; 6]) {
        for (face, c) in self.faces.iter_mut().zip(colors) {
            face.set_color(c);
        }
    }

    pub fn vertices(&self) -> Vec<ColoredVertex> {
        self.faces.iter().flat_map(|q| q.verts).collect()
    }
}
