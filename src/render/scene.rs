// src/render/scene.rs
//! Draw pass over every loaded map.
//!
//! The renderer never talks to a graphics API directly. Everything goes
//! through a [`DrawBackend`], so the same pass can drive a GPU context, the
//! egui preview or a [`RecordingBackend`] in tests and the CLI.

use glam::Mat4;
use log::trace;

use crate::bsp::bsp_pick::PickResult;
use crate::bsp::map_renderer::MapRenderer;
use crate::bsp::{MapBatches, MaterialKey, RenderFlags};
use crate::render::primitives::Color3;
use crate::render::transform::FrameTransforms;
use crate::render::vertex_buffer::VertexBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderProgram {
    /// Texture × lightmap, for BSP faces.
    Lightmapped,
    /// Per-vertex color, for point entities.
    Colored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    Wireframe,
}

/// What to sample for the next draws. `None` means the white/fullbright default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialBinding {
    pub texture: Option<usize>,
    pub lightmap_page: Option<usize>,
}

impl MaterialBinding {
    pub fn for_key(key: &MaterialKey, flags: RenderFlags) -> Self {
        MaterialBinding {
            texture: key.texture.filter(|_| flags.contains(RenderFlags::TEXTURES)),
            lightmap_page: key.lightmap_page.filter(|_| flags.contains(RenderFlags::LIGHTMAPS)),
        }
    }
}

pub trait DrawBackend {
    fn bind_program(&mut self, program: ShaderProgram);
    fn set_matrices(&mut self, frame: &FrameTransforms);
    fn bind_material(&mut self, material: MaterialBinding);
    /// `Some` tints every following draw until cleared.
    fn set_highlight(&mut self, color: Option<[f32; 4]>);
    fn draw(&mut self, buffer: &VertexBuffer, first_vertex: usize, vertex_count: usize, mode: DrawMode);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    BindProgram(ShaderProgram),
    SetMatrices(Mat4),
    BindMaterial(MaterialBinding),
    SetHighlight(Option<[f32; 4]>),
    Draw {
        first_vertex: usize,
        vertex_count: usize,
        mode: DrawMode,
        highlighted: bool,
    },
}

/// A backend that only remembers what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub calls: Vec<DrawCall>,
    highlight: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Draw { .. }))
    }

    pub fn highlighted_draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Draw { highlighted: true, .. }))
    }

    pub fn clear(&mut self) {
        self.calls.clear();
        self.highlight = false;
    }
}

impl DrawBackend for RecordingBackend {
    fn bind_program(&mut self, program: ShaderProgram) {
        self.calls.push(DrawCall::BindProgram(program));
    }

    fn set_matrices(&mut self, frame: &FrameTransforms) {
        self.calls.push(DrawCall::SetMatrices(frame.model_view_projection));
    }

    fn bind_material(&mut self, material: MaterialBinding) {
        self.calls.push(DrawCall::BindMaterial(material));
    }

    fn set_highlight(&mut self, color: Option<[f32; 4]>) {
        self.highlight = color.is_some();
        self.calls.push(DrawCall::SetHighlight(color));
    }

    fn draw(&mut self, _buffer: &VertexBuffer, first_vertex: usize, vertex_count: usize, mode: DrawMode) {
        self.calls.push(DrawCall::Draw {
            first_vertex,
            vertex_count,
            mode,
            highlighted: self.highlight,
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub triangles: usize,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneRenderer {
    pub highlight_color: Color3,
    pub highlight_alpha: f32,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        SceneRenderer {
            highlight_color: Color3::new(255, 32, 32),
            highlight_alpha: 0.5,
        }
    }
}

impl SceneRenderer {
    pub fn new(highlight_color: Color3) -> Self {
        SceneRenderer {
            highlight_color,
            ..Default::default()
        }
    }

    /// Draws every map, then the highlight for the current pick.
    pub fn render<B: DrawBackend>(
        &self,
        backend: &mut B,
        frame: &mut FrameTransforms,
        maps: &[MapRenderer],
        pick: &PickResult,
        flags: RenderFlags,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let mode = if flags.contains(RenderFlags::WIREFRAME) {
            DrawMode::Wireframe
        } else {
            DrawMode::Triangles
        };

        for (i, map) in maps.iter().enumerate() {
            let batches = map.batches();
            frame.load_identity();

            backend.bind_program(ShaderProgram::Lightmapped);
            backend.set_matrices(frame);
            for batch in batches.faces.values() {
                if batch.is_empty() || !batch.key.class.is_visible(flags) {
                    continue;
                }
                backend.bind_material(MaterialBinding::for_key(&batch.key, flags));
                backend.draw(&batch.buffer, 0, batch.buffer.vertex_count, mode);
                stats.draw_calls += 1;
                stats.triangles += batch.triangle_count();
            }

            let points = &batches.point_entities;
            if flags.contains(RenderFlags::POINT_ENTITIES) && !points.is_empty() {
                backend.bind_program(ShaderProgram::Colored);
                backend.set_matrices(frame);
                backend.draw(&points.buffer, 0, points.buffer.vertex_count, mode);
                stats.draw_calls += 1;
                stats.triangles += points.triangle_count();
            }

            if pick.valid && pick.map_index == Some(i) {
                stats.highlighted |= self.draw_highlight(backend, frame, &batches, pick, flags);
            }
        }

        trace!("Frame: {} draws, {} triangles", stats.draw_calls, stats.triangles);
        stats
    }

    /// Redraws only the picked span, tinted. Returns whether anything was drawn.
    fn draw_highlight<B: DrawBackend>(
        &self,
        backend: &mut B,
        frame: &FrameTransforms,
        batches: &MapBatches,
        pick: &PickResult,
        flags: RenderFlags,
    ) -> bool {
        let entity = match pick.entity_index {
            Some(entity) => entity,
            None => return false,
        };
        let color = Some(self.highlight_color.to_rgba(self.highlight_alpha));

        match pick.face_index {
            Some(face) => {
                let (batch, span) = match batches.face_span(entity, face) {
                    Some(found) => found,
                    None => return false,
                };
                if !batch.key.class.is_visible(flags) {
                    return false;
                }
                backend.bind_program(ShaderProgram::Lightmapped);
                backend.set_matrices(frame);
                backend.bind_material(MaterialBinding::for_key(&batch.key, flags));
                backend.set_highlight(color);
                backend.draw(&batch.buffer, span.first_vertex, span.vertex_count, DrawMode::Triangles);
            }
            None => {
                if !flags.contains(RenderFlags::POINT_ENTITIES) {
                    return false;
                }
                let span = match batches.point_entity_span(entity) {
                    Some(span) => span,
                    None => return false,
                };
                backend.bind_program(ShaderProgram::Colored);
                backend.set_matrices(frame);
                backend.set_highlight(color);
                backend.draw(
                    &batches.point_entities.buffer,
                    span.first_vertex,
                    span.vertex_count,
                    DrawMode::Triangles,
                );
            }
        }
        backend.set_highlight(None);
        true
    }
}
