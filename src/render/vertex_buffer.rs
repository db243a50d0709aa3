// src/render/vertex_buffer.rs

use bitflags::bitflags;
use byteorder::{ByteOrder, LE};
use glam::Vec3;

bitflags! {
    /// Attributes present in an interleaved vertex, in this order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexLayout: u32 {
        const POS_3F = 1 << 0;
        const TEX_2F = 1 << 1;
        const LIGHTMAP_2F = 1 << 2;
        const COLOR_3B = 1 << 3;
    }
}

impl VertexLayout {
    /// Size in bytes of one interleaved vertex.
    pub fn stride(self) -> usize {
        let mut stride = 0;
        if self.contains(VertexLayout::POS_3F) {
            stride += 12;
        }
        if self.contains(VertexLayout::TEX_2F) {
            stride += 8;
        }
        if self.contains(VertexLayout::LIGHTMAP_2F) {
            stride += 8;
        }
        if self.contains(VertexLayout::COLOR_3B) {
            stride += 3;
        }
        stride
    }
}

/// A vertex type that can be uploaded as an interleaved little-endian buffer.
pub trait Vertex: Copy + Send + Sync + 'static {
    const LAYOUT: VertexLayout;

    fn position(&self) -> Vec3;

    /// Writes the vertex into `out`, which is exactly `LAYOUT.stride()` bytes.
    fn write_le(&self, out: &mut [u8]);
}

/// Helper for `Vertex::write_le` implementations: writes floats back to back.
pub(crate) fn write_floats(out: &mut [u8], values: &[f32]) -> usize {
    for (i, value) in values.iter().enumerate() {
        LE::write_f32(&mut out[i * 4..i * 4 + 4], *value);
    }
    values.len() * 4
}

/// Packed vertex data ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexBuffer {
    pub layout: VertexLayout,
    pub vertex_count: usize,
    pub bytes: Vec<u8>,
}

impl VertexBuffer {
    pub fn from_vertices<V: Vertex>(vertices: &[V]) -> Self {
        let stride = V::LAYOUT.stride();
        let mut bytes = vec![0u8; stride * vertices.len()];
        for (vertex, chunk) in vertices.iter().zip(bytes.chunks_exact_mut(stride)) {
            vertex.write_le(chunk);
        }
        VertexBuffer {
            layout: V::LAYOUT,
            vertex_count: vertices.len(),
            bytes,
        }
    }

    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Reads back the position of vertex `index` (positions always come first).
    pub fn position(&self, index: usize) -> Option<Vec3> {
        if index >= self.vertex_count || !self.layout.contains(VertexLayout::POS_3F) {
            return None;
        }
        let base = index * self.stride();
        let bytes = &self.bytes[base..base + 12];
        Some(Vec3::new(
            LE::read_f32(&bytes[0..4]),
            LE::read_f32(&bytes[4..8]),
            LE::read_f32(&bytes[8..12]),
        ))
    }
}
