// src/render/mod.rs
pub mod camera;
pub mod primitives;
pub mod scene;
pub mod transform;
pub mod vertex_buffer;

pub use camera::{Camera, CameraBasis, MoveInput};
pub use primitives::{Color3, ColoredCube, ColoredQuad, ColoredVertex, LightmapVertex, TexturedCube, TexturedQuad, TexturedVertex};
pub use scene::{DrawBackend, DrawCall, DrawMode, FrameStats, MaterialBinding, RecordingBackend, SceneRenderer, ShaderProgram};
pub use transform::{FrameTransforms, Viewport};
pub use vertex_buffer::{Vertex, VertexBuffer, VertexLayout};
