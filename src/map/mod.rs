// src/map/mod.rs
pub mod entity;
pub mod face;
pub mod level;
pub mod model;
pub mod plane;
pub mod texinfo;

pub use entity::Entity;
pub use face::Face;
pub use level::Level;
pub use model::BrushModel;
pub use plane::Plane;
pub use texinfo::{MipTexture, TexInfo, TEX_SPECIAL};
