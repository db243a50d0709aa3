// src/utils/mod.rs
pub mod geometry;
pub mod util;

pub use geometry::{ray_plane_intersection, ray_triangle_intersection, Ray};
pub use util::{safe_normalize, try_normalize};
