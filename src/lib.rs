// src/lib.rs

pub mod bsp;
pub mod config;
pub mod editor;
pub mod error;
pub mod map;
pub mod render;
#[cfg(feature = "gui")]
pub mod ui;
pub mod utils;

pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
