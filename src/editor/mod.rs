// src/editor/mod.rs

pub mod commands;
pub mod core;

pub use commands::{Command, CommandType};
pub use self::core::Editor;
