// src/ui/mod.rs
pub mod inspector;

pub use inspector::Inspector;
