//! CLI command implementations.

pub mod common;
pub mod presets;
pub mod render;
pub mod retune;
pub mod scale;
