//! Liked-songs cleaning library - shared modules for the CLI and tests.

pub mod artists;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod safety;
pub mod writer;
