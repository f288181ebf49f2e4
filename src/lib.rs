//! Dynamic lighting and shadow mapping for a small hecs + OpenGL engine.

pub mod app;
pub mod camera;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod lighting;
pub mod renderer;
pub mod scene;
pub mod systems;
