//! Render pipeline for ScenePose scenes.
//!
//! This crate turns a `scenepose_core::SceneState` into a [`DisplayList`]
//! of backend-neutral draw commands. It knows nothing about surfaces;
//! a [`RenderBackend`] implementation (the host's canvas glue) replays
//! the list each frame.

pub mod display_list;

pub use display_list::{
    render_bucket, render_scene, DisplayList, DrawCommand, HANDLE_FILL, SELECTION_COLOR,
};

use thiserror::Error;

/// Errors surfaced by a backend replaying a display list.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("surface unavailable")]
    SurfaceUnavailable,
}

/// Something that can execute a display list onto a surface.
pub trait RenderBackend {
    fn execute(&mut self, list: &DisplayList) -> Result<(), RenderError>;
}
