//! Error types for the host-facing collaborators.
//!
//! The simulation itself never fails: missing preconditions skip the action
//! for that frame. Only the render, storage and asset boundaries can report
//! errors, and none of them may end the session.

use std::io;

/// A fault raised while drawing a frame.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Render backend error: {0}")]
    Backend(String),

    #[error("Render surface lost")]
    SurfaceLost,

    #[error("Render collaborator panicked: {0}")]
    Panicked(String),
}

/// Failure to load or save persisted data (settings, high scores).
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable")]
    Unavailable,
}

/// A decorative resource that could not be provided.
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("Sprite not loaded: {0}")]
    MissingSprite(&'static str),
}
