//! # Mesh Errors
//!
//! This module defines the error types shared by the environment, the cell runtime and
//! the typed clients. Moderation outcomes and other domain answers are *responses*, not
//! errors; only failures of the mesh itself show up here.

use std::time::Duration;

use crate::id::CellId;

/// Boxed error returned by [`Behavior`](crate::Behavior) hooks.
///
/// Any `std::error::Error + Send + Sync` converts into it with `?`, so each behavior can
/// keep its own `thiserror` enum.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur within the mesh itself.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Cell not found: {0}")]
    NotFound(CellId),
    #[error("Cell already exists: {0}")]
    AlreadyExists(CellId),
    #[error("Cell crashed: {0}")]
    Crashed(CellId),
    #[error("Cell is stopping: {0}")]
    Closed(CellId),
    #[error("Request '{topic}' to {target} timed out after {after:?}")]
    Timeout {
        target: CellId,
        topic: String,
        after: Duration,
    },
    #[error("Cell {0} cannot request itself")]
    SelfRequest(CellId),
    #[error("Cell {id} failed to initialize: {reason}")]
    InitFailed { id: CellId, reason: String },
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MeshError {
    /// `true` for the "no answer" case, as opposed to every other failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MeshError::Timeout { .. })
    }
}
