//! Error types for websocket sessions.

use std::time::Duration;

use cell_framework::{CellId, MeshError};
use thiserror::Error;

use crate::error::ChatError;

/// Why a session could not be opened or why it ended.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Room not found: {0}")]
    RoomNotFound(CellId),

    /// Another connection already speaks under this name.
    #[error("Name already connected: {0}")]
    NameTaken(CellId),

    #[error("No frame from peer within {0:?}")]
    ReadTimeout(Duration),

    #[error("Frame write did not finish within {0:?}")]
    WriteTimeout(Duration),

    #[error("Frame of {size} bytes exceeds the limit of {limit} bytes")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}
