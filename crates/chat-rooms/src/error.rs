//! Error types of the chat cells and their clients.

use cell_framework::{CellId, MeshError};
use serde_json::Value;
use thiserror::Error;

/// Errors raised by chat behaviors and returned by the typed clients.
///
/// A censor rejecting a message is *not* an error: it is a `false` answer to the
/// `censor!` request.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Building not found: {0}")]
    BuildingNotFound(CellId),

    #[error("Room not found: {0}")]
    RoomNotFound(CellId),

    /// The name maps onto the sender id of the public address.
    #[error("User name is reserved: {0}")]
    ReservedName(CellId),

    #[error("{user} is not in {room}")]
    NotInRoom { user: CellId, room: CellId },

    #[error("Event '{topic}' is missing field '{field}'")]
    MissingField { topic: String, field: &'static str },

    /// A `says-all` reached a building from somebody other than the public address.
    #[error("Untrusted announcement from '{0}'")]
    UntrustedAnnouncement(String),

    #[error("Unexpected answer to '{topic}': {value}")]
    UnexpectedResponse { topic: &'static str, value: Value },

    /// An error occurred while talking to the mesh.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}
