//! # Room Client
//!
//! Membership queries and joining for one room.
use std::time::Duration;

use cell_framework::{CellClient, CellId, Environment, Payload};
use tracing::{debug, instrument};

use crate::error::ChatError;
use crate::model::{room_id, user_id, USER};
use crate::topics::{IN_ROOM, USER_COUNT};

#[derive(Clone)]
pub struct RoomClient {
    env: Environment,
    id: CellId,
    building: String,
    room: String,
    timeout: Duration,
}

impl RoomClient {
    pub fn new(env: Environment, building: &str, room: &str, timeout: Duration) -> Self {
        Self {
            env,
            id: room_id(building, room),
            building: building.to_string(),
            room: room.to_string(),
            timeout,
        }
    }

    /// Whether user `name` is a member.
    #[instrument(skip(self), fields(room = %self.id))]
    pub async fn in_room(&self, name: &str) -> Result<bool, ChatError> {
        debug!("Sending request");
        let payload = Payload::new().apply([(USER, user_id(name).as_str())]);
        self.query(IN_ROOM, payload).await
    }

    #[instrument(skip(self), fields(room = %self.id))]
    pub async fn user_count(&self) -> Result<usize, ChatError> {
        debug!("Sending request");
        self.query(USER_COUNT, Payload::new()).await
    }

    /// Starts user `name` and lets it join this room.
    pub async fn add_user(&self, name: &str) -> Result<CellId, ChatError> {
        crate::user::add_user(&self.env, &self.building, &self.room, name).await
    }
}

impl CellClient for RoomClient {
    type Error = ChatError;

    fn environment(&self) -> &Environment {
        &self.env
    }

    fn cell_id(&self) -> &CellId {
        &self.id
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
