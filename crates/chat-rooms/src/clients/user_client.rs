//! # User Client
//!
//! Makes a user speak. Saying is fire-and-forget: moderation happens later in the room,
//! and a rejected message only shows up as a private warning to the user.
use std::time::Duration;

use cell_framework::{CellClient, CellId, Environment, Payload};
use tracing::{debug, instrument};

use crate::error::ChatError;
use crate::model::{room_id, user_id, MESSAGE, ROOM};
use crate::topics::SAY;

#[derive(Clone)]
pub struct UserClient {
    env: Environment,
    id: CellId,
    timeout: Duration,
}

impl UserClient {
    pub fn new(env: Environment, name: &str, timeout: Duration) -> Self {
        Self {
            env,
            id: user_id(name),
            timeout,
        }
    }

    #[instrument(skip(self, message), fields(user = %self.id))]
    pub fn say(&self, building: &str, room: &str, message: &str) -> Result<(), ChatError> {
        debug!("Sending event");
        let room = room_id(building, room);
        let payload = Payload::new().apply([(ROOM, room.as_str()), (MESSAGE, message)]);
        self.tell(SAY, payload)
    }
}

impl CellClient for UserClient {
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
