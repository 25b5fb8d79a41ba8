//! # Censor Client
use std::time::Duration;

use cell_framework::{CellClient, CellId, Environment, Payload};
use tracing::{debug, instrument};

use crate::error::ChatError;
use crate::model::{censor_id, user_id, USER};
use crate::topics::WARNINGS;

#[derive(Clone)]
pub struct CensorClient {
    env: Environment,
    id: CellId,
    timeout: Duration,
}

impl CensorClient {
    pub fn new(env: Environment, building: &str, room: &str, timeout: Duration) -> Self {
        Self {
            env,
            id: censor_id(building, room),
            timeout,
        }
    }

    /// How often user `name` has been warned in this room.
    #[instrument(skip(self), fields(censor = %self.id))]
    pub async fn warnings(&self, name: &str) -> Result<u64, ChatError> {
        debug!("Sending request");
        let payload = Payload::new().apply([(USER, user_id(name).as_str())]);
        self.query(WARNINGS, payload).await
    }
}

impl CellClient for CensorClient {
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
