//! # Public Address Client
use std::time::Duration;

use cell_framework::{CellClient, CellId, Environment, Payload};
use tracing::{debug, instrument};

use crate::error::ChatError;
use crate::model::{public_address_id, MESSAGE};
use crate::topics::ANNOUNCE;

#[derive(Clone)]
pub struct PublicAddressClient {
    env: Environment,
    id: CellId,
    timeout: Duration,
}

impl PublicAddressClient {
    pub fn new(env: Environment, building: &str, timeout: Duration) -> Self {
        Self {
            env,
            id: public_address_id(building),
            timeout,
        }
    }

    /// Broadcasts `message` to the building and every room. Returns the number of cells
    /// the announcement reached directly.
    #[instrument(skip(self), fields(pa = %self.id))]
    pub async fn announce(&self, message: &str) -> Result<usize, ChatError> {
        debug!("Sending request");
        self.query(ANNOUNCE, Payload::new().apply([(MESSAGE, message)]))
            .await
    }
}

impl CellClient for PublicAddressClient {
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
