//! # Building Client
//!
//! Read access to the room directory of a building.
use std::time::Duration;

use cell_framework::{CellClient, CellId, Environment, Payload};
use tracing::{debug, instrument};

use crate::error::ChatError;
use crate::model::building_id;
use crate::topics::LIST_ROOMS;

#[derive(Clone)]
pub struct BuildingClient {
    env: Environment,
    id: CellId,
    timeout: Duration,
}

impl BuildingClient {
    pub fn new(env: Environment, building: &str, timeout: Duration) -> Self {
        Self {
            env,
            id: building_id(building),
            timeout,
        }
    }

    /// Ids of every room in the building, sorted.
    #[instrument(skip(self), fields(building = %self.id))]
    pub async fn list_rooms(&self) -> Result<Vec<String>, ChatError> {
        debug!("Sending request");
        self.query(LIST_ROOMS, Payload::new()).await
    }
}

impl CellClient for BuildingClient {
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
