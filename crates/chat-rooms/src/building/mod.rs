//! # Building
//!
//! A building is the root of the chat hierarchy: a [`Building`] cell keeping the room
//! directory plus a [`PublicAddress`] cell making trusted announcements.
//!
//! ## Wiring
//!
//! ```text
//! building:<b>:pa ──> building:<b>
//!        │
//!        └──────────> room:<b>:<r>   (one edge per room)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use cell_framework::Environment;
//! use chat_rooms::building::{add_building, add_room};
//! use chat_rooms::clients::BuildingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let env = Environment::new();
//!     add_building(&env, "school", None).await?;
//!     add_room(&env, "school", "cafeteria", &["hell".to_string()], Duration::from_secs(1)).await?;
//!
//!     let rooms = BuildingClient::new(env.clone(), "school", Duration::from_secs(1))
//!         .list_rooms()
//!         .await?;
//!     assert_eq!(rooms, vec!["room:school:cafeteria".to_string()]);
//!     env.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod entity;
pub mod public_address;

pub use entity::Building;
pub use public_address::PublicAddress;

use std::time::Duration;

use cell_framework::{CellId, Environment, Payload};
use tracing::info;

use crate::error::ChatError;
use crate::model::{building_id, public_address_id, room_id, ROOM};
use crate::room::Room;
use crate::topics::ROOM_ADDED;

/// Starts building `name` and its public address, announcing every `announce_interval`.
pub async fn add_building(
    env: &Environment,
    name: &str,
    announce_interval: Option<Duration>,
) -> Result<CellId, ChatError> {
    let id = building_id(name);
    env.start_cell(id.clone(), Building::new(name)).await?;

    let pa = public_address_id(name);
    env.start_cell(pa.clone(), PublicAddress::new(announce_interval))
        .await?;
    env.subscribe(pa.as_str(), id.as_str())?;

    info!(building = %id, "Building opened");
    Ok(id)
}

/// Starts `room` in `building` with its own censor and registers it with the building.
pub async fn add_room(
    env: &Environment,
    building: &str,
    room: &str,
    censored_words: &[String],
    censor_timeout: Duration,
) -> Result<CellId, ChatError> {
    let building_cell = building_id(building);
    if !env.has_cell(building_cell.as_str()) {
        return Err(ChatError::BuildingNotFound(building_cell));
    }

    let id = room_id(building, room);
    let behavior = Room::new(building, room, censored_words.to_vec(), censor_timeout);
    env.start_cell(id.clone(), behavior).await?;

    env.subscribe(public_address_id(building).as_str(), id.as_str())?;
    env.deliver_new(
        building_cell.as_str(),
        ROOM_ADDED,
        Payload::new().apply([(ROOM, id.as_str())]),
    )?;

    Ok(id)
}
