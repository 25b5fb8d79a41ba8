//! [`Behavior`] implementation for [`Building`].

use std::collections::BTreeSet;

use async_trait::async_trait;
use cell_framework::{Behavior, BoxError, CellContext, Event};
use serde_json::Value;
use tracing::info;

use crate::error::ChatError;
use crate::model::{required, FROM, PUBLIC_ADDRESS_USER, ROOM};
use crate::topics::{LIST_ROOMS, ROOM_ADDED, SAYS_ALL};

/// Directory of the rooms in one building.
///
/// Subscribed to its public address; relays the announcements to its own subscribers.
pub struct Building {
    name: String,
    rooms: BTreeSet<String>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rooms: BTreeSet::new(),
        }
    }
}

#[async_trait]
impl Behavior for Building {
    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        match event.topic() {
            ROOM_ADDED => {
                let room = required(&event, ROOM)?;
                if self.rooms.insert(room.to_string()) {
                    info!(building = %self.name, room, "Room added");
                }
            }
            LIST_ROOMS => {
                let rooms: Vec<Value> = self.rooms.iter().map(|r| Value::from(r.as_str())).collect();
                event.respond(rooms);
            }
            SAYS_ALL => {
                let from = required(&event, FROM)?;
                if from != PUBLIC_ADDRESS_USER {
                    return Err(ChatError::UntrustedAnnouncement(from.to_string()).into());
                }
                ctx.emit(event)?;
            }
            _ => {}
        }
        Ok(())
    }
}
