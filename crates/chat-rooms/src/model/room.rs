use serde::{Deserialize, Serialize};

/// One entry of the room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub id: String,
    pub building: String,
    pub room: String,
}

impl RoomRef {
    /// Builds the entry from a room id; `None` if `id` is not a room id.
    pub fn from_id(id: &str) -> Option<Self> {
        let (building, room) = super::ids::parse_room_id(id)?;
        Some(Self {
            id: id.to_string(),
            building: building.to_string(),
            room: room.to_string(),
        })
    }
}

/// Occupancy of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room: String,
    pub users: usize,
}
