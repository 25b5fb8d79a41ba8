//! Cell id conventions.
//!
//! | Cell | Id |
//! |------|----|
//! | Building | `building:<building>` |
//! | Public address | `building:<building>:pa` |
//! | Room | `room:<building>:<room>` |
//! | Censor | `room:<building>:<room>:censor` |
//! | User | `user:<name>` |
//! | Gateway | `wsb:<name>:<uuid>` |

use cell_framework::{identifier, CellId};
use uuid::Uuid;

/// Sender id of trusted system messages. It is never a running cell.
pub const PUBLIC_ADDRESS_USER: &str = "user:public-address";

pub fn building_id(building: &str) -> CellId {
    identifier(&["building", building])
}

pub fn public_address_id(building: &str) -> CellId {
    building_id(building).child("pa")
}

pub fn room_id(building: &str, room: &str) -> CellId {
    identifier(&["room", building, room])
}

pub fn censor_id(building: &str, room: &str) -> CellId {
    room_id(building, room).child("censor")
}

pub fn user_id(name: &str) -> CellId {
    identifier(&["user", name])
}

/// A fresh id for one websocket connection of `name`.
pub fn gateway_id(name: &str) -> CellId {
    identifier(&["wsb", name, &Uuid::new_v4().to_string()])
}

/// Splits a room id back into `(building, room)`.
pub fn parse_room_id(id: &str) -> Option<(&str, &str)> {
    let mut parts = id.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("room"), Some(building), Some(room), None) => Some((building, room)),
        _ => None,
    }
}
