//! # Room
//!
//! Rooms hold the membership of one chat room and gate every broadcast through a private
//! [`Censor`]. Users and gateways subscribe to the room; the room subscribes to its
//! censor and to its building's public address.
//!
//! ```text
//! building:<b>:pa ──> room:<b>:<r> ──> user:<name>
//! room:<b>:<r>:censor ──┘       └────> wsb:<name>:<uuid>
//! ```
//!
//! Rooms are created with [`add_room`](crate::building::add_room); users join through
//! [`add_user`](crate::user::add_user).

pub mod censor;
pub mod entity;

pub use censor::Censor;
pub use entity::Room;
