//! Topics understood by the chat cells.
//!
//! Names ending in `!` are commands, names ending in `?` are queries. `user-count!` keeps
//! its historical spelling even though it is answered like a query.

/// A message for everybody subscribed to the emitting cell.
pub const SAYS_ALL: &str = "says-all";
/// A message for one user, named in the `to` field.
pub const SAYS_TO: &str = "says-to";
/// Sent to a user cell: speak `message` in `room`.
pub const SAY: &str = "say!";
/// Sent to a censor: accept (`true`) or reject (`false`) `message` from `from`.
pub const CENSOR: &str = "censor!";
pub const USER_ADDED: &str = "user-added";
pub const USER_REMOVED: &str = "user-removed";
pub const USER_DISCONNECTED: &str = "user-disconnected";
pub const ROOM_ADDED: &str = "room-added";
pub const IN_ROOM: &str = "in-room?";
pub const USER_COUNT: &str = "user-count!";
pub const LIST_ROOMS: &str = "list-rooms!";
/// Sent to a public address: broadcast `message` as a trusted announcement.
pub const ANNOUNCE: &str = "announce!";
/// Sent to a censor: cumulative warnings of `user`.
pub const WARNINGS: &str = "warnings?";
