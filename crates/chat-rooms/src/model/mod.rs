//! # Chat Model
//!
//! Naming conventions and payload shapes shared by every chat cell. The mesh itself only
//! knows opaque ids and key/value payloads; this module is where they get a meaning.

pub mod fields;
pub mod ids;
pub mod room;

pub use fields::*;
pub use ids::*;
pub use room::{RoomInfo, RoomRef};
