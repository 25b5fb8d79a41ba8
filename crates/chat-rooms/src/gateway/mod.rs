//! # Websocket Gateway
//!
//! Bridges external websocket clients into the mesh. Each connection gets:
//!
//! - a [`GatewayBehavior`] cell (`wsb:<name>:<uuid>`) subscribed to its room, turning
//!   mesh messages into outbound JSON frames,
//! - a [`User`](crate::user::User) cell speaking for the client,
//! - a [`GatewaySession`] pumping frames in both directions.
//!
//! Sessions are generic over any `Stream`/`Sink` of axum websocket [`Message`]s, so they
//! can be driven by in-memory channels in tests.
//!
//! [`Message`]: axum::extract::ws::Message

pub mod behavior;
pub mod error;
pub mod session;

pub use behavior::GatewayBehavior;
pub use error::GatewayError;
pub use session::{run_session, GatewaySession, OUTBOUND_QUEUE};
