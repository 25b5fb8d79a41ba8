//! # Chat Rooms
//!
//! A moderated chat server built on [`cell_framework`].
//!
//! ## Cells
//!
//! | Cell | Id | Role |
//! |------|----|------|
//! | [`Building`](building::Building) | `building:<b>` | room directory |
//! | [`PublicAddress`](building::PublicAddress) | `building:<b>:pa` | trusted announcements |
//! | [`Room`](room::Room) | `room:<b>:<r>` | membership and moderated broadcast |
//! | [`Censor`](room::Censor) | `room:<b>:<r>:censor` | word filter and warnings |
//! | [`User`](user::User) | `user:<name>` | speaks into a room |
//! | [`GatewayBehavior`](gateway::GatewayBehavior) | `wsb:<name>:<uuid>` | websocket bridge |
//!
//! ## Modules
//!
//! - **[model]**: ids, payload field names and the JSON shapes of the HTTP API.
//! - **[topics]**: every event topic the cells understand.
//! - **[clients]**: typed request wrappers, one per kind of cell.
//! - **[gateway]**: the websocket session pumps.
//! - **[server]**: the axum router.
//! - **[lifecycle]**: [`ChatSystem`](lifecycle::ChatSystem) and tracing setup.

pub mod building;
pub mod clients;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod model;
pub mod room;
pub mod server;
pub mod topics;
pub mod user;

pub use config::ChatConfig;
pub use error::ChatError;
pub use lifecycle::ChatSystem;
