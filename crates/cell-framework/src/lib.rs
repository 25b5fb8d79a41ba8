//! # Cell Framework
//!
//! This crate provides the building blocks of an **actor mesh**: a runtime in which every
//! entity ("cell") runs its own single-threaded processing loop and talks to the others
//! only through topic-addressed events.
//!
//! ## Why a mesh of cells?
//!
//! - **Isolated state**: a cell exclusively owns its [`Behavior`]; no other cell can read
//!   or write it, so behaviors need no locks.
//! - **Runtime topology**: cells subscribe to each other while the system runs, building
//!   an arbitrary, mutable delivery graph.
//! - **Two ways to talk**: fire-and-forget fan-out ([`Environment::emit`]) and blocking
//!   request/response with a timeout ([`Environment::request`]).
//! - **Supervision**: start, init, crash-recover and stop are handled by the runtime, and
//!   one cell's failure never touches another cell's state.
//!
//! ## Architecture Overview
//!
//! 1. **Behavior Layer** ([`Behavior`]) - your domain logic, one implementation per kind of cell
//! 2. **Runtime Layer** (the cell loop) - mailbox draining, panic recovery, lifecycle
//! 3. **Routing Layer** ([`Environment`]) - registry, subscription graph, delivery
//! 4. **Interface Layer** ([`CellClient`]) - typed wrappers for request/response
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use cell_framework::{Behavior, BoxError, CellContext, Environment, Event, Payload};
//!
//! struct Counter { count: u64 }
//!
//! #[async_trait]
//! impl Behavior for Counter {
//!     async fn process_event(&mut self, event: Event, _ctx: &CellContext) -> Result<(), BoxError> {
//!         match event.topic() {
//!             "increment!" => self.count += 1,
//!             "count?" => { event.respond(self.count); }
//!             _ => {}
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let env = Environment::new();
//!     env.start_cell("counter", Counter { count: 0 }).await.unwrap();
//!
//!     env.deliver_new("counter", "increment!", Payload::new()).unwrap();
//!     let count = env
//!         .request("counter", "count?", Payload::new(), Duration::from_secs(1))
//!         .await
//!         .unwrap();
//!     assert_eq!(count, 1);
//!
//!     env.shutdown().await;
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each cell runs in its own Tokio task and processes one event at a time, in the
//!   order events were enqueued into its mailbox.
//! - Events fanned out to different subscribers have no relative ordering.
//! - A `request` blocks only the calling cell; a request cycle between cells is the
//!   caller's responsibility to avoid.
//!
//! ## Testing
//!
//! The [`mock`] module provides a recording [`Probe`](mock::Probe) cell for asserting on
//! what a topology delivers.

pub mod behavior;
pub mod cell;
pub mod client_trait;
pub mod context;
pub mod environment;
pub mod error;
pub mod event;
mod graph;
pub mod id;
pub mod mock;
pub mod payload;

// Re-export core types for convenience
pub use behavior::{Behavior, Fault};
pub use cell::CellStatus;
pub use client_trait::CellClient;
pub use context::CellContext;
pub use environment::Environment;
pub use error::{BoxError, MeshError};
pub use event::{Event, Reply, ResponseReceiver, ResponseSlot};
pub use id::{identifier, CellId};
pub use payload::Payload;
