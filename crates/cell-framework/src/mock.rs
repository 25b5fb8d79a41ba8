//! # Mock Framework
//!
//! Utilities for testing behaviors and topologies without writing throwaway cells.
//!
//! A [`Probe`] is a behavior that records every event it receives. Start it as a cell,
//! subscribe it wherever you want to listen, then use the [`ProbeReceiver`] to assert on
//! what arrived:
//!
//! ```rust
//! use std::time::Duration;
//! use cell_framework::mock::Probe;
//! use cell_framework::{Environment, Payload, Reply};
//!
//! #[tokio::main]
//! async fn main() {
//!     let env = Environment::new();
//!     let (source, _) = Probe::new();
//!     let (listener, mut heard) = Probe::new();
//!     env.start_cell("source", source).await.unwrap();
//!     env.start_cell("listener", listener).await.unwrap();
//!     env.subscribe("source", "listener").unwrap();
//!
//!     env.emit_new("source", "ping", Payload::new(), Reply::None).unwrap();
//!
//!     let event = heard.next(Duration::from_millis(100)).await.unwrap();
//!     assert_eq!(event.topic(), "ping");
//!     assert!(heard.expect_silence(Duration::from_millis(20)).await);
//! }
//! ```
//!
//! ## Answering requests
//!
//! [`Probe::responding`] answers every request with a fixed value, which makes it a
//! stand-in for a real cell on the other side of [`Environment::request`](crate::Environment::request).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::behavior::Behavior;
use crate::context::CellContext;
use crate::error::BoxError;
use crate::event::Event;

/// A behavior that records everything it receives.
pub struct Probe {
    sender: mpsc::UnboundedSender<Event>,
    answer: Option<Value>,
}

impl Probe {
    pub fn new() -> (Self, ProbeReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                answer: None,
            },
            ProbeReceiver { receiver },
        )
    }

    /// A probe that also answers every request with `answer`.
    pub fn responding(answer: impl Into<Value>) -> (Self, ProbeReceiver) {
        let (mut probe, receiver) = Self::new();
        probe.answer = Some(answer.into());
        (probe, receiver)
    }
}

#[async_trait]
impl Behavior for Probe {
    async fn process_event(&mut self, event: Event, _ctx: &CellContext) -> Result<(), BoxError> {
        if let Some(answer) = &self.answer {
            event.respond(answer.clone());
        }
        // The test may have dropped its receiver; that is fine.
        let _ = self.sender.send(event);
        Ok(())
    }
}

/// Test side of a [`Probe`].
pub struct ProbeReceiver {
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl ProbeReceiver {
    /// Next recorded event, or `None` if nothing arrives `within`.
    pub async fn next(&mut self, within: Duration) -> Option<Event> {
        tokio::time::timeout(within, self.receiver.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next event with `topic`, skipping any others. `within` bounds the whole search.
    pub async fn next_topic(&mut self, topic: &str, within: Duration) -> Option<Event> {
        let search = async {
            while let Some(event) = self.receiver.recv().await {
                if event.topic() == topic {
                    return Some(event);
                }
            }
            None
        };
        tokio::time::timeout(within, search).await.ok().flatten()
    }

    /// `true` if nothing arrives `within`.
    pub async fn expect_silence(&mut self, within: Duration) -> bool {
        self.next(within).await.is_none()
    }
}
