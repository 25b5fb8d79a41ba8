//! # Events
//!
//! This module defines the message type that flows through the mesh.
//!
//! An [`Event`] is a topic, a [`Payload`] and a [`Reply`]. The reply makes the
//! "this emit expects an answer" contract explicit: fire-and-forget events carry
//! [`Reply::None`], requests carry a [`ResponseSlot`].
//!
//! ## Response slots
//!
//! A slot is a shared one-shot sender. Every copy of an event fanned out to several
//! subscribers holds the same slot, and the **first** call to [`Event::respond`] wins;
//! later calls are discarded and return `false`. Once the requester gives up (timeout)
//! the slot is closed and late replies are discarded the same way.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::payload::Payload;

/// An immutable message addressed by topic.
#[derive(Debug, Clone)]
pub struct Event {
    topic: String,
    payload: Payload,
    reply: Reply,
}

impl Event {
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
            reply: Reply::None,
        }
    }

    /// Attaches a response slot, turning the event into a request.
    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn reply(&self) -> &Reply {
        &self.reply
    }

    pub fn expects_response(&self) -> bool {
        matches!(self.reply, Reply::Slot(_))
    }

    /// Answers the request carried by this event.
    ///
    /// Returns `true` when the value reached the requester. Returns `false` when the
    /// event is not a request, another responder answered first, or the requester
    /// already gave up.
    pub fn respond(&self, value: impl Into<Value>) -> bool {
        match &self.reply {
            Reply::None => false,
            Reply::Slot(slot) => slot.respond(value),
        }
    }
}

/// Whether an event expects an answer.
#[derive(Debug, Clone, Default)]
pub enum Reply {
    #[default]
    None,
    Slot(ResponseSlot),
}

/// Shared, consume-once response channel.
#[derive(Clone)]
pub struct ResponseSlot {
    sender: Arc<Mutex<Option<oneshot::Sender<Value>>>>,
}

impl ResponseSlot {
    /// Creates a slot and the receiver the requester waits on.
    pub fn channel() -> (ResponseSlot, ResponseReceiver) {
        let (tx, rx) = oneshot::channel();
        let slot = ResponseSlot {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        let receiver = ResponseReceiver {
            slot: slot.clone(),
            rx,
        };
        (slot, receiver)
    }

    /// Delivers `value` if nobody answered yet. First responder wins.
    pub fn respond(&self, value: impl Into<Value>) -> bool {
        let sender = self.sender.lock().take();
        match sender {
            Some(tx) => tx.send(value.into()).is_ok(),
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.sender.lock().is_some()
    }

    fn close(&self) {
        self.sender.lock().take();
    }
}

impl fmt::Debug for ResponseSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSlot")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Requester side of a [`ResponseSlot`].
///
/// Holding the receiver keeps the slot alive, so a destination that drops the event
/// without answering still produces a timeout rather than an early hang-up.
pub struct ResponseReceiver {
    slot: ResponseSlot,
    rx: oneshot::Receiver<Value>,
}

impl ResponseReceiver {
    /// Waits up to `timeout` for the first response. `None` means the deadline passed;
    /// the slot is closed before returning so any late reply is discarded.
    pub async fn wait(mut self, timeout: Duration) -> Option<Value> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(_)) => None,
            Err(_) => {
                self.slot.close();
                // A reply may have landed between the deadline and the close.
                self.rx.try_recv().ok()
            }
        }
    }
}
