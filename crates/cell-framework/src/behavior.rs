//! # Behavior Trait
//!
//! The `Behavior` trait is the contract every piece of cell logic implements. A cell is a
//! generic host (mailbox + run loop); the behavior owns the domain state and decides how
//! to react to each event.
//!
//! # Architecture Note
//! Writing the run loop *once* and plugging behaviors into it means Building, Room,
//! Censor, User and the gateway adapter share the same concurrency, crash handling and
//! logging without any of them knowing about channels.
//!
//! # Provided Methods (Hooks)
//! Only [`Behavior::process_event`] is required. The lifecycle hooks default to `Ok(())`:
//! - [`Behavior::init`] runs before the first event is processed.
//! - [`Behavior::recover`] runs after `process_event` panicked. `Ok` keeps the cell
//!   running, an error crashes it.
//! - [`Behavior::terminate`] runs once when the cell stops or crashes.

use std::fmt;

use async_trait::async_trait;

use crate::context::CellContext;
use crate::error::BoxError;
use crate::event::Event;

/// Logic hosted by a cell.
///
/// # Async & Context
/// Every hook receives the [`CellContext`] of its cell, giving access to the
/// [`Environment`](crate::Environment) for emitting, requesting, subscribing and
/// starting further cells. The context is injected per call, so behaviors can be
/// constructed before the environment that will run them.
#[async_trait]
pub trait Behavior: Send + 'static {
    /// Called once before any mailbox traffic is processed.
    async fn init(&mut self, _ctx: &CellContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Handles one event. Events arrive one at a time, in enqueue order.
    ///
    /// An error is logged and the cell keeps running.
    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError>;

    /// Called after `process_event` panicked.
    async fn recover(&mut self, _fault: &Fault, _ctx: &CellContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once when the cell stops or crashes.
    async fn terminate(&mut self, _ctx: &CellContext) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A panic caught while a behavior was processing an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub topic: String,
    pub message: String,
}

impl Fault {
    pub(crate) fn from_panic(topic: &str, panic: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(msg) = panic.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = panic.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Self {
            topic: topic.to_string(),
            message,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic while processing '{}': {}", self.topic, self.message)
    }
}
