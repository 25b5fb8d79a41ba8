//! # Cell Context
//!
//! The context handed to every [`Behavior`](crate::Behavior) hook: the cell's own id plus
//! the environment it runs in.

use crate::environment::Environment;
use crate::error::MeshError;
use crate::event::{Event, Reply};
use crate::id::CellId;
use crate::payload::Payload;

#[derive(Clone)]
pub struct CellContext {
    id: CellId,
    environment: Environment,
}

impl CellContext {
    pub(crate) fn new(id: CellId, environment: Environment) -> Self {
        Self { id, environment }
    }

    pub fn id(&self) -> &CellId {
        &self.id
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Fans `event` out to this cell's subscribers, keeping its reply slot.
    pub fn emit(&self, event: Event) -> Result<usize, MeshError> {
        self.environment.emit(self.id.as_str(), event)
    }

    /// Fans a new fire-and-forget event out to this cell's subscribers.
    pub fn emit_new(&self, topic: &str, payload: Payload) -> Result<usize, MeshError> {
        self.environment.emit_new(self.id.as_str(), topic, payload, Reply::None)
    }
}
