//! # Environment
//!
//! The registry and router of the mesh. It creates and stops cells, owns the
//! subscription graph and implements every way of moving an event:
//!
//! | Operation | Addressed to | Missing id |
//! |-----------|--------------|------------|
//! | [`deliver`](Environment::deliver) | the mailbox of one cell | `NotFound` |
//! | [`emit`](Environment::emit) | every subscriber of a source cell | `NotFound` for the source, zero subscribers is `Ok(0)` |
//! | [`request`](Environment::request) | one cell, waits for its answer | `NotFound` |
//!
//! ## Coordination
//!
//! The cell registry and the subscription graph are the only state shared across cells.
//! Both sit behind one mutex that is never held across an `.await`, so registry
//! operations are safe to call from inside any behavior hook, including `init` of a cell
//! that is itself still being started. Fan-out happens while the lock is held: an emit
//! reaches exactly the subscribers that existed when it was issued.
//!
//! ## Deadlocks
//!
//! A [`request`](Environment::request) blocks the calling cell's loop until the answer or
//! the timeout. A request cycle (A requests B while B requests A) stalls both cells until
//! their timeouts fire; keeping the request graph acyclic is the caller's job. Only the
//! trivial cycle of a cell requesting itself is rejected up front.
//!
//! ## Shutdown
//!
//! Cells hold the environment through their context, so dropping the last handle does
//! not stop anything. Call [`shutdown`](Environment::shutdown) explicitly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::behavior::Behavior;
use crate::cell::{Cell, CellStatus, Envelope, CURRENT_CELL};
use crate::context::CellContext;
use crate::error::MeshError;
use crate::event::{Event, Reply, ResponseSlot};
use crate::graph::SubscriptionGraph;
use crate::id::CellId;
use crate::payload::Payload;

struct CellEntry {
    mailbox: mpsc::UnboundedSender<Envelope>,
    status: CellStatus,
}

#[derive(Default)]
struct Registry {
    cells: HashMap<CellId, CellEntry>,
    graph: SubscriptionGraph,
}

impl Registry {
    fn live(&self, id: &str) -> Result<&CellEntry, MeshError> {
        let entry = self
            .cells
            .get(id)
            .ok_or_else(|| MeshError::NotFound(id.into()))?;
        match entry.status {
            CellStatus::Crashed => Err(MeshError::Crashed(id.into())),
            status if !status.accepts_events() => Err(MeshError::Closed(id.into())),
            _ => Ok(entry),
        }
    }

    fn enqueue(&self, target: &str, event: Event) -> Result<(), MeshError> {
        self.live(target)?
            .mailbox
            .send(Envelope::Event(event))
            .map_err(|_| MeshError::Closed(target.into()))
    }
}

/// Handle to a running mesh. Cheap to clone; every clone talks to the same cells.
#[derive(Clone, Default)]
pub struct Environment {
    registry: Arc<Mutex<Registry>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Starts `behavior` as cell `id` and waits for its `init` hook.
    ///
    /// Events delivered while `init` runs are queued and processed afterwards.
    pub async fn start_cell<B: Behavior>(
        &self,
        id: impl Into<CellId>,
        behavior: B,
    ) -> Result<(), MeshError> {
        let id = id.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        {
            let mut registry = self.registry.lock();
            if registry.cells.contains_key(&id) {
                return Err(MeshError::AlreadyExists(id));
            }
            registry.cells.insert(
                id.clone(),
                CellEntry {
                    mailbox: sender,
                    status: CellStatus::Starting,
                },
            );
        }

        let ctx = CellContext::new(id.clone(), self.clone());
        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(Cell::new(ctx, behavior, receiver).run(ready_tx));

        let reason = match ready_rx.await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(reason)) => reason,
            Err(_) => "cell task ended during init".to_string(),
        };
        self.release(id.as_str());
        Err(MeshError::InitFailed { id, reason })
    }

    /// Stops cell `id`: no new events are accepted, its edges are removed, already
    /// queued events are processed, then `terminate` runs and the id is released.
    ///
    /// Called from inside the cell itself, this returns without waiting for the loop.
    pub async fn stop_cell(&self, id: &str) -> Result<(), MeshError> {
        let mailbox = {
            let mut registry = self.registry.lock();
            let entry = registry
                .cells
                .get_mut(id)
                .ok_or_else(|| MeshError::NotFound(id.into()))?;
            match entry.status {
                CellStatus::Crashed => {
                    registry.cells.remove(id);
                    info!(cell = %id, "Crashed cell released");
                    return Ok(());
                }
                CellStatus::Stopping | CellStatus::Stopped => {
                    return Err(MeshError::Closed(id.into()));
                }
                CellStatus::Starting | CellStatus::Running => {
                    entry.status = CellStatus::Stopping;
                }
            }
            let mailbox = entry.mailbox.clone();
            registry.graph.remove_cell(id);
            mailbox
        };

        let (ack, done) = oneshot::channel();
        if mailbox.send(Envelope::Stop(ack)).is_err() {
            self.release(id);
            return Ok(());
        }

        let is_self = CURRENT_CELL
            .try_with(|current| current.as_str() == id)
            .unwrap_or(false);
        if is_self {
            debug!(cell = %id, "Stop requested from inside the cell");
            return Ok(());
        }
        if done.await.is_err() {
            // The loop ended without acknowledging (crash while draining).
            self.release_if_dead(id);
        }
        Ok(())
    }

    /// Stops every registered cell.
    pub async fn shutdown(&self) {
        let ids = self.cell_ids();
        info!(cells = ids.len(), "Shutting down environment");
        for id in ids {
            match self.stop_cell(id.as_str()).await {
                Ok(()) | Err(MeshError::NotFound(_)) | Err(MeshError::Closed(_)) => {}
                Err(e) => warn!(cell = %id, error = %e, "Stop failed during shutdown"),
            }
        }
        info!("Environment shutdown complete");
    }

    pub fn has_cell(&self, id: &str) -> bool {
        self.registry.lock().cells.contains_key(id)
    }

    pub fn status(&self, id: &str) -> Option<CellStatus> {
        self.registry.lock().cells.get(id).map(|entry| entry.status)
    }

    pub fn cell_ids(&self) -> Vec<CellId> {
        self.registry.lock().cells.keys().cloned().collect()
    }

    pub(crate) fn mark_running(&self, id: &str) {
        if let Some(entry) = self.registry.lock().cells.get_mut(id) {
            if entry.status == CellStatus::Starting {
                entry.status = CellStatus::Running;
            }
        }
    }

    /// Detaches a crashed cell from the graph but keeps its id reserved.
    pub(crate) fn mark_crashed(&self, id: &str) {
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.cells.get_mut(id) {
            entry.status = CellStatus::Crashed;
        }
        registry.graph.remove_cell(id);
    }

    pub(crate) fn release(&self, id: &str) {
        let mut registry = self.registry.lock();
        registry.cells.remove(id);
        registry.graph.remove_cell(id);
    }

    fn release_if_dead(&self, id: &str) {
        let mut registry = self.registry.lock();
        let dead = registry
            .cells
            .get(id)
            .is_some_and(|entry| !entry.status.accepts_events());
        if dead {
            registry.cells.remove(id);
            registry.graph.remove_cell(id);
        }
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Makes `destination` receive everything `source` emits.
    pub fn subscribe(&self, source: &str, destination: &str) -> Result<(), MeshError> {
        let mut registry = self.registry.lock();
        registry.live(source)?;
        registry.live(destination)?;
        let added = registry.graph.subscribe(&source.into(), &destination.into());
        if added {
            info!(%source, %destination, "Subscribed");
        }
        Ok(())
    }

    /// Removes the edge `source -> destination`; a missing edge is a no-op.
    pub fn unsubscribe(&self, source: &str, destination: &str) -> Result<(), MeshError> {
        let mut registry = self.registry.lock();
        for id in [source, destination] {
            if !registry.cells.contains_key(id) {
                return Err(MeshError::NotFound(id.into()));
            }
        }
        if registry.graph.unsubscribe(source, destination) {
            info!(%source, %destination, "Unsubscribed");
        }
        Ok(())
    }

    /// Current subscribers of `source`.
    pub fn subscribers(&self, source: &str) -> Result<Vec<CellId>, MeshError> {
        let registry = self.registry.lock();
        if !registry.cells.contains_key(source) {
            return Err(MeshError::NotFound(source.into()));
        }
        Ok(registry.graph.subscribers_of(source).cloned().collect())
    }

    // -------------------------------------------------------------------------
    // Delivery
    // -------------------------------------------------------------------------

    /// Enqueues `event` directly into the mailbox of `target`.
    pub fn deliver(&self, target: &str, event: Event) -> Result<(), MeshError> {
        self.registry.lock().enqueue(target, event)
    }

    pub fn deliver_new(&self, target: &str, topic: &str, payload: Payload) -> Result<(), MeshError> {
        self.deliver(target, Event::new(topic, payload))
    }

    /// Fans `event` out to every current subscriber of `source`.
    ///
    /// Each subscriber gets its own copy sharing the payload and reply slot. Returns the
    /// number of mailboxes reached; no subscribers is not an error.
    pub fn emit(&self, source: &str, event: Event) -> Result<usize, MeshError> {
        let registry = self.registry.lock();
        if !registry.cells.contains_key(source) {
            return Err(MeshError::NotFound(source.into()));
        }
        let mut delivered = 0;
        for destination in registry.graph.subscribers_of(source) {
            match registry.enqueue(destination.as_str(), event.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => debug!(%source, %destination, error = %e, "Skipped subscriber"),
            }
        }
        debug!(%source, topic = event.topic(), delivered, "Emit");
        Ok(delivered)
    }

    pub fn emit_new(
        &self,
        source: &str,
        topic: &str,
        payload: Payload,
        reply: Reply,
    ) -> Result<usize, MeshError> {
        self.emit(source, Event::new(topic, payload).with_reply(reply))
    }

    /// Sends a request to `target` and waits up to `timeout` for its answer.
    ///
    /// A target that never answers yields [`MeshError::Timeout`] once the deadline has
    /// passed, never earlier.
    pub async fn request(
        &self,
        target: &str,
        topic: &str,
        payload: Payload,
        timeout: Duration,
    ) -> Result<Value, MeshError> {
        let is_self = CURRENT_CELL
            .try_with(|current| current.as_str() == target)
            .unwrap_or(false);
        if is_self {
            return Err(MeshError::SelfRequest(target.into()));
        }

        let (slot, receiver) = ResponseSlot::channel();
        self.deliver(target, Event::new(topic, payload).with_reply(Reply::Slot(slot)))?;
        receiver
            .wait(timeout)
            .await
            .ok_or_else(|| MeshError::Timeout {
                target: target.into(),
                topic: topic.to_string(),
                after: timeout,
            })
    }
}
