//! # Cell Runtime
//!
//! This module defines the run loop that hosts a [`Behavior`]. It is the "server" side of
//! the Actor Model: the loop owns the behavior exclusively and drains one mailbox, one
//! event at a time, so behavior state never needs a lock.
//!
//! ## Lifecycle
//!
//! 1. `init` runs before any queued event is looked at. Its outcome is reported back to
//!    [`Environment::start_cell`](crate::Environment::start_cell).
//! 2. Events are processed in FIFO order. Errors are logged; panics go to `recover`.
//! 3. A `Stop` envelope (queued behind any pending events) runs `terminate` and releases
//!    the id. A failed `recover` marks the cell crashed and runs `terminate` as well.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::behavior::{Behavior, Fault};
use crate::context::CellContext;
use crate::event::Event;
use crate::id::CellId;

tokio::task_local! {
    /// Id of the cell whose loop is running on the current task.
    pub(crate) static CURRENT_CELL: CellId;
}

/// What travels through a mailbox.
#[derive(Debug)]
pub(crate) enum Envelope {
    Event(Event),
    Stop(oneshot::Sender<()>),
}

/// Lifecycle state of a cell as tracked by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Starting,
    Running,
    Stopping,
    /// Only reported in the "Cell stopped" log line. The id is released at the same
    /// moment, so [`Environment::status`](crate::Environment::status) returns `None`
    /// for a stopped cell.
    Stopped,
    Crashed,
}

impl CellStatus {
    /// Whether new events may be enqueued.
    pub fn accepts_events(self) -> bool {
        matches!(self, CellStatus::Starting | CellStatus::Running)
    }
}

pub(crate) struct Cell<B: Behavior> {
    ctx: CellContext,
    behavior: B,
    mailbox: mpsc::UnboundedReceiver<Envelope>,
}

impl<B: Behavior> Cell<B> {
    pub(crate) fn new(
        ctx: CellContext,
        behavior: B,
        mailbox: mpsc::UnboundedReceiver<Envelope>,
    ) -> Self {
        Self {
            ctx,
            behavior,
            mailbox,
        }
    }

    /// Runs the cell until it is stopped, crashes or its environment goes away.
    pub(crate) async fn run(self, ready: oneshot::Sender<Result<(), String>>) {
        let id = self.ctx.id().clone();
        CURRENT_CELL.scope(id, self.run_loop(ready)).await;
    }

    async fn run_loop(mut self, ready: oneshot::Sender<Result<(), String>>) {
        let id = self.ctx.id().clone();
        // e.g. "Room" instead of "chat_rooms::room::Room"
        let behavior = std::any::type_name::<B>()
            .split("::")
            .last()
            .unwrap_or("Unknown");

        let init = AssertUnwindSafe(self.behavior.init(&self.ctx))
            .catch_unwind()
            .await;
        let init = match init {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(panic) => Err(Fault::from_panic("init", panic).message),
        };
        if let Err(reason) = init {
            warn!(cell = %id, behavior, %reason, "Init failed");
            let _ = ready.send(Err(reason));
            return;
        }
        self.ctx.environment().mark_running(id.as_str());
        info!(cell = %id, behavior, "Cell started");
        let _ = ready.send(Ok(()));

        while let Some(envelope) = self.mailbox.recv().await {
            match envelope {
                Envelope::Event(event) => {
                    let topic = event.topic().to_string();
                    debug!(cell = %id, topic = %topic, "Event");
                    let outcome = AssertUnwindSafe(self.behavior.process_event(event, &self.ctx))
                        .catch_unwind()
                        .await;
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!(cell = %id, topic = %topic, error = %e, "Event failed"),
                        Err(panic) => {
                            let fault = Fault::from_panic(&topic, panic);
                            error!(cell = %id, %fault, "Behavior panicked");
                            if !self.recover(&fault).await {
                                self.crash().await;
                                return;
                            }
                        }
                    }
                }
                Envelope::Stop(ack) => {
                    self.terminate().await;
                    self.ctx.environment().release(id.as_str());
                    info!(cell = %id, behavior, status = ?CellStatus::Stopped, "Cell stopped");
                    let _ = ack.send(());
                    return;
                }
            }
        }

        // Every sender is gone: the environment itself was dropped.
        self.terminate().await;
        info!(cell = %id, behavior, "Mailbox closed");
    }

    async fn recover(&mut self, fault: &Fault) -> bool {
        let id = self.ctx.id();
        let outcome = AssertUnwindSafe(self.behavior.recover(fault, &self.ctx))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {
                info!(cell = %id, "Recovered");
                true
            }
            Ok(Err(e)) => {
                error!(cell = %id, error = %e, "Recover declined");
                false
            }
            Err(panic) => {
                let fault = Fault::from_panic(&fault.topic, panic);
                error!(cell = %id, %fault, "Recover panicked");
                false
            }
        }
    }

    async fn crash(&mut self) {
        let id = self.ctx.id().clone();
        self.ctx.environment().mark_crashed(id.as_str());
        // Anything still queued can no longer be processed.
        self.mailbox.close();
        self.terminate().await;
        error!(cell = %id, status = ?CellStatus::Crashed, "Cell crashed");
    }

    async fn terminate(&mut self) {
        let outcome = AssertUnwindSafe(self.behavior.terminate(&self.ctx))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(cell = %self.ctx.id(), error = %e, "Terminate failed"),
            Err(_) => error!(cell = %self.ctx.id(), "Terminate panicked"),
        }
    }
}
