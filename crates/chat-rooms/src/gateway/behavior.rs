//! [`Behavior`] implementation for [`GatewayBehavior`].

use async_trait::async_trait;
use cell_framework::{Behavior, BoxError, CellContext, CellId, Event};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::model::addressed_to;
use crate::topics::{SAYS_ALL, SAYS_TO};

/// The mesh side of one websocket connection.
///
/// Turns room broadcasts and messages addressed to its user into JSON text frames and
/// hands them to the session's write pump through a bounded queue. The queue is never
/// awaited: when the peer is too slow to drain it, frames are dropped so the cell keeps
/// up with its mailbox.
pub struct GatewayBehavior {
    user: CellId,
    outbound: Option<mpsc::Sender<String>>,
}

impl GatewayBehavior {
    pub fn new(user: CellId, outbound: mpsc::Sender<String>) -> Self {
        Self {
            user,
            outbound: Some(outbound),
        }
    }

    fn forward(&self, event: &Event, ctx: &CellContext) -> Result<(), BoxError> {
        let Some(outbound) = &self.outbound else {
            return Ok(());
        };
        let frame = serde_json::to_string(event.payload())?;
        match outbound.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(cell = %ctx.id(), user = %self.user, "Outbound queue full, frame dropped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(cell = %ctx.id(), "Write pump gone, frame dropped");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Behavior for GatewayBehavior {
    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        match event.topic() {
            SAYS_ALL => self.forward(&event, ctx),
            SAYS_TO if addressed_to(&event, self.user.as_str()) => self.forward(&event, ctx),
            _ => Ok(()),
        }
    }

    async fn terminate(&mut self, _ctx: &CellContext) -> Result<(), BoxError> {
        // Dropping the sender lets the write pump send its close frame.
        self.outbound.take();
        Ok(())
    }
}
