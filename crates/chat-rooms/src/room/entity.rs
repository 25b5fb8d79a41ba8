//! [`Behavior`] implementation for [`Room`].

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use cell_framework::{Behavior, BoxError, CellContext, CellId, Event, MeshError, Payload};
use tracing::{debug, info, warn};

use super::censor::Censor;
use crate::error::ChatError;
use crate::model::{censor_id, required, FROM, MESSAGE, PUBLIC_ADDRESS_USER, USER};
use crate::topics::{
    CENSOR, IN_ROOM, SAYS_ALL, SAYS_TO, USER_ADDED, USER_COUNT, USER_REMOVED,
};

/// A chat room: membership plus a moderated broadcast.
///
/// # Moderation
/// Every `says-all`/`says-to` from an untrusted sender is held until the room's private
/// [`Censor`] has answered; only accepted messages are re-emitted to the room's
/// subscribers. Messages from the public address and from the censor itself skip the
/// check, which is also what keeps the room's own join and leave notices from waiting
/// on its censor.
///
/// # Lifecycle
/// `init` starts the censor as `room:<b>:<r>:censor` and subscribes the room to it;
/// `terminate` stops it again.
pub struct Room {
    name: String,
    users: BTreeSet<String>,
    censored_words: Vec<String>,
    censor_timeout: Duration,
    censor: CellId,
}

impl Room {
    pub fn new(
        building: &str,
        name: &str,
        censored_words: Vec<String>,
        censor_timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            users: BTreeSet::new(),
            censored_words,
            censor_timeout,
            censor: censor_id(building, name),
        }
    }

    fn is_trusted(&self, from: &str) -> bool {
        from == PUBLIC_ADDRESS_USER || from == self.censor.as_str()
    }

    /// Queues a notice from the public address in the room's own mailbox.
    fn announce(&self, ctx: &CellContext, message: String) -> Result<(), ChatError> {
        let payload =
            Payload::new().apply([(MESSAGE, message.as_str()), (FROM, PUBLIC_ADDRESS_USER)]);
        ctx.environment()
            .deliver_new(ctx.id().as_str(), SAYS_ALL, payload)?;
        Ok(())
    }

    /// Asks the censor about `event`. Returns `false` when the message must be dropped.
    async fn passes_censor(&self, event: &Event, ctx: &CellContext) -> Result<bool, ChatError> {
        let verdict = ctx
            .environment()
            .request(
                self.censor.as_str(),
                CENSOR,
                event.payload().clone(),
                self.censor_timeout,
            )
            .await?;
        verdict
            .as_bool()
            .ok_or_else(|| ChatError::UnexpectedResponse {
                topic: CENSOR,
                value: verdict.clone(),
            })
    }
}

#[async_trait]
impl Behavior for Room {
    async fn init(&mut self, ctx: &CellContext) -> Result<(), BoxError> {
        let env = ctx.environment();
        env.start_cell(self.censor.clone(), Censor::new(self.censored_words.clone()))
            .await?;
        env.subscribe(self.censor.as_str(), ctx.id().as_str())?;
        Ok(())
    }

    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        match event.topic() {
            SAYS_ALL | SAYS_TO => {
                let from = required(&event, FROM)?;
                if !self.is_trusted(from) && !self.passes_censor(&event, ctx).await? {
                    debug!(room = %ctx.id(), from, "Message dropped");
                    return Ok(());
                }
                ctx.emit(event)?;
            }
            IN_ROOM => {
                let user = required(&event, USER)?;
                event.respond(self.users.contains(user));
            }
            USER_COUNT => {
                event.respond(self.users.len());
            }
            USER_ADDED => {
                let user = required(&event, USER)?;
                if self.users.insert(user.to_string()) {
                    info!(room = %ctx.id(), user, members = self.users.len(), "User joined");
                    self.announce(ctx, format!("{user} has entered the room"))?;
                }
            }
            USER_REMOVED => {
                let user = required(&event, USER)?;
                if self.users.remove(user) {
                    info!(room = %ctx.id(), user, members = self.users.len(), "User left");
                    self.announce(ctx, format!("{user} has left the room"))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn terminate(&mut self, ctx: &CellContext) -> Result<(), BoxError> {
        match ctx.environment().stop_cell(self.censor.as_str()).await {
            // Already gone, e.g. stopped first during shutdown.
            Ok(()) | Err(MeshError::NotFound(_)) | Err(MeshError::Closed(_)) => {}
            Err(e) => warn!(room = %self.name, error = %e, "Failed to stop censor"),
        }
        Ok(())
    }
}
