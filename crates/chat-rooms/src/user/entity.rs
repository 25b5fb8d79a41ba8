//! [`Behavior`] implementation for [`User`].

use std::time::Duration;

use async_trait::async_trait;
use cell_framework::{Behavior, BoxError, CellContext, CellId, Event, Payload};
use tracing::{debug, info};

use super::observer::UserObserver;
use crate::config::DEFAULT_QUERY_TIMEOUT_MS;
use crate::error::ChatError;
use crate::model::{addressed_to, required, user_id, FROM, MESSAGE, ROOM, USER};
use crate::topics::{IN_ROOM, SAY, SAYS_ALL, SAYS_TO, USER_DISCONNECTED};

/// A chat participant.
///
/// Speaks on `say!` (after checking its room membership) and listens to the rooms it is
/// subscribed to. Listening is delegated to an optional [`UserObserver`].
pub struct User {
    id: CellId,
    query_timeout: Duration,
    observer: Option<Box<dyn UserObserver>>,
}

impl User {
    pub fn new(name: &str) -> Self {
        Self {
            id: user_id(name),
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            observer: None,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_observer(mut self, observer: impl UserObserver) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn id(&self) -> &CellId {
        &self.id
    }

    fn hear(&mut self, event: &Event) {
        if let Some(observer) = self.observer.as_mut() {
            observer.heard(&self.id, event);
        }
    }

    async fn say(&self, event: &Event, ctx: &CellContext) -> Result<(), ChatError> {
        let room = required(event, ROOM)?;
        let env = ctx.environment();
        if !env.has_cell(room) {
            return Err(ChatError::RoomNotFound(room.into()));
        }

        let membership = Payload::new().apply([(USER, self.id.as_str())]);
        let present = env
            .request(room, IN_ROOM, membership, self.query_timeout)
            .await?;
        if present.as_bool() != Some(true) {
            return Err(ChatError::NotInRoom {
                user: self.id.clone(),
                room: room.into(),
            });
        }

        let payload = event.payload().apply([(FROM, self.id.as_str())]);
        env.deliver_new(room, SAYS_ALL, payload)?;
        debug!(user = %self.id, room, "Said");
        Ok(())
    }
}

#[async_trait]
impl Behavior for User {
    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        match event.topic() {
            SAY => self.say(&event, ctx).await?,
            SAYS_ALL => self.hear(&event),
            SAYS_TO if addressed_to(&event, self.id.as_str()) => {
                let payload = event.payload();
                info!(
                    user = %self.id,
                    from = payload.get_str(FROM).unwrap_or("?"),
                    message = payload.get_str(MESSAGE).unwrap_or(""),
                    "Private message"
                );
                self.hear(&event);
            }
            USER_DISCONNECTED => {
                info!(user = %self.id, "Disconnected");
                event.respond(true);
            }
            _ => {}
        }
        Ok(())
    }
}
