//! The public address system of a building.
//!
//! Speaks as [`PUBLIC_ADDRESS_USER`], a sender every room trusts, so announcements are
//! never held up by a censor. Besides on-demand [`ANNOUNCE`] commands it announces the
//! current time on a fixed interval.

use std::time::Duration;

use async_trait::async_trait;
use cell_framework::{Behavior, BoxError, CellContext, Event, Payload};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::MAX_INTERVAL;
use crate::model::{required, FROM, MESSAGE, PUBLIC_ADDRESS_USER};
use crate::topics::{ANNOUNCE, SAYS_ALL};

pub struct PublicAddress {
    interval: Option<Duration>,
    ticker: Option<JoinHandle<()>>,
}

impl PublicAddress {
    /// `interval` of `None` only announces on demand.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            ticker: None,
        }
    }
}

fn time_announcement() -> String {
    let now = chrono::Utc::now();
    format!("The current time is {}", now.format("%A, %d-%b-%y %H:%M:%S UTC"))
}

#[async_trait]
impl Behavior for PublicAddress {
    async fn init(&mut self, ctx: &CellContext) -> Result<(), BoxError> {
        let Some(period) = self.interval else {
            return Ok(());
        };
        let period = period.clamp(Duration::from_millis(1), MAX_INTERVAL);
        let pa = ctx.clone();
        // The ticker only feeds the mailbox; broadcasting stays on the cell loop.
        self.ticker = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let payload = Payload::new().apply([(MESSAGE, time_announcement())]);
                if pa
                    .environment()
                    .deliver_new(pa.id().as_str(), ANNOUNCE, payload)
                    .is_err()
                {
                    break;
                }
            }
        }));
        info!(cell = %ctx.id(), ?period, "Announcements scheduled");
        Ok(())
    }

    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        if event.topic() == ANNOUNCE {
            let message = required(&event, MESSAGE)?;
            let payload = Payload::new().apply([(MESSAGE, message), (FROM, PUBLIC_ADDRESS_USER)]);
            let reached = ctx.emit_new(SAYS_ALL, payload)?;
            debug!(cell = %ctx.id(), reached, "Announced");
            event.respond(reached);
        }
        Ok(())
    }

    async fn terminate(&mut self, _ctx: &CellContext) -> Result<(), BoxError> {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        Ok(())
    }
}
