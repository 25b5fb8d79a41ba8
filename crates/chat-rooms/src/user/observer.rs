//! Hooks for listening in on what a user hears.

use cell_framework::{CellId, Event};
use tracing::info;

use crate::model::{FROM, MESSAGE};

/// Called for every `says-all` and every `says-to` addressed to the user.
pub trait UserObserver: Send + Sync + 'static {
    fn heard(&mut self, user: &CellId, event: &Event);
}

/// Writes everything a user hears to the log.
#[derive(Debug, Default)]
pub struct LogObserver;

impl UserObserver for LogObserver {
    fn heard(&mut self, user: &CellId, event: &Event) {
        let payload = event.payload();
        info!(
            %user,
            from = payload.get_str(FROM).unwrap_or("?"),
            message = payload.get_str(MESSAGE).unwrap_or(""),
            "Heard"
        );
    }
}
