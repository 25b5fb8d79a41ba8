//! Per-room moderation.
//!
//! A [`Censor`] answers every `censor!` request with `true` (clean) or `false` (a
//! censored word was used). On rejection it also emits a private `says-to` warning to
//! the offender. Its room subscribes to it and relays the warning like any trusted
//! message.
//!
//! Warning counters are created on a user's first checked message, only ever go up and
//! are never reset.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use cell_framework::{Behavior, BoxError, CellContext, Event, Payload};
use tracing::info;

use crate::model::{required, FROM, MESSAGE, TO, USER};
use crate::topics::{CENSOR, SAYS_TO, WARNINGS};

pub struct Censor {
    words: HashSet<String>,
    warnings: HashMap<String, u64>,
}

impl Censor {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            warnings: HashMap::new(),
        }
    }

    /// First whitespace-delimited token of `message` that is censored.
    pub fn offending_word<'a>(&self, message: &'a str) -> Option<&'a str> {
        message
            .split_whitespace()
            .find(|token| self.words.contains(*token))
    }

    pub fn warnings_of(&self, user: &str) -> u64 {
        self.warnings.get(user).copied().unwrap_or(0)
    }
}

pub(crate) fn warning_text(count: u64) -> String {
    format!("You can't say that! You've been warned {count} times.")
}

#[async_trait]
impl Behavior for Censor {
    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        match event.topic() {
            CENSOR => {
                let message = required(&event, MESSAGE)?;
                let from = required(&event, FROM)?;
                let offending = self.offending_word(message);
                let count = self.warnings.entry(from.to_string()).or_insert(0);

                let Some(word) = offending else {
                    event.respond(true);
                    return Ok(());
                };
                *count += 1;
                let count = *count;
                info!(cell = %ctx.id(), user = from, word, warnings = count, "Message censored");
                event.respond(false);

                let notice = Payload::new().apply([
                    (MESSAGE, warning_text(count)),
                    (FROM, ctx.id().to_string()),
                    (TO, from.to_string()),
                ]);
                ctx.emit_new(SAYS_TO, notice)?;
            }
            WARNINGS => {
                let user = required(&event, USER)?;
                event.respond(self.warnings_of(user));
            }
            _ => {}
        }
        Ok(())
    }
}
