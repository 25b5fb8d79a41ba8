//! Payload keys and accessors.

use cell_framework::Event;

use crate::error::ChatError;

pub const FROM: &str = "from";
pub const TO: &str = "to";
pub const MESSAGE: &str = "message";
pub const USER: &str = "user";
pub const ROOM: &str = "room";

/// The string field `key` of `event`, or [`ChatError::MissingField`].
pub fn required<'a>(event: &'a Event, key: &'static str) -> Result<&'a str, ChatError> {
    event
        .payload()
        .get_str(key)
        .ok_or_else(|| ChatError::MissingField {
            topic: event.topic().to_string(),
            field: key,
        })
}

/// Whether `event` is addressed to `user` through its `to` field.
pub fn addressed_to(event: &Event, user: &str) -> bool {
    event.payload().get_str(TO) == Some(user)
}
