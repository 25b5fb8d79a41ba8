//! # User
//!
//! One [`User`] cell per connected name (`user:<name>`). It is subscribed to the room it
//! joined and speaks into it on `say!`.
//!
//! Listening behavior is composed rather than inherited: attach a [`UserObserver`] such as
//! [`LogObserver`] to act on what the user hears.

pub mod entity;
pub mod observer;

pub use entity::User;
pub use observer::{LogObserver, UserObserver};

use cell_framework::{CellId, Environment, Payload};
use tracing::info;

use crate::error::ChatError;
use crate::model::{room_id, user_id, PUBLIC_ADDRESS_USER, USER};
use crate::topics::USER_ADDED;

/// Starts user `name` and lets it join `room` of `building`.
pub async fn add_user(
    env: &Environment,
    building: &str,
    room: &str,
    name: &str,
) -> Result<CellId, ChatError> {
    join(env, building, room, User::new(name)).await
}

/// Name of the listener started by [`add_log_user`].
pub const LOGGER: &str = "logger";

/// Adds a listener named "logger" that logs everything said in the room. One logger cell
/// serves every room it is added to.
pub async fn add_log_user(
    env: &Environment,
    building: &str,
    room: &str,
) -> Result<CellId, ChatError> {
    let logger = user_id(LOGGER);
    if !env.has_cell(logger.as_str()) {
        return join(env, building, room, User::new(LOGGER).with_observer(LogObserver)).await;
    }
    let room = room_id(building, room);
    if !env.has_cell(room.as_str()) {
        return Err(ChatError::RoomNotFound(room));
    }
    enter(env, &room, &logger)?;
    Ok(logger)
}

/// Starts a prepared `user` cell and lets it join `room` of `building`.
pub async fn join(
    env: &Environment,
    building: &str,
    room: &str,
    user: User,
) -> Result<CellId, ChatError> {
    let room = room_id(building, room);
    if !env.has_cell(room.as_str()) {
        return Err(ChatError::RoomNotFound(room));
    }

    let id = user.id().clone();
    if id == PUBLIC_ADDRESS_USER {
        return Err(ChatError::ReservedName(id));
    }
    env.start_cell(id.clone(), user).await?;
    if let Err(e) = enter(env, &room, &id) {
        // The room went away in between; do not leave the user behind.
        let _ = env.stop_cell(id.as_str()).await;
        return Err(e);
    }
    Ok(id)
}

/// Subscribes running user `id` to `room` and registers it as a member.
fn enter(env: &Environment, room: &CellId, id: &CellId) -> Result<(), ChatError> {
    env.subscribe(room.as_str(), id.as_str())?;
    env.deliver_new(
        room.as_str(),
        USER_ADDED,
        Payload::new().apply([(USER, id.as_str())]),
    )?;
    info!(user = %id, %room, "User joined");
    Ok(())
}
