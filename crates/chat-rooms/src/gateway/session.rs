//! One websocket connection, bridged into the mesh.
//!
//! A session runs two pumps concurrently:
//!
//! - the **read pump** turns every inbound text (or UTF-8 binary) frame into a `say!`
//!   for the connection's user cell. Any frame, pongs included, refreshes the read
//!   deadline; a silent peer is dropped after `pong_wait`.
//! - the **write pump** drains the gateway cell's outbound queue into text frames and
//!   pings the peer every `ping_period`, with a deadline on every write.
//!
//! Whichever pump ends first ends the session. Teardown then notifies the user cell
//! (`user-disconnected`), tells the room (`user-removed`), stops the user and gateway
//! cells, and finally lets the write pump send its close frame.

use std::fmt;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use cell_framework::{CellId, Environment, MeshError, Payload};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::behavior::GatewayBehavior;
use super::error::GatewayError;
use crate::config::{GatewaySettings, MAX_INTERVAL};
use crate::error::ChatError;
use crate::model::{gateway_id, room_id, user_id, MESSAGE, PUBLIC_ADDRESS_USER, ROOM, USER};
use crate::topics::{SAY, USER_DISCONNECTED, USER_REMOVED};
use crate::user::User;

/// Capacity of the queue between the gateway cell and the write pump.
pub const OUTBOUND_QUEUE: usize = 32;

/// A connection that has joined its room and is ready to pump frames.
pub struct GatewaySession {
    env: Environment,
    room: CellId,
    user: CellId,
    gateway: CellId,
    settings: GatewaySettings,
    outbound: mpsc::Receiver<String>,
}

impl GatewaySession {
    /// Starts the gateway cell for `name`, subscribes it to the room and adds the user.
    pub async fn open(
        env: &Environment,
        building: &str,
        room: &str,
        name: &str,
        settings: GatewaySettings,
    ) -> Result<Self, GatewayError> {
        let room_cell = room_id(building, room);
        if !env.has_cell(room_cell.as_str()) {
            return Err(GatewayError::RoomNotFound(room_cell));
        }
        let user = user_id(name);
        if user == PUBLIC_ADDRESS_USER || env.has_cell(user.as_str()) {
            return Err(GatewayError::NameTaken(user));
        }

        let (sender, outbound) = mpsc::channel(OUTBOUND_QUEUE);
        let gateway = gateway_id(name);
        env.start_cell(gateway.clone(), GatewayBehavior::new(user.clone(), sender))
            .await?;

        let joined = match env.subscribe(room_cell.as_str(), gateway.as_str()) {
            Ok(()) => {
                let behavior = User::new(name).with_query_timeout(settings.query_timeout);
                crate::user::join(env, building, room, behavior).await
            }
            Err(e) => Err(e.into()),
        };
        if let Err(e) = joined {
            let _ = env.stop_cell(gateway.as_str()).await;
            return Err(match e {
                ChatError::Mesh(MeshError::AlreadyExists(id)) | ChatError::ReservedName(id) => {
                    GatewayError::NameTaken(id)
                }
                other => other.into(),
            });
        }

        info!(%user, %gateway, room = %room_cell, "Session opened");
        Ok(Self {
            env: env.clone(),
            room: room_cell,
            user,
            gateway,
            settings,
            outbound,
        })
    }

    pub fn user(&self) -> &CellId {
        &self.user
    }

    pub fn gateway(&self) -> &CellId {
        &self.gateway
    }

    /// Pumps frames until either side gives up, then tears the session down.
    pub async fn run<R, W, E>(self, mut reader: R, writer: W) -> Result<(), GatewayError>
    where
        R: Stream<Item = Result<Message, E>> + Unpin + Send,
        E: fmt::Display,
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: fmt::Display + Send,
    {
        let Self {
            env,
            room,
            user,
            gateway,
            settings,
            outbound,
        } = self;

        let mut writer_task = tokio::spawn(write_pump(writer, outbound, settings.clone()));
        let mut writer_finished = false;

        let outcome = tokio::select! {
            read = read_pump(&mut reader, &env, &room, &user, &settings) => read,
            written = &mut writer_task => {
                writer_finished = true;
                written.unwrap_or_else(|e| Err(GatewayError::Transport(e.to_string())))
            }
        };

        teardown(&env, &room, &user, &gateway, &settings).await;

        if !writer_finished && timeout(settings.write_wait, &mut writer_task).await.is_err() {
            warn!(%user, "Write pump did not finish, aborting");
            writer_task.abort();
        }

        match &outcome {
            Ok(()) => info!(%user, "Session closed"),
            Err(e) => info!(%user, error = %e, "Session ended"),
        }
        outcome
    }
}

/// Opens a session for `name` and runs it over `reader`/`writer`.
pub async fn run_session<R, W, E>(
    env: &Environment,
    building: &str,
    room: &str,
    name: &str,
    settings: GatewaySettings,
    reader: R,
    writer: W,
) -> Result<(), GatewayError>
where
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: fmt::Display,
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: fmt::Display + Send,
{
    GatewaySession::open(env, building, room, name, settings)
        .await?
        .run(reader, writer)
        .await
}

async fn read_pump<R, E>(
    reader: &mut R,
    env: &Environment,
    room: &CellId,
    user: &CellId,
    settings: &GatewaySettings,
) -> Result<(), GatewayError>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    loop {
        let frame = match timeout(settings.pong_wait, reader.next()).await {
            Err(_) => return Err(GatewayError::ReadTimeout(settings.pong_wait)),
            Ok(None) => return Ok(()),
            Ok(Some(Err(e))) => return Err(GatewayError::Transport(e.to_string())),
            Ok(Some(Ok(frame))) => frame,
        };

        let message = match frame {
            Message::Text(text) => {
                check_size(text.as_str().len(), settings.max_message_size)?;
                text.as_str().to_owned()
            }
            Message::Binary(bytes) => {
                check_size(bytes.len(), settings.max_message_size)?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return Ok(()),
        };

        let payload = Payload::new().apply([(ROOM, room.as_str()), (MESSAGE, message.as_str())]);
        env.deliver_new(user.as_str(), SAY, payload)?;
    }
}

fn check_size(size: usize, limit: usize) -> Result<(), GatewayError> {
    if size > limit {
        return Err(GatewayError::FrameTooLarge { size, limit });
    }
    Ok(())
}

async fn write_pump<W>(
    mut writer: W,
    mut outbound: mpsc::Receiver<String>,
    settings: GatewaySettings,
) -> Result<(), GatewayError>
where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    let period = settings
        .ping_period()
        .clamp(Duration::from_millis(1), MAX_INTERVAL);
    let mut ping = interval_at(Instant::now() + period, period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    write_frame(&mut writer, Message::Text(text.into()), settings.write_wait).await?;
                }
                None => {
                    // The gateway cell is gone; the peer may be too.
                    let _ = write_frame(&mut writer, Message::Close(None), settings.write_wait).await;
                    let _ = timeout(settings.write_wait, writer.close()).await;
                    return Ok(());
                }
            },
            _ = ping.tick() => {
                write_frame(&mut writer, Message::Ping(Bytes::new()), settings.write_wait).await?;
            }
        }
    }
}

async fn write_frame<W>(writer: &mut W, frame: Message, wait: Duration) -> Result<(), GatewayError>
where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    match timeout(wait, writer.send(frame)).await {
        Err(_) => Err(GatewayError::WriteTimeout(wait)),
        Ok(Err(e)) => Err(GatewayError::Transport(e.to_string())),
        Ok(Ok(())) => Ok(()),
    }
}

async fn teardown(
    env: &Environment,
    room: &CellId,
    user: &CellId,
    gateway: &CellId,
    settings: &GatewaySettings,
) {
    if let Err(e) = env
        .request(user.as_str(), USER_DISCONNECTED, Payload::new(), settings.query_timeout)
        .await
    {
        warn!(%user, error = %e, "Disconnect notification failed");
    }

    let leave = Payload::new().apply([(USER, user.as_str())]);
    if let Err(e) = env.deliver_new(room.as_str(), USER_REMOVED, leave) {
        debug!(%room, error = %e, "Room gone before user removal");
    }

    for id in [user, gateway] {
        if let Err(e) = env.stop_cell(id.as_str()).await {
            warn!(cell = %id, error = %e, "Failed to stop cell");
        }
    }
}
