use std::future::Future;
use std::sync::Arc;

use cell_framework::{CellId, Environment};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::building::{add_building, add_room};
use crate::clients::{BuildingClient, CensorClient, PublicAddressClient, RoomClient, UserClient};
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::server::{self, AppState};
use crate::user::add_log_user;

/// The runtime orchestrator of one chat building.
///
/// `ChatSystem` owns the [`Environment`] all cells live in and knows the layout it built,
/// so it can hand out clients for every part of it.
///
/// # Example
///
/// ```ignore
/// let system = ChatSystem::start(ChatConfig::default()).await?;
///
/// system.room_client("cafeteria").add_user("bart").await?;
/// system.user_client("bart").say(system.building_name(), "cafeteria", "hi")?;
///
/// system.shutdown().await;
/// ```
pub struct ChatSystem {
    env: Environment,
    config: Arc<ChatConfig>,
    building: CellId,
    rooms: Vec<CellId>,
}

impl ChatSystem {
    /// Starts the building, its rooms and, if configured, a logging listener.
    ///
    /// On failure every cell started so far is stopped again.
    pub async fn start(config: ChatConfig) -> Result<Self, ChatError> {
        let env = Environment::new();
        match Self::build(&env, &config).await {
            Ok((building, rooms)) => {
                info!(%building, rooms = rooms.len(), "Chat system started");
                Ok(Self {
                    env,
                    config: Arc::new(config),
                    building,
                    rooms,
                })
            }
            Err(e) => {
                env.shutdown().await;
                Err(e)
            }
        }
    }

    async fn build(
        env: &Environment,
        config: &ChatConfig,
    ) -> Result<(CellId, Vec<CellId>), ChatError> {
        let building = add_building(env, &config.building, config.announce_interval).await?;

        let mut rooms = Vec::with_capacity(config.rooms.len());
        for room in &config.rooms {
            let id = add_room(
                env,
                &config.building,
                room,
                &config.censored_words,
                config.censor_timeout,
            )
            .await?;
            if config.log_rooms {
                add_log_user(env, &config.building, room).await?;
            }
            rooms.push(id);
        }
        Ok((building, rooms))
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn building(&self) -> &CellId {
        &self.building
    }

    pub fn building_name(&self) -> &str {
        &self.config.building
    }

    /// Ids of the rooms created at startup.
    pub fn rooms(&self) -> &[CellId] {
        &self.rooms
    }

    pub fn building_client(&self) -> BuildingClient {
        BuildingClient::new(self.env.clone(), &self.config.building, self.config.query_timeout)
    }

    pub fn public_address_client(&self) -> PublicAddressClient {
        PublicAddressClient::new(self.env.clone(), &self.config.building, self.config.query_timeout)
    }

    pub fn room_client(&self, room: &str) -> RoomClient {
        RoomClient::new(
            self.env.clone(),
            &self.config.building,
            room,
            self.config.query_timeout,
        )
    }

    pub fn censor_client(&self, room: &str) -> CensorClient {
        CensorClient::new(
            self.env.clone(),
            &self.config.building,
            room,
            self.config.query_timeout,
        )
    }

    pub fn user_client(&self, name: &str) -> UserClient {
        UserClient::new(self.env.clone(), name, self.config.query_timeout)
    }

    pub fn state(&self) -> AppState {
        AppState {
            env: self.env.clone(),
            config: Arc::clone(&self.config),
        }
    }

    pub fn router(&self) -> axum::Router {
        server::router(self.state())
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn serve(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        self.serve_on(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            info!("Ctrl-C received");
        })
        .await
    }

    /// Serves on an already bound `listener` until `shutdown` resolves.
    pub async fn serve_on<F>(&self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        server::serve(listener, self.state(), shutdown).await
    }

    /// Stops every cell, sessions included.
    pub async fn shutdown(self) {
        info!("Shutting down chat system...");
        self.env.shutdown().await;
        info!("Chat system shutdown complete.");
    }
}
