//! # System Lifecycle
//!
//! Starting, serving and stopping a complete chat system.
//!
//! [`ChatSystem::start`] builds the cell hierarchy described by a [`ChatConfig`]:
//!
//! 1. the building and its public address
//! 2. one room per configured name, each with its own censor
//! 3. optionally a logging listener in every room
//!
//! The HTTP surface is attached with [`ChatSystem::serve`]; [`ChatSystem::shutdown`] stops
//! every cell.
//!
//! ```rust,no_run
//! use chat_rooms::config::ChatConfig;
//! use chat_rooms::lifecycle::{setup_tracing, ChatSystem};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     setup_tracing();
//!     let system = ChatSystem::start(ChatConfig::from_env()?).await?;
//!     system.serve().await?;
//!     system.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! [`ChatConfig`]: crate::config::ChatConfig

pub mod chat_system;
pub mod tracing;

pub use chat_system::*;
pub use self::tracing::setup_tracing;
