//! # CellClient Trait
//!
//! Provides a common interface for cell-specific clients, adding default `query` and
//! `tell` methods built on top of [`Environment::request`] and [`Environment::deliver`].
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{CellId, Environment, MeshError, Payload};

/// Trait for typed wrappers around one cell.
///
/// Implementors only say *which* cell they talk to and how long a query may take; the
/// request plumbing and JSON decoding of answers are provided.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use cell_framework::{CellClient, CellId, Environment, MeshError, Payload};
///
/// struct CounterClient {
///     env: Environment,
///     id: CellId,
/// }
///
/// impl CellClient for CounterClient {
///     type Error = MeshError;
///
///     fn environment(&self) -> &Environment { &self.env }
///     fn cell_id(&self) -> &CellId { &self.id }
///     fn timeout(&self) -> Duration { Duration::from_secs(1) }
/// }
///
/// async fn usage(client: CounterClient) -> Result<u64, MeshError> {
///     client.tell("increment!", Payload::new())?;
///     client.query::<u64>("count?", Payload::new()).await
/// }
/// ```
#[async_trait]
pub trait CellClient: Send + Sync {
    /// The client-specific error type.
    type Error: From<MeshError> + Send;

    fn environment(&self) -> &Environment;

    /// The cell this client addresses.
    fn cell_id(&self) -> &CellId;

    /// Deadline applied to every query.
    fn timeout(&self) -> Duration;

    /// Requests `topic` from the cell and decodes the answer.
    #[tracing::instrument(skip(self, payload))]
    async fn query<T>(&self, topic: &str, payload: Payload) -> Result<T, Self::Error>
    where
        T: DeserializeOwned + Send,
    {
        tracing::debug!("Sending request");
        let value = self
            .environment()
            .request(self.cell_id().as_str(), topic, payload, self.timeout())
            .await?;
        Ok(serde_json::from_value(value).map_err(MeshError::from)?)
    }

    /// Delivers a fire-and-forget event to the cell.
    fn tell(&self, topic: &str, payload: Payload) -> Result<(), Self::Error> {
        tracing::debug!(cell = %self.cell_id(), topic, "Sending event");
        Ok(self
            .environment()
            .deliver_new(self.cell_id().as_str(), topic, payload)?)
    }
}
