//! Persistence for events and participant availability.
//!
//! Handlers never talk to an [`EventStore`] directly. They go through [`Store`],
//! which is built once at startup and binds every call to the process shutdown
//! token and a per-call timeout.

pub mod memory;
pub mod postgres;

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{Availability, Event, NewEvent};

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

/// Represents different store failure possibilities.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("requested entity not found")]
    NotFound,

    #[error("could not reach the event store; {0}")]
    Transport(String),

    #[error("store call cancelled by shutdown")]
    Cancelled,

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Transport(other.to_string()),
        }
    }
}

#[async_trait]
pub trait EventStore: Debug + Send + Sync + 'static {
    /// Inserts one event and returns it with its generated id.
    async fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError>;

    async fn get_event(&self, id: Uuid) -> Result<Event, StoreError>;

    /// Replaces everything `participant` previously saved for the event.
    async fn save_availability(
        &self,
        event_id: Uuid,
        participant: &str,
        days: &[NaiveDate],
    ) -> Result<Availability, StoreError>;

    /// All saved availability for the event, ordered by participant.
    async fn list_availability(&self, event_id: Uuid) -> Result<Vec<Availability>, StoreError>;
}

/// Shared handle to the process-wide store.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<dyn EventStore>,
    shutdown: CancellationToken,
    timeout: Duration,
}

impl Store {
    pub fn new(inner: Arc<dyn EventStore>, shutdown: CancellationToken, timeout: Duration) -> Self {
        Self {
            inner,
            shutdown,
            timeout,
        }
    }

    /// Races `call` against shutdown and the per-call timeout.
    async fn guarded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(StoreError::Cancelled),
            result = tokio::time::timeout(self.timeout, call) => {
                result.unwrap_or(Err(StoreError::Timeout(self.timeout)))
            }
        }
    }

    pub async fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        self.guarded(self.inner.insert_event(event)).await
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
        self.guarded(self.inner.get_event(id)).await
    }

    /// Looks an event up by a user supplied identifier. Identifiers that are
    /// not UUIDs cannot exist in the store and are reported as not found.
    pub async fn find_event(&self, raw_id: &str) -> Result<Event, StoreError> {
        let id = Uuid::parse_str(raw_id.trim()).map_err(|_| StoreError::NotFound)?;
        self.get_event(id).await
    }

    pub async fn save_availability(
        &self,
        event_id: Uuid,
        participant: &str,
        days: &[NaiveDate],
    ) -> Result<Availability, StoreError> {
        self.guarded(self.inner.save_availability(event_id, participant, days))
            .await
    }

    pub async fn list_availability(&self, event_id: Uuid) -> Result<Vec<Availability>, StoreError> {
        self.guarded(self.inner.list_availability(event_id)).await
    }
}
