use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::models::{Availability, Event, NewEvent};

/// Keeps everything in process memory. Used when no database is configured
/// and by the tests.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<Uuid, Event>>,
    availability: RwLock<HashMap<Uuid, BTreeMap<String, BTreeSet<NaiveDate>>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        let stored = Event {
            id: Uuid::new_v4(),
            name: event.name.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            created_at: Utc::now(),
        };

        self.events.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
        self.events
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn save_availability(
        &self,
        event_id: Uuid,
        participant: &str,
        days: &[NaiveDate],
    ) -> Result<Availability, StoreError> {
        if !self.events.read().await.contains_key(&event_id) {
            return Err(StoreError::NotFound);
        }

        let days: BTreeSet<NaiveDate> = days.iter().copied().collect();
        self.availability
            .write()
            .await
            .entry(event_id)
            .or_default()
            .insert(participant.to_string(), days.clone());

        Ok(Availability {
            event_id,
            participant: participant.to_string(),
            days: days.into_iter().collect(),
        })
    }

    async fn list_availability(&self, event_id: Uuid) -> Result<Vec<Availability>, StoreError> {
        if !self.events.read().await.contains_key(&event_id) {
            return Err(StoreError::NotFound);
        }

        let availability = self.availability.read().await;
        let entries = availability
            .get(&event_id)
            .map(|participants| {
                participants
                    .iter()
                    .filter(|(_, days)| !days.is_empty())
                    .map(|(participant, days)| Availability {
                        event_id,
                        participant: participant.clone(),
                        days: days.iter().copied().collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(entries)
    }
}
