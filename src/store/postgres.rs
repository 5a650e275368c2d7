use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::models::{Availability, Event, NewEvent};

/// Events and availability kept in Postgres.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        let stored = sqlx::query_as::<_, Event>(
            "INSERT INTO events (name, start_date, end_date) VALUES ($1, $2, $3) \
             RETURNING id, name, start_date, end_date, created_at",
        )
        .bind(&event.name)
        .bind(event.start_date)
        .bind(event.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(
            "SELECT id, name, start_date, end_date, created_at FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn save_availability(
        &self,
        event_id: Uuid,
        participant: &str,
        days: &[NaiveDate],
    ) -> Result<Availability, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT 1 FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        sqlx::query("DELETE FROM availabilities WHERE event_id = $1 AND participant = $2")
            .bind(event_id)
            .bind(participant)
            .execute(&mut *tx)
            .await?;

        let saved: Vec<(NaiveDate,)> = sqlx::query_as(
            "INSERT INTO availabilities (event_id, participant, day) \
             SELECT $1, $2, d FROM UNNEST($3::date[]) AS d \
             ON CONFLICT DO NOTHING \
             RETURNING day",
        )
        .bind(event_id)
        .bind(participant)
        .bind(days.to_vec())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut days: Vec<NaiveDate> = saved.into_iter().map(|(day,)| day).collect();
        days.sort();

        Ok(Availability {
            event_id,
            participant: participant.to_string(),
            days,
        })
    }

    async fn list_availability(&self, event_id: Uuid) -> Result<Vec<Availability>, StoreError> {
        self.get_event(event_id).await?;

        let rows: Vec<(String, NaiveDate)> = sqlx::query_as(
            "SELECT participant, day FROM availabilities WHERE event_id = $1 \
             ORDER BY participant, day",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_by_participant(event_id, rows))
    }
}

/// Folds `(participant, day)` rows, ordered by participant, into one entry per
/// participant.
fn group_by_participant(event_id: Uuid, rows: Vec<(String, NaiveDate)>) -> Vec<Availability> {
    let mut entries: Vec<Availability> = Vec::new();
    for (participant, day) in rows {
        match entries.last_mut() {
            Some(entry) if entry.participant == participant => entry.days.push(day),
            _ => entries.push(Availability {
                event_id,
                participant,
                days: vec![day],
            }),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_rows_group_into_one_entry_per_participant() {
        let event_id = Uuid::new_v4();
        let rows = vec![
            ("alex".to_string(), date(2)),
            ("mina".to_string(), date(1)),
            ("mina".to_string(), date(3)),
        ];

        let entries = group_by_participant(event_id, rows);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].participant, "alex");
        assert_eq!(entries[0].days, vec![date(2)]);
        assert_eq!(entries[1].participant, "mina");
        assert_eq!(entries[1].days, vec![date(1), date(3)]);
        assert!(entries.iter().all(|entry| entry.event_id == event_id));
    }

    #[test]
    fn test_no_rows_means_no_entries() {
        assert!(group_by_participant(Uuid::new_v4(), Vec::new()).is_empty());
    }
}
