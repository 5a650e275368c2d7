use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The days one participant marked for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub event_id: Uuid,
    pub participant: String,
    pub days: Vec<NaiveDate>,
}

/// Participants available on a single day, in name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTally {
    pub day: NaiveDate,
    pub participants: Vec<String>,
}

/// Groups saved availability by day, covering every day in `days` even when
/// nobody picked it.
pub fn tally_by_day(days: &[NaiveDate], entries: &[Availability]) -> Vec<DayTally> {
    days.iter()
        .map(|day| {
            let mut participants: Vec<String> = entries
                .iter()
                .filter(|entry| entry.days.contains(day))
                .map(|entry| entry.participant.clone())
                .collect();
            participants.sort();

            DayTally {
                day: *day,
                participants,
            }
        })
        .collect()
}
