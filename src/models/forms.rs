//! Submitted form and request bodies, and the checks they go through before
//! anything reaches the store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::NewEvent;
use crate::models::schedule::{parse_date, DaySelection};

pub const MIN_EVENT_NAME_CHARS: usize = 2;
pub const MAX_PARTICIPANT_CHARS: usize = 64;
/// Longest event, in days, counting both ends.
pub const MAX_EVENT_DAYS: i64 = 366;

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records `message` for `field`; the first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

fn check_event_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.chars().count() < MIN_EVENT_NAME_CHARS {
        return Err("Event name must be at least 2 characters.");
    }
    Ok(name.to_string())
}

fn check_participant(raw: &str) -> Result<String, &'static str> {
    let participant = raw.trim();
    if participant.is_empty() {
        return Err("Enter your name.");
    }
    if participant.chars().count() > MAX_PARTICIPANT_CHARS {
        return Err("Names are limited to 64 characters.");
    }
    Ok(participant.to_string())
}

fn check_span(from: NaiveDate, to: NaiveDate) -> Result<(), String> {
    if to < from {
        return Err("The end date cannot be before the start date.".to_string());
    }
    if (to - from).num_days() + 1 > MAX_EVENT_DAYS {
        return Err(format!("Events can cover at most {MAX_EVENT_DAYS} days."));
    }
    Ok(())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// The create-event HTML form. Dates arrive as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CreateEventForm {
    pub event_name: String,
    pub date_from: String,
    pub date_to: String,
}

impl CreateEventForm {
    pub fn validate(&self) -> Result<NewEvent, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = check_event_name(&self.event_name)
            .map_err(|msg| errors.add("event_name", msg))
            .ok();

        let range = match (parse_date(&self.date_from), parse_date(&self.date_to)) {
            (Some(from), Some(to)) => match check_span(from, to) {
                Ok(()) => Some((from, to)),
                Err(msg) => {
                    errors.add("date_range", msg);
                    None
                }
            },
            _ => {
                errors.add("date_range", "Pick a start and end date.");
                None
            }
        };

        match (name, range) {
            (Some(name), Some((from, to))) => errors.into_result(NewEvent {
                name,
                start_date: start_of_day(from),
                end_date: start_of_day(to),
            }),
            _ => Err(errors),
        }
    }
}

/// JSON body for `POST /api/events`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<NewEvent, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = check_event_name(&self.name)
            .map_err(|msg| errors.add("name", msg))
            .ok();
        if self.end_date < self.start_date {
            errors.add("end_date", "The end date cannot be before the start date.");
        } else if let Err(msg) = check_span(self.start_date.date_naive(), self.end_date.date_naive()) {
            errors.add("end_date", msg);
        }

        match name {
            Some(name) => errors.into_result(NewEvent {
                name,
                start_date: self.start_date,
                end_date: self.end_date,
            }),
            None => Err(errors),
        }
    }
}

/// The join-event HTML form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct JoinEventForm {
    pub event_id: String,
}

impl JoinEventForm {
    /// Returns the trimmed identifier.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let event_id = self.event_id.trim();
        if event_id.is_empty() {
            return Err(FieldErrors::single("event_id", "Enter an event ID."));
        }
        Ok(event_id.to_string())
    }
}

/// A participant's picked days, checked against the days the event covers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AvailabilityRequest {
    pub participant: String,
    pub days: Vec<NaiveDate>,
}

impl AvailabilityRequest {
    /// Returns the trimmed participant name and the sorted, de-duplicated days.
    /// `allowed` must be sorted.
    pub fn validate(&self, allowed: &[NaiveDate]) -> Result<(String, Vec<NaiveDate>), FieldErrors> {
        let mut errors = FieldErrors::new();

        let participant = check_participant(&self.participant)
            .map_err(|msg| errors.add("participant", msg))
            .ok();

        if let Some(outside) = self.days.iter().find(|day| allowed.binary_search(day).is_err()) {
            errors.add(
                "days",
                format!("{} is outside the event's dates.", outside.format("%Y-%m-%d")),
            );
        }

        let days: DaySelection = self.days.iter().copied().collect();
        match participant {
            Some(participant) => {
                errors.into_result((participant, days.iter().copied().collect()))
            }
            None => Err(errors),
        }
    }
}

/// The availability HTML form; `days` is the comma separated selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AvailabilityForm {
    pub participant: String,
    pub days: String,
}

impl AvailabilityForm {
    pub fn selection(&self) -> DaySelection {
        DaySelection::parse(&self.days)
    }

    pub fn to_request(&self) -> AvailabilityRequest {
        AvailabilityRequest {
            participant: self.participant.clone(),
            days: self.selection().iter().copied().collect(),
        }
    }
}
