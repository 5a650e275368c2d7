use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive list of calendar days from `start` to `end`.
///
/// A reversed range yields no days.
pub fn day_sequence(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// The days a visitor has picked on the event page.
///
/// Carried between requests as a comma separated list of `YYYY-MM-DD` dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySelection {
    days: BTreeSet<NaiveDate>,
}

impl DaySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated list, skipping blanks and anything that is not
    /// a date.
    pub fn parse(raw: &str) -> Self {
        Self {
            days: raw.split(',').filter_map(parse_date).collect(),
        }
    }

    /// Adds `day` if absent, removes it otherwise.
    pub fn toggle(&mut self, day: NaiveDate) {
        if !self.days.remove(&day) {
            self.days.insert(day);
        }
    }

    pub fn contains(&self, day: &NaiveDate) -> bool {
        self.days.contains(day)
    }

    /// Drops every day that is not part of `allowed`, which must be sorted.
    pub fn retain_within(&mut self, allowed: &[NaiveDate]) {
        self.days.retain(|day| allowed.binary_search(day).is_ok());
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.days.iter()
    }
}

impl fmt::Display for DaySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .days
            .iter()
            .map(|day| day.format(DATE_FORMAT).to_string())
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl FromIterator<NaiveDate> for DaySelection {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}
