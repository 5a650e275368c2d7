pub mod availability;
pub mod event;
pub mod forms;
pub mod schedule;

pub use availability::{tally_by_day, Availability, DayTally};
pub use event::{Event, NewEvent};
pub use forms::FieldErrors;
pub use schedule::{day_sequence, DaySelection};
