//! HTML pages, rendered from the tera templates under `templates/`.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tera::{Context, Tera};

use crate::models::forms::{CreateEventForm, JoinEventForm};
use crate::models::schedule::DATE_FORMAT;
use crate::models::{DaySelection, DayTally, Event, FieldErrors};

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("landing.html", include_str!("../../templates/landing.html")),
    ("create_event.html", include_str!("../../templates/create_event.html")),
    ("join_event.html", include_str!("../../templates/join_event.html")),
    ("event.html", include_str!("../../templates/event.html")),
    ("message.html", include_str!("../../templates/message.html")),
];

/// A toast shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            destructive: false,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            destructive: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct DayCell {
    label: String,
    selected: bool,
    count: usize,
    toggle_href: String,
}

/// Everything the event page shows.
#[derive(Debug)]
pub struct EventPage<'a> {
    pub event: &'a Event,
    pub selection: &'a DaySelection,
    pub tally: &'a [DayTally],
    pub participant: &'a str,
    pub errors: Option<&'a FieldErrors>,
    pub notice: Option<Notice>,
}

/// The compiled templates, shared by every handler.
#[derive(Clone)]
pub struct Views {
    tera: Arc<Tera>,
}

impl Views {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    fn render(&self, template: &str, mut context: Context, notice: Option<Notice>) -> Result<String, tera::Error> {
        context.insert("notice", &notice);
        self.tera.render(template, &context)
    }

    pub fn landing(&self) -> Result<String, tera::Error> {
        self.render("landing.html", Context::new(), None)
    }

    pub fn create_event(
        &self,
        form: &CreateEventForm,
        errors: Option<&FieldErrors>,
        created: Option<&Event>,
        notice: Option<Notice>,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("form", form);
        context.insert("errors", &errors.cloned().unwrap_or_default());
        context.insert("created", &created);
        self.render("create_event.html", context, notice)
    }

    pub fn join_event(
        &self,
        form: &JoinEventForm,
        errors: Option<&FieldErrors>,
        notice: Option<Notice>,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("form", form);
        context.insert("errors", &errors.cloned().unwrap_or_default());
        self.render("join_event.html", context, notice)
    }

    pub fn event(&self, page: EventPage<'_>) -> Result<String, tera::Error> {
        let event = page.event;
        let days: Vec<DayCell> = page
            .tally
            .iter()
            .map(|row| DayCell {
                label: row.day.format("%a %b %-d").to_string(),
                selected: page.selection.contains(&row.day),
                count: row.participants.len(),
                toggle_href: toggle_href(event, page.selection, row.day),
            })
            .collect();
        let has_answers = page.tally.iter().any(|row| !row.participants.is_empty());

        let mut context = Context::new();
        context.insert("event", event);
        context.insert(
            "range_label",
            &format!(
                "{} – {}",
                event.start_date.format("%B %-d, %Y"),
                event.end_date.format("%B %-d, %Y")
            ),
        );
        context.insert("days", &days);
        context.insert("selection", &page.selection.to_string());
        context.insert("participant", page.participant);
        context.insert("errors", &page.errors.cloned().unwrap_or_default());
        if has_answers {
            context.insert("tally", page.tally);
        } else {
            context.insert("tally", &Vec::<DayTally>::new());
        }
        self.render("event.html", context, page.notice)
    }

    /// A page with just a heading, used when there is nothing else to show.
    pub fn message(&self, heading: &str, notice: Option<Notice>) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("heading", heading);
        self.render("message.html", context, notice)
    }
}

/// Link that re-renders the page with `day` flipped in the current selection.
fn toggle_href(event: &Event, selection: &DaySelection, day: NaiveDate) -> String {
    let day = day.format(DATE_FORMAT);
    if selection.is_empty() {
        format!("/event/{}?toggle={}", event.id, day)
    } else {
        format!("/event/{}?selected={}&toggle={}", event.id, selection, day)
    }
}
