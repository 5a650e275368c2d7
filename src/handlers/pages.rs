//! The HTML views: landing, create, join and the event page.
//!
//! Store failures never escape as bare errors here. Each one is logged and
//! turned into a notice on the page that triggered it, so the visitor can retry.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::info;

use crate::models::forms::{AvailabilityForm, CreateEventForm, JoinEventForm};
use crate::models::schedule::parse_date;
use crate::models::{tally_by_day, DaySelection, Event, FieldErrors};
use crate::store::StoreError;
use crate::utils::AppError;
use crate::views::{EventPage, Notice};
use crate::AppState;

type PageResult = Result<Response, AppError>;

fn page(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}

pub async fn landing(State(state): State<AppState>) -> PageResult {
    Ok(page(StatusCode::OK, state.views.landing()?))
}

pub async fn not_found(State(state): State<AppState>) -> PageResult {
    let body = state.views.message("Page not found", None)?;
    Ok(page(StatusCode::NOT_FOUND, body))
}

pub async fn create_event_page(State(state): State<AppState>) -> PageResult {
    let body = state
        .views
        .create_event(&CreateEventForm::default(), None, None, None)?;
    Ok(page(StatusCode::OK, body))
}

pub async fn create_event(
    State(state): State<AppState>,
    Form(form): Form<CreateEventForm>,
) -> PageResult {
    let new_event = match form.validate() {
        Ok(new_event) => new_event,
        Err(errors) => {
            let body = state.views.create_event(&form, Some(&errors), None, None)?;
            return Ok(page(StatusCode::UNPROCESSABLE_ENTITY, body));
        }
    };

    match state.store.insert_event(&new_event).await {
        Ok(event) => {
            info!(event_id = %event.id, name = %event.name, "Event created");
            let notice = Notice::info("Event created!", format!("Event ID: {}", event.id));
            let body = state.views.create_event(
                &CreateEventForm::default(),
                None,
                Some(&event),
                Some(notice),
            )?;
            Ok(page(StatusCode::CREATED, body))
        }
        Err(err) => {
            let err = AppError::from(err);
            err.log();

            // Keep what was typed so the visitor can resubmit.
            let notice = Notice::destructive(
                "Something went wrong",
                "Creating the event failed. Please try again.",
            );
            let body = state.views.create_event(&form, None, None, Some(notice))?;
            Ok(page(err.status_code(), body))
        }
    }
}

pub async fn join_event_page(State(state): State<AppState>) -> PageResult {
    let body = state
        .views
        .join_event(&JoinEventForm::default(), None, None)?;
    Ok(page(StatusCode::OK, body))
}

pub async fn join_event(
    State(state): State<AppState>,
    Form(form): Form<JoinEventForm>,
) -> PageResult {
    let event_id = match form.validate() {
        Ok(event_id) => event_id,
        Err(errors) => {
            let body = state.views.join_event(&form, Some(&errors), None)?;
            return Ok(page(StatusCode::UNPROCESSABLE_ENTITY, body));
        }
    };

    let err = match state.store.find_event(&event_id).await {
        Ok(event) => {
            info!(event_id = %event.id, "Joining event");
            return Ok(Redirect::to(&format!("/event/{}", event.id)).into_response());
        }
        Err(err) => AppError::from(err),
    };
    err.log();

    let notice = match &err {
        AppError::NotFound(_) => Notice::destructive(
            "Event not found",
            "Check that you entered the right event ID.",
        ),
        _ => Notice::destructive(
            "Something went wrong",
            "Joining the event failed. Please try again.",
        ),
    };
    let body = state.views.join_event(&form, None, Some(notice))?;
    Ok(page(err.status_code(), body))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SelectionQuery {
    /// Comma separated days already picked.
    selected: String,
    /// One day to flip.
    toggle: Option<String>,
}

pub async fn event_page(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> PageResult {
    let event = match state.store.find_event(&raw_id).await {
        Ok(event) => event,
        Err(err) => return load_failure(&state, err),
    };

    let days = event.days();
    let mut selection = DaySelection::parse(&query.selected);
    selection.retain_within(&days);
    if let Some(day) = query.toggle.as_deref().and_then(parse_date) {
        if days.contains(&day) {
            selection.toggle(day);
        }
    }

    render_event(&state, &event, &selection, "", None, None, StatusCode::OK).await
}

pub async fn save_availability(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<AvailabilityForm>,
) -> PageResult {
    let event = match state.store.find_event(&raw_id).await {
        Ok(event) => event,
        Err(err) => return load_failure(&state, err),
    };

    let days = event.days();
    let mut selection = form.selection();
    selection.retain_within(&days);

    let (participant, picked) = match form.to_request().validate(&days) {
        Ok(valid) => valid,
        Err(errors) => {
            return render_event(
                &state,
                &event,
                &selection,
                &form.participant,
                Some(&errors),
                None,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match state
        .store
        .save_availability(event.id, &participant, &picked)
        .await
    {
        Ok(saved) => {
            info!(
                event_id = %event.id,
                participant = %saved.participant,
                days = saved.days.len(),
                "Availability saved"
            );
            let notice = Notice::info(
                "Selection saved",
                format!("{} day(s) saved for {}.", saved.days.len(), saved.participant),
            );
            let selection: DaySelection = saved.days.iter().copied().collect();
            render_event(
                &state,
                &event,
                &selection,
                &saved.participant,
                None,
                Some(notice),
                StatusCode::OK,
            )
            .await
        }
        Err(StoreError::NotFound) => load_failure(&state, StoreError::NotFound),
        Err(err) => {
            let err = AppError::from(err);
            err.log();

            let notice = Notice::destructive(
                "Something went wrong",
                "Saving your days failed. Please try again.",
            );
            render_event(
                &state,
                &event,
                &selection,
                &form.participant,
                None,
                Some(notice),
                err.status_code(),
            )
            .await
        }
    }
}

async fn render_event(
    state: &AppState,
    event: &Event,
    selection: &DaySelection,
    participant: &str,
    errors: Option<&FieldErrors>,
    notice: Option<Notice>,
    status: StatusCode,
) -> PageResult {
    let entries = match state.store.list_availability(event.id).await {
        Ok(entries) => entries,
        Err(err) => return load_failure(state, err),
    };
    let tally = tally_by_day(&event.days(), &entries);

    let body = state.views.event(EventPage {
        event,
        selection,
        tally: &tally,
        participant,
        errors,
        notice,
    })?;
    Ok(page(status, body))
}

fn load_failure(state: &AppState, err: StoreError) -> PageResult {
    let err = AppError::from(err);
    err.log();

    let (heading, notice) = match &err {
        AppError::NotFound(_) => ("Event not found", None),
        _ => (
            "Event unavailable",
            Some(Notice::destructive(
                "Loading the event failed",
                "Please try again.",
            )),
        ),
    };
    let body = state.views.message(heading, notice)?;
    Ok(page(err.status_code(), body))
}
