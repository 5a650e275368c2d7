use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::forms::{AvailabilityRequest, CreateEventRequest};
use crate::models::FieldErrors;
use crate::utils::response::{created, success};
use crate::utils::AppError;
use crate::AppState;

#[derive(Serialize)]
struct DaysPayload {
    event_id: Uuid,
    days: Vec<NaiveDate>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| FieldErrors::single("body", rejection.body_text()).into())
}

pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let new_event = body(payload)?.validate()?;
    let event = state.store.insert_event(&new_event).await?;

    info!(event_id = %event.id, name = %event.name, "Event created");
    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let event = state.store.find_event(&raw_id).await?;
    Ok(success(event, "Event found"))
}

pub async fn get_days(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let event = state.store.find_event(&raw_id).await?;
    let payload = DaysPayload {
        event_id: event.id,
        days: event.days(),
    };
    Ok(success(payload, "Days derived"))
}

pub async fn list_availability(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let event = state.store.find_event(&raw_id).await?;
    let entries = state.store.list_availability(event.id).await?;
    Ok(success(entries, "Availability listed"))
}

pub async fn save_availability(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = body(payload)?;
    let event = state.store.find_event(&raw_id).await?;
    let (participant, days) = request.validate(&event.days())?;

    let saved = state
        .store
        .save_availability(event.id, &participant, &days)
        .await?;

    info!(
        event_id = %event.id,
        participant = %saved.participant,
        days = saved.days.len(),
        "Availability saved"
    );
    Ok(success(saved, "Availability saved"))
}
