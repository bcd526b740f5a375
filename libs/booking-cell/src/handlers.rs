use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::error::BookingError;
use crate::models::{BookSlotRequest, BookingOutcome};
use crate::services::booking::BookingService;

// `book` settles duplicates as AlreadyBooked, so one reaching this point is
// resolved by resending the request like any other retryable failure
fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::InvalidSubject(msg) | BookingError::InvalidSlot(msg) => AppError::ValidationError(msg),
        BookingError::DuplicateReservation { .. }
        | BookingError::TransactionFailure(_)
        | BookingError::Storage(_) => AppError::ServiceUnavailable(format!("{}; the request can be retried", e)),
    }
}

// ==============================================================================
// READ HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(service): State<Arc<BookingService>>,
) -> Result<Json<Value>, AppError> {
    let doctors = service.list_doctors().await.map_err(map_booking_error)?;
    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn list_doctor_slots(
    State(service): State<Arc<BookingService>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let slots = service.list_slots(doctor_id).await.map_err(map_booking_error)?;
    Ok(Json(json!(slots)))
}

/// Targeted re-fetch of one slot, e.g. after a booking came back full.
#[axum::debug_handler]
pub async fn get_slot(
    State(service): State<Arc<BookingService>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let slot = service.get_slot(slot_id).await
        .map_err(map_booking_error)?
        .ok_or_else(|| AppError::NotFound(format!("Slot {} not found", slot_id)))?;

    Ok(Json(json!(slot)))
}

// ==============================================================================
// BOOKING HANDLER
// ==============================================================================

#[axum::debug_handler]
pub async fn book_slot(
    State(service): State<Arc<BookingService>>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Response, AppError> {
    let outcome = service.book(&request.subject_id, request.slot_id).await
        .map_err(map_booking_error)?;

    match outcome {
        BookingOutcome::Confirmed { reservation_id } => Ok((
            StatusCode::CREATED,
            Json(json!({
                "status": "SUCCESS",
                "outcome": "confirmed",
                "reservation_id": reservation_id,
                "message": "Booking confirmed"
            })),
        ).into_response()),
        BookingOutcome::AlreadyBooked { reservation_id } => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "SUCCESS",
                "outcome": "already_booked",
                "reservation_id": reservation_id,
                "message": "You already hold a seat in this slot"
            })),
        ).into_response()),
        BookingOutcome::Full => {
            // The snapshot lets the client refresh just this slot
            let slot = match service.get_slot(request.slot_id).await {
                Ok(slot) => slot,
                Err(e) => {
                    warn!("Could not load snapshot of full slot {}: {}", request.slot_id, e);
                    None
                }
            };

            Ok((
                StatusCode::CONFLICT,
                Json(json!({
                    "status": "FULL",
                    "outcome": "full",
                    "error": "Slot is fully booked, please choose another slot",
                    "slot": slot
                })),
            ).into_response())
        }
        BookingOutcome::SlotNotFound => {
            Err(AppError::NotFound(format!("Slot {} not found", request.slot_id)))
        }
    }
}
