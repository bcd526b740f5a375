use thiserror::Error;
use uuid::Uuid;

use doctor_cell::DoctorError;
use shared_database::DatabaseError;

/// Failures of the booking core. Capacity and duplicate outcomes are
/// reported as `ReservationResult` variants, not through this type.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Subject {subject_id} already holds a reservation for slot {slot_id}")]
    DuplicateReservation { subject_id: String, slot_id: Uuid },

    #[error("Booking transaction failed: {0}")]
    TransactionFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Invalid subject: {0}")]
    InvalidSubject(String),
}

impl BookingError {
    /// Whether the caller may retry the same request unchanged. A retried
    /// duplicate resolves to the reservation that is already stored.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::DuplicateReservation { .. } | BookingError::TransactionFailure(_) | BookingError::Storage(_)
        )
    }
}

impl From<DatabaseError> for BookingError {
    fn from(e: DatabaseError) -> Self {
        BookingError::Storage(e.to_string())
    }
}

impl From<DoctorError> for BookingError {
    fn from(e: DoctorError) -> Self {
        BookingError::Storage(e.to_string())
    }
}
