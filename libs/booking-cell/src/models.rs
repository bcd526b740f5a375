use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::BookingError;

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// A bookable window for one doctor. `booked_seats` never exceeds `total_seats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_seats: u32,
    pub booked_seats: u32,
}

impl Slot {
    pub fn new(
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        total_seats: u32,
    ) -> Result<Self, BookingError> {
        if end_time <= start_time {
            return Err(BookingError::InvalidSlot(format!(
                "end time {} must be after start time {}",
                end_time, start_time
            )));
        }
        if total_seats == 0 {
            return Err(BookingError::InvalidSlot("total seats must be positive".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            doctor_id,
            start_time,
            end_time,
            total_seats,
            booked_seats: 0,
        })
    }

    pub fn is_full(&self) -> bool {
        self.booked_seats >= self.total_seats
    }

    pub fn remaining_seats(&self) -> u32 {
        self.total_seats.saturating_sub(self.booked_seats)
    }
}

/// Result of the conditional seat increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeatIncrement {
    Committed { booked_seats: u32 },
    CapacityExceeded,
    NotFound,
}

/// Result of the seat increment and ledger append run as one unit.
/// Anything other than `Committed` leaves both untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeatCommit {
    Committed { booked_seats: u32, reservation: Reservation },
    CapacityExceeded,
    /// The (subject, slot) pair was already in the ledger.
    Duplicate,
    NotFound,
}

// ==============================================================================
// RESERVATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    // Never produced yet; cancellation would be a separate transaction
    Cancelled,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub subject_id: String,
    pub slot_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn confirmed(subject_id: impl Into<String>, slot_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            slot_id,
            created_at: Utc::now(),
            status: ReservationStatus::Confirmed,
        }
    }
}

/// Terminal outcome of one reservation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationResult {
    Confirmed(Reservation),
    Full,
    SlotNotFound,
    AlreadyBooked(Reservation),
}

impl ReservationResult {
    pub fn reservation(&self) -> Option<&Reservation> {
        match self {
            ReservationResult::Confirmed(r) | ReservationResult::AlreadyBooked(r) => Some(r),
            ReservationResult::Full | ReservationResult::SlotNotFound => None,
        }
    }
}

// ==============================================================================
// BOUNDARY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookingOutcome {
    Confirmed { reservation_id: Uuid },
    Full,
    SlotNotFound,
    AlreadyBooked { reservation_id: Uuid },
}

impl From<&ReservationResult> for BookingOutcome {
    fn from(result: &ReservationResult) -> Self {
        match result {
            ReservationResult::Confirmed(r) => BookingOutcome::Confirmed { reservation_id: r.id },
            ReservationResult::Full => BookingOutcome::Full,
            ReservationResult::SlotNotFound => BookingOutcome::SlotNotFound,
            ReservationResult::AlreadyBooked(r) => BookingOutcome::AlreadyBooked { reservation_id: r.id },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookSlotRequest {
    #[serde(alias = "userId", alias = "user_id")]
    pub subject_id: String,
    #[serde(alias = "slotId")]
    pub slot_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn slot_rejects_inverted_window() {
        let start = Utc::now();
        let result = Slot::new(Uuid::new_v4(), start, start - Duration::minutes(30), 2);
        assert!(matches!(result, Err(BookingError::InvalidSlot(_))));
    }

    #[test]
    fn slot_rejects_zero_capacity() {
        let start = Utc::now();
        let result = Slot::new(Uuid::new_v4(), start, start + Duration::minutes(30), 0);
        assert!(matches!(result, Err(BookingError::InvalidSlot(_))));
    }

    #[test]
    fn slot_tracks_remaining_seats() {
        let start = Utc::now();
        let mut slot = Slot::new(Uuid::new_v4(), start, start + Duration::hours(1), 2).unwrap();
        assert_eq!(slot.remaining_seats(), 2);
        assert!(!slot.is_full());

        slot.booked_seats = 2;
        assert_eq!(slot.remaining_seats(), 0);
        assert!(slot.is_full());
    }

    #[test]
    fn seat_increment_decodes_rpc_payloads() {
        let committed: SeatIncrement =
            serde_json::from_value(json!({ "status": "committed", "booked_seats": 3 })).unwrap();
        assert_eq!(committed, SeatIncrement::Committed { booked_seats: 3 });

        let full: SeatIncrement =
            serde_json::from_value(json!({ "status": "capacity_exceeded" })).unwrap();
        assert_eq!(full, SeatIncrement::CapacityExceeded);
    }

    #[test]
    fn seat_commit_decodes_reserve_slot_payloads() {
        let slot_id = Uuid::new_v4();
        let committed: SeatCommit = serde_json::from_value(json!({
            "status": "committed",
            "booked_seats": 1,
            "reservation": {
                "id": Uuid::new_v4(),
                "subject_id": "u1",
                "slot_id": slot_id,
                "created_at": "2030-01-01T08:00:00.123456+00:00",
                "status": "confirmed"
            }
        }))
        .unwrap();
        assert!(matches!(
            committed,
            SeatCommit::Committed { booked_seats: 1, ref reservation } if reservation.slot_id == slot_id
        ));

        let duplicate: SeatCommit = serde_json::from_value(json!({ "status": "duplicate" })).unwrap();
        assert_eq!(duplicate, SeatCommit::Duplicate);
    }

    #[test]
    fn book_request_accepts_camel_case_fields() {
        let slot_id = Uuid::new_v4();
        let request: BookSlotRequest =
            serde_json::from_value(json!({ "userId": "u1", "slotId": slot_id })).unwrap();
        assert_eq!(request.subject_id, "u1");
        assert_eq!(request.slot_id, slot_id);
    }

    #[test]
    fn booking_outcome_serializes_with_tag() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(BookingOutcome::AlreadyBooked { reservation_id: id }).unwrap();
        assert_eq!(value["outcome"], "already_booked");
        assert_eq!(value["reservation_id"], json!(id));
    }
}
