use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{Reservation, ReservationStatus};

/// Append-only record of reservations, unique per (subject, slot).
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// The subject's confirmed reservation for the slot, if any.
    async fn find_reservation(&self, subject_id: &str, slot_id: Uuid) -> Result<Option<Reservation>, BookingError>;

    async fn has_reservation(&self, subject_id: &str, slot_id: Uuid) -> Result<bool, BookingError> {
        Ok(self.find_reservation(subject_id, slot_id).await?.is_some())
    }

    /// Inserts a confirmed reservation. Fails with `DuplicateReservation`
    /// when the pair is already present, whoever inserted it.
    async fn append(&self, subject_id: &str, slot_id: Uuid) -> Result<Reservation, BookingError>;

    /// Audit view, oldest first.
    async fn reservations_for_slot(&self, slot_id: Uuid) -> Result<Vec<Reservation>, BookingError>;
}

#[derive(Default)]
struct LedgerState {
    entries: Vec<Reservation>,
    by_key: HashMap<(String, Uuid), usize>,
}

#[derive(Default)]
pub struct InMemoryBookingLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BookingLedger for InMemoryBookingLedger {
    async fn find_reservation(&self, subject_id: &str, slot_id: Uuid) -> Result<Option<Reservation>, BookingError> {
        let state = self.state.read().await;
        Ok(state
            .by_key
            .get(&(subject_id.to_string(), slot_id))
            .map(|&index| &state.entries[index])
            .filter(|r| r.status == ReservationStatus::Confirmed)
            .cloned())
    }

    async fn append(&self, subject_id: &str, slot_id: Uuid) -> Result<Reservation, BookingError> {
        let mut state = self.state.write().await;
        let key = (subject_id.to_string(), slot_id);

        if state.by_key.contains_key(&key) {
            return Err(BookingError::DuplicateReservation {
                subject_id: subject_id.to_string(),
                slot_id,
            });
        }

        let reservation = Reservation::confirmed(subject_id, slot_id);
        let index = state.entries.len();
        state.entries.push(reservation.clone());
        state.by_key.insert(key, index);
        Ok(reservation)
    }

    async fn reservations_for_slot(&self, slot_id: Uuid) -> Result<Vec<Reservation>, BookingError> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|r| r.slot_id == slot_id)
            .cloned()
            .collect())
    }
}
