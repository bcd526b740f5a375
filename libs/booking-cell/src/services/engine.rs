use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{ReservationResult, SeatCommit};
use crate::services::commit::{CompensatingCommit, ReservationCommit};
use crate::services::ledger::BookingLedger;
use crate::services::slot_store::SlotStore;

/// Runs one booking attempt against the slot store and the ledger.
///
/// An attempt moves through
/// `RECEIVED -> VALIDATED -> {DUPLICATE_FOUND | CAPACITY_CHECKED} -> {COMMITTED | ROLLED_BACK}`
/// and ends in one of the `ReservationResult` variants. The seat increment and
/// the ledger append go through a `ReservationCommit`, which persists both or
/// neither even when the attempt is dropped midway.
///
/// `Full` is terminal. The engine never retries it, since a retry could hand a
/// freed seat to a caller that arrived later.
pub struct ReservationEngine {
    slots: Arc<dyn SlotStore>,
    ledger: Arc<dyn BookingLedger>,
    commit: Arc<dyn ReservationCommit>,
}

impl ReservationEngine {
    /// Engine whose commit compensates a failed append by releasing the seat.
    pub fn new(slots: Arc<dyn SlotStore>, ledger: Arc<dyn BookingLedger>) -> Self {
        let commit = Arc::new(CompensatingCommit::new(Arc::clone(&slots), Arc::clone(&ledger)));
        Self::with_commit(slots, ledger, commit)
    }

    pub fn with_commit(
        slots: Arc<dyn SlotStore>,
        ledger: Arc<dyn BookingLedger>,
        commit: Arc<dyn ReservationCommit>,
    ) -> Self {
        Self { slots, ledger, commit }
    }

    pub fn slots(&self) -> &Arc<dyn SlotStore> {
        &self.slots
    }

    #[instrument(skip(self))]
    pub async fn reserve(&self, subject_id: &str, slot_id: Uuid) -> Result<ReservationResult, BookingError> {
        debug!("Reservation attempt received");

        if self.slots.get_slot(slot_id).await?.is_none() {
            info!("Reservation rejected: slot not found");
            return Ok(ReservationResult::SlotNotFound);
        }
        debug!("Slot validated");

        if let Some(existing) = self.ledger.find_reservation(subject_id, slot_id).await? {
            info!(reservation_id = %existing.id, "Subject already holds this slot");
            return Ok(ReservationResult::AlreadyBooked(existing));
        }

        match self.commit.commit(subject_id, slot_id).await? {
            SeatCommit::Committed { booked_seats, reservation } => {
                info!(reservation_id = %reservation.id, booked_seats, "Reservation confirmed");
                Ok(ReservationResult::Confirmed(reservation))
            }
            SeatCommit::CapacityExceeded => self.resolve_full(subject_id, slot_id).await,
            SeatCommit::NotFound => {
                info!("Reservation rejected: slot vanished before the capacity check");
                Ok(ReservationResult::SlotNotFound)
            }
            // A concurrent retry by the same subject won the insert
            SeatCommit::Duplicate => match self.ledger.find_reservation(subject_id, slot_id).await? {
                Some(existing) => {
                    info!(reservation_id = %existing.id, "Duplicate insert resolved to existing reservation");
                    Ok(ReservationResult::AlreadyBooked(existing))
                }
                None => Err(BookingError::TransactionFailure(format!(
                    "ledger reported a duplicate for slot {} but holds no reservation",
                    slot_id
                ))),
            },
        }
    }

    /// Capacity was exhausted. The subject may still hold a seat taken by an
    /// earlier attempt of its own that committed in the meantime.
    async fn resolve_full(&self, subject_id: &str, slot_id: Uuid) -> Result<ReservationResult, BookingError> {
        if let Some(existing) = self.ledger.find_reservation(subject_id, slot_id).await? {
            info!(reservation_id = %existing.id, "Slot full but subject already holds a seat");
            return Ok(ReservationResult::AlreadyBooked(existing));
        }

        info!("Reservation rejected: slot is full");
        Ok(ReservationResult::Full)
    }
}
