use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{SeatCommit, SeatIncrement};
use crate::services::ledger::BookingLedger;
use crate::services::slot_store::SlotStore;

/// Takes a seat and records the reservation as one unit. Either both
/// persist or neither does, including when the caller goes away midway.
#[async_trait]
pub trait ReservationCommit: Send + Sync {
    async fn commit(&self, subject_id: &str, slot_id: Uuid) -> Result<SeatCommit, BookingError>;
}

/// Commit built from a slot store and a ledger that share no transaction.
///
/// The increment, the append and the compensating release run on a detached
/// task. Dropping the future returned by `commit` (a client disconnect drops
/// the handler) leaves that task running, so the unit always reaches one of
/// its end states.
pub struct CompensatingCommit {
    slots: Arc<dyn SlotStore>,
    ledger: Arc<dyn BookingLedger>,
}

impl CompensatingCommit {
    pub fn new(slots: Arc<dyn SlotStore>, ledger: Arc<dyn BookingLedger>) -> Self {
        Self { slots, ledger }
    }
}

#[async_trait]
impl ReservationCommit for CompensatingCommit {
    async fn commit(&self, subject_id: &str, slot_id: Uuid) -> Result<SeatCommit, BookingError> {
        let slots = Arc::clone(&self.slots);
        let ledger = Arc::clone(&self.ledger);
        let subject_id = subject_id.to_string();

        let unit = tokio::spawn(async move {
            commit_unit(slots.as_ref(), ledger.as_ref(), &subject_id, slot_id).await
        });

        unit.await.map_err(|join_error| {
            error!(error = %join_error, "Commit task for slot {} did not finish", slot_id);
            BookingError::TransactionFailure(format!("commit task for slot {} aborted: {}", slot_id, join_error))
        })?
    }
}

async fn commit_unit(
    slots: &dyn SlotStore,
    ledger: &dyn BookingLedger,
    subject_id: &str,
    slot_id: Uuid,
) -> Result<SeatCommit, BookingError> {
    let booked_seats = match slots.try_increment_seats(slot_id).await? {
        SeatIncrement::Committed { booked_seats } => booked_seats,
        SeatIncrement::CapacityExceeded => return Ok(SeatCommit::CapacityExceeded),
        SeatIncrement::NotFound => return Ok(SeatCommit::NotFound),
    };
    debug!(booked_seats, "Seat increment committed, appending ledger entry");

    match ledger.append(subject_id, slot_id).await {
        Ok(reservation) => Ok(SeatCommit::Committed { booked_seats, reservation }),
        Err(append_error) => {
            release(slots, slot_id, &append_error).await?;

            match append_error {
                BookingError::DuplicateReservation { .. } => Ok(SeatCommit::Duplicate),
                other => Err(BookingError::TransactionFailure(other.to_string())),
            }
        }
    }
}

async fn release(slots: &dyn SlotStore, slot_id: Uuid, cause: &BookingError) -> Result<(), BookingError> {
    warn!(cause = %cause, "Ledger append failed, releasing seat");

    slots.release_seat(slot_id).await.map_err(|release_error| {
        error!(cause = %cause, error = %release_error, "Failed to release seat after ledger failure");
        BookingError::TransactionFailure(format!(
            "rollback of slot {} failed after '{}': {}",
            slot_id, cause, release_error
        ))
    })
}
