use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{SeatIncrement, Slot};

/// Source of truth for slot capacity and occupancy.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<Slot>, BookingError>;

    /// Check-and-increment as one atomic step per slot. Returns
    /// `CapacityExceeded` when `booked_seats == total_seats` at the instant
    /// of the check.
    async fn try_increment_seats(&self, slot_id: Uuid) -> Result<SeatIncrement, BookingError>;

    /// Undo one committed increment. Only the reservation engine's rollback
    /// path calls this.
    async fn release_seat(&self, slot_id: Uuid) -> Result<(), BookingError>;

    /// Slots of one doctor ordered by start time.
    async fn list_slots(&self, doctor_id: Uuid) -> Result<Vec<Slot>, BookingError>;
}

/// Process-local store. Each slot is its own row behind a mutex, so
/// contention on one slot never blocks another.
#[derive(Default)]
pub struct InMemorySlotStore {
    rows: RwLock<HashMap<Uuid, Arc<Mutex<Slot>>>>,
}

impl InMemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_slots(slots: impl IntoIterator<Item = Slot>) -> Result<Self, BookingError> {
        let store = Self::new();
        for slot in slots {
            store.insert(slot).await?;
        }
        Ok(store)
    }

    pub async fn insert(&self, slot: Slot) -> Result<(), BookingError> {
        if slot.booked_seats > slot.total_seats {
            return Err(BookingError::InvalidSlot(format!(
                "slot {} has {} booked seats but only {} total",
                slot.id, slot.booked_seats, slot.total_seats
            )));
        }

        let mut rows = self.rows.write().await;
        if rows.contains_key(&slot.id) {
            return Err(BookingError::InvalidSlot(format!("slot {} already exists", slot.id)));
        }
        rows.insert(slot.id, Arc::new(Mutex::new(slot)));
        Ok(())
    }

    // The index lock is released before the row lock is taken
    async fn row(&self, slot_id: Uuid) -> Option<Arc<Mutex<Slot>>> {
        self.rows.read().await.get(&slot_id).cloned()
    }
}

#[async_trait]
impl SlotStore for InMemorySlotStore {
    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<Slot>, BookingError> {
        match self.row(slot_id).await {
            Some(row) => Ok(Some(row.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn try_increment_seats(&self, slot_id: Uuid) -> Result<SeatIncrement, BookingError> {
        let Some(row) = self.row(slot_id).await else {
            return Ok(SeatIncrement::NotFound);
        };

        let mut slot = row.lock().await;
        if slot.booked_seats >= slot.total_seats {
            debug!("Slot {} is full ({}/{})", slot_id, slot.booked_seats, slot.total_seats);
            return Ok(SeatIncrement::CapacityExceeded);
        }

        slot.booked_seats += 1;
        Ok(SeatIncrement::Committed { booked_seats: slot.booked_seats })
    }

    async fn release_seat(&self, slot_id: Uuid) -> Result<(), BookingError> {
        let row = self.row(slot_id).await.ok_or_else(|| {
            BookingError::Storage(format!("slot {} disappeared before its seat could be released", slot_id))
        })?;

        let mut slot = row.lock().await;
        slot.booked_seats = slot.booked_seats.saturating_sub(1);
        debug!("Released seat on slot {} ({}/{})", slot_id, slot.booked_seats, slot.total_seats);
        Ok(())
    }

    async fn list_slots(&self, doctor_id: Uuid) -> Result<Vec<Slot>, BookingError> {
        let rows: Vec<Arc<Mutex<Slot>>> = self.rows.read().await.values().cloned().collect();

        let mut slots = Vec::new();
        for row in rows {
            let slot = row.lock().await;
            if slot.doctor_id == doctor_id {
                slots.push(slot.clone());
            }
        }

        slots.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn slot(doctor_id: Uuid, hours_from_now: i64, total_seats: u32) -> Slot {
        let start = Utc::now() + Duration::hours(hours_from_now);
        Slot::new(doctor_id, start, start + Duration::minutes(30), total_seats).unwrap()
    }

    #[tokio::test]
    async fn increments_until_capacity() {
        let slot = slot(Uuid::new_v4(), 1, 2);
        let slot_id = slot.id;
        let store = InMemorySlotStore::with_slots(vec![slot]).await.unwrap();

        assert_eq!(store.try_increment_seats(slot_id).await.unwrap(), SeatIncrement::Committed { booked_seats: 1 });
        assert_eq!(store.try_increment_seats(slot_id).await.unwrap(), SeatIncrement::Committed { booked_seats: 2 });
        assert_eq!(store.try_increment_seats(slot_id).await.unwrap(), SeatIncrement::CapacityExceeded);
        assert_eq!(store.get_slot(slot_id).await.unwrap().unwrap().booked_seats, 2);
    }

    #[tokio::test]
    async fn unknown_slot_reports_not_found() {
        let store = InMemorySlotStore::new();
        assert_eq!(store.try_increment_seats(Uuid::new_v4()).await.unwrap(), SeatIncrement::NotFound);
        assert!(store.get_slot(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn release_never_goes_below_zero() {
        let slot = slot(Uuid::new_v4(), 1, 1);
        let slot_id = slot.id;
        let store = InMemorySlotStore::with_slots(vec![slot]).await.unwrap();

        store.release_seat(slot_id).await.unwrap();
        assert_eq!(store.get_slot(slot_id).await.unwrap().unwrap().booked_seats, 0);
    }

    #[tokio::test]
    async fn rejects_duplicate_and_overbooked_inserts() {
        let mut overbooked = slot(Uuid::new_v4(), 1, 1);
        overbooked.booked_seats = 2;
        let store = InMemorySlotStore::new();
        assert!(matches!(store.insert(overbooked).await, Err(BookingError::InvalidSlot(_))));

        let ok = slot(Uuid::new_v4(), 1, 1);
        store.insert(ok.clone()).await.unwrap();
        assert!(matches!(store.insert(ok).await, Err(BookingError::InvalidSlot(_))));
    }

    #[tokio::test]
    async fn lists_only_the_doctors_slots_by_start_time() {
        let doctor_id = Uuid::new_v4();
        let later = slot(doctor_id, 5, 1);
        let earlier = slot(doctor_id, 2, 1);
        let other = slot(Uuid::new_v4(), 1, 1);
        let store = InMemorySlotStore::with_slots(vec![later.clone(), other, earlier.clone()])
            .await
            .unwrap();

        let slots = store.list_slots(doctor_id).await.unwrap();
        assert_eq!(slots.iter().map(|s| s.id).collect::<Vec<_>>(), vec![earlier.id, later.id]);
    }
}
