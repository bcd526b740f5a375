use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use crate::error::BookingError;
use crate::models::{Reservation, ReservationStatus, SeatCommit, SeatIncrement, Slot};
use crate::services::commit::ReservationCommit;
use crate::services::ledger::BookingLedger;
use crate::services::slot_store::SlotStore;

/// Slot store backed by the `slots` relation. The conditional increment runs
/// inside Postgres as `try_increment_slot_seats`, a single guarded UPDATE.
pub struct SupabaseSlotStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseSlotStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReleaseResponse {
    Released { booked_seats: u32 },
    NotFound,
}

#[async_trait]
impl SlotStore for SupabaseSlotStore {
    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<Slot>, BookingError> {
        let path = format!("/rest/v1/slots?id=eq.{}&select=*", slot_id);
        let result: Vec<Slot> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    async fn try_increment_seats(&self, slot_id: Uuid) -> Result<SeatIncrement, BookingError> {
        debug!("Requesting conditional seat increment for slot {}", slot_id);

        let outcome: SeatIncrement = self.supabase
            .rpc("try_increment_slot_seats", json!({ "p_slot_id": slot_id }))
            .await?;

        Ok(outcome)
    }

    async fn release_seat(&self, slot_id: Uuid) -> Result<(), BookingError> {
        let response: ReleaseResponse = self.supabase
            .rpc("release_slot_seat", json!({ "p_slot_id": slot_id }))
            .await?;

        match response {
            ReleaseResponse::Released { booked_seats } => {
                debug!("Released seat on slot {} ({} booked)", slot_id, booked_seats);
                Ok(())
            }
            ReleaseResponse::NotFound => Err(BookingError::Storage(format!(
                "slot {} disappeared before its seat could be released",
                slot_id
            ))),
        }
    }

    async fn list_slots(&self, doctor_id: Uuid) -> Result<Vec<Slot>, BookingError> {
        let path = format!(
            "/rest/v1/slots?doctor_id=eq.{}&select=*&order=start_time.asc",
            doctor_id
        );

        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }
}

/// Ledger backed by the `reservations` relation. Uniqueness of
/// (subject_id, slot_id) is a table constraint; PostgREST reports a
/// violation as HTTP 409.
pub struct SupabaseBookingLedger {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseBookingLedger {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl BookingLedger for SupabaseBookingLedger {
    async fn find_reservation(&self, subject_id: &str, slot_id: Uuid) -> Result<Option<Reservation>, BookingError> {
        let path = format!(
            "/rest/v1/reservations?subject_id=eq.{}&slot_id=eq.{}&status=eq.{}&select=*",
            urlencoding::encode(subject_id),
            slot_id,
            ReservationStatus::Confirmed,
        );

        let result: Vec<Reservation> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    async fn append(&self, subject_id: &str, slot_id: Uuid) -> Result<Reservation, BookingError> {
        let reservation = Reservation::confirmed(subject_id, slot_id);
        let row = serde_json::to_value(&reservation)
            .map_err(|e| BookingError::Storage(e.to_string()))?;

        let inserted: Vec<Reservation> = match self.supabase.insert_returning("reservations", row).await {
            Ok(rows) => rows,
            Err(DatabaseError::Conflict(message)) => {
                warn!("Unique constraint rejected reservation for slot {}: {}", slot_id, message);
                return Err(BookingError::DuplicateReservation {
                    subject_id: subject_id.to_string(),
                    slot_id,
                });
            }
            Err(e) => return Err(e.into()),
        };

        inserted.into_iter().next().ok_or_else(|| {
            BookingError::Storage("reservation insert returned no representation".to_string())
        })
    }

    async fn reservations_for_slot(&self, slot_id: Uuid) -> Result<Vec<Reservation>, BookingError> {
        let path = format!(
            "/rest/v1/reservations?slot_id=eq.{}&select=*&order=created_at.asc",
            slot_id
        );

        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }
}

/// Runs the seat increment and the reservation insert inside one Postgres
/// function call (`reserve_slot`). The function body is a single transaction,
/// so a dropped request or a crashed process can never split the two.
pub struct SupabaseReservationCommit {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseReservationCommit {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ReservationCommit for SupabaseReservationCommit {
    async fn commit(&self, subject_id: &str, slot_id: Uuid) -> Result<SeatCommit, BookingError> {
        debug!("Requesting atomic reservation of slot {}", slot_id);

        let outcome: SeatCommit = self.supabase
            .rpc("reserve_slot", json!({ "p_subject_id": subject_id, "p_slot_id": slot_id }))
            .await?;

        Ok(outcome)
    }
}
