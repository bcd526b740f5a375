use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use doctor_cell::{Doctor, DoctorDirectory, SupabaseDoctorDirectory};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::BookingError;
use crate::models::{BookingOutcome, Slot};
use crate::services::engine::ReservationEngine;
use crate::services::supabase::{SupabaseBookingLedger, SupabaseReservationCommit, SupabaseSlotStore};

/// External surface of the booking core: the reservation write plus the
/// doctor and slot read passthroughs.
pub struct BookingService {
    engine: ReservationEngine,
    doctors: Arc<dyn DoctorDirectory>,
}

impl BookingService {
    pub fn new(engine: ReservationEngine, doctors: Arc<dyn DoctorDirectory>) -> Self {
        Self { engine, doctors }
    }

    /// Wires every store to one shared PostgREST client. Reservations are
    /// committed by the `reserve_slot` database function.
    pub fn supabase(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let engine = ReservationEngine::with_commit(
            Arc::new(SupabaseSlotStore::new(Arc::clone(&supabase))),
            Arc::new(SupabaseBookingLedger::new(Arc::clone(&supabase))),
            Arc::new(SupabaseReservationCommit::new(Arc::clone(&supabase))),
        );

        Self::new(engine, Arc::new(SupabaseDoctorDirectory::new(supabase)))
    }

    pub async fn book(&self, subject_id: &str, slot_id: Uuid) -> Result<BookingOutcome, BookingError> {
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Err(BookingError::InvalidSubject("subject id must not be empty".to_string()));
        }

        let result = self.engine.reserve(subject_id, slot_id).await?;
        let outcome = BookingOutcome::from(&result);
        info!("Booking for {} on slot {} finished: {:?}", subject_id, slot_id, outcome);

        Ok(outcome)
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, BookingError> {
        debug!("Listing doctors");
        Ok(self.doctors.list_doctors().await?)
    }

    pub async fn list_slots(&self, doctor_id: Uuid) -> Result<Vec<Slot>, BookingError> {
        debug!("Listing slots for doctor {}", doctor_id);
        self.engine.slots().list_slots(doctor_id).await
    }

    pub async fn get_slot(&self, slot_id: Uuid) -> Result<Option<Slot>, BookingError> {
        self.engine.slots().get_slot(slot_id).await
    }
}
