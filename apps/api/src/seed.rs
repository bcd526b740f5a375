use std::sync::Arc;

use chrono::{Duration, DurationRound, Utc};
use tracing::info;

use booking_cell::{BookingError, BookingService, InMemoryBookingLedger, InMemorySlotStore, ReservationEngine, Slot};
use doctor_cell::{Doctor, InMemoryDoctorDirectory};

const DEMO_DOCTORS: &[(&str, &str)] = &[
    ("Dr. Amelia Hart", "Cardiology"),
    ("Dr. Kwame Mensah", "General Practice"),
    ("Dr. Sofia Lindqvist", "Dermatology"),
];

/// Hour offsets (from the next full hour) and seat counts of each demo slot.
const DEMO_SLOTS: &[(i64, u32)] = &[(24, 3), (26, 1), (48, 5)];

pub async fn in_memory_service(seed_demo_data: bool) -> Result<BookingService, BookingError> {
    let directory = InMemoryDoctorDirectory::new();
    let slots = InMemorySlotStore::new();

    if seed_demo_data {
        let next_hour = Utc::now()
            .duration_trunc(Duration::hours(1))
            .map_err(|e| BookingError::InvalidSlot(e.to_string()))?
            + Duration::hours(1);

        for (name, specialization) in DEMO_DOCTORS {
            let doctor = Doctor::new(*name, *specialization);
            for (offset, seats) in DEMO_SLOTS {
                let start = next_hour + Duration::hours(*offset);
                slots.insert(Slot::new(doctor.id, start, start + Duration::minutes(30), *seats)?).await?;
            }
            directory.insert(doctor).await;
        }

        info!("Seeded {} demo doctors with {} slots each", DEMO_DOCTORS.len(), DEMO_SLOTS.len());
    }

    let engine = ReservationEngine::new(Arc::new(slots), Arc::new(InMemoryBookingLedger::new()));
    Ok(BookingService::new(engine, Arc::new(directory)))
}
