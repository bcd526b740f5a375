pub mod slot_store;
pub mod ledger;
pub mod commit;
pub mod engine;
pub mod booking;
pub mod supabase;

pub use slot_store::{SlotStore, InMemorySlotStore};
pub use ledger::{BookingLedger, InMemoryBookingLedger};
pub use commit::{ReservationCommit, CompensatingCommit};
pub use engine::ReservationEngine;
pub use booking::BookingService;
pub use supabase::{SupabaseSlotStore, SupabaseBookingLedger, SupabaseReservationCommit};
