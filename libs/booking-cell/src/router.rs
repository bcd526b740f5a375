use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::services::booking::BookingService;

pub fn booking_routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}/slots", get(handlers::list_doctor_slots))
        .route("/slots/{slot_id}", get(handlers::get_slot))
        .route("/bookings/book", post(handlers::book_slot))
        .with_state(service)
}
