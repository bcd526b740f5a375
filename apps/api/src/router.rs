use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::{booking_routes, BookingService};

pub fn create_router(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/", get(|| async { "Slot booking API is running!" }))
        .nest("/api", booking_routes(service))
}
