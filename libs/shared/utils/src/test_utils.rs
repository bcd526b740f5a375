use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the Supabase client at a mock server (e.g. `MockServer::uri()`).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            storage_backend: StorageBackend::Supabase,
            port: 0,
            seed_demo_data: false,
        }
    }
}

/// A one-hour window starting `hours_from_now` hours in the future.
pub fn slot_window(hours_from_now: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc::now() + Duration::hours(hours_from_now);
    (start, start + Duration::hours(1))
}

/// Distinct subject ids `prefix-0 .. prefix-(count-1)`.
pub fn subjects(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}-{}", prefix, i)).collect()
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_response(id: Uuid, name: &str, specialization: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "specialization": specialization
        })
    }

    pub fn slot_response(id: Uuid, doctor_id: Uuid, total_seats: u32, booked_seats: u32) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "start_time": "2030-01-01T09:00:00Z",
            "end_time": "2030-01-01T10:00:00Z",
            "total_seats": total_seats,
            "booked_seats": booked_seats
        })
    }

    pub fn reservation_response(id: Uuid, subject_id: &str, slot_id: Uuid) -> serde_json::Value {
        json!({
            "id": id,
            "subject_id": subject_id,
            "slot_id": slot_id,
            "created_at": "2030-01-01T08:00:00Z",
            "status": "confirmed"
        })
    }

    pub fn increment_committed(booked_seats: u32) -> serde_json::Value {
        json!({ "status": "committed", "booked_seats": booked_seats })
    }

    pub fn increment_capacity_exceeded() -> serde_json::Value {
        json!({ "status": "capacity_exceeded" })
    }

    pub fn increment_not_found() -> serde_json::Value {
        json!({ "status": "not_found" })
    }

    pub fn reserve_committed(booked_seats: u32, reservation: serde_json::Value) -> serde_json::Value {
        json!({ "status": "committed", "booked_seats": booked_seats, "reservation": reservation })
    }

    pub fn reserve_duplicate() -> serde_json::Value {
        json!({ "status": "duplicate" })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
