use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{Doctor, DoctorError};

/// Read-only source of doctors. Doctor management lives outside this service.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    /// All doctors ordered by name.
    async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError>;
}

#[derive(Default)]
pub struct InMemoryDoctorDirectory {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
}

impl InMemoryDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctors(doctors: impl IntoIterator<Item = Doctor>) -> Self {
        Self {
            doctors: RwLock::new(doctors.into_iter().map(|d| (d.id, d)).collect()),
        }
    }

    pub async fn insert(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        let mut doctors: Vec<Doctor> = self.doctors.read().await.values().cloned().collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(doctors)
    }
}

pub struct SupabaseDoctorDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDoctorDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Fetching doctor list");

        let doctors: Vec<Doctor> = self.supabase.request(
            Method::GET,
            "/rest/v1/doctors?select=*&order=name.asc",
            None,
        ).await?;

        Ok(doctors)
    }
}
