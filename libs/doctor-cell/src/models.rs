use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
}

impl Doctor {
    pub fn new(name: impl Into<String>, specialization: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            specialization: specialization.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor storage error: {0}")]
    Storage(String),
}

impl From<shared_database::DatabaseError> for DoctorError {
    fn from(e: shared_database::DatabaseError) -> Self {
        DoctorError::Storage(e.to_string())
    }
}
