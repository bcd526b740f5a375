use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where slots, reservations and doctors are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" | "in-memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_backend: StorageBackend,
    pub port: u16,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            storage_backend: StorageBackend::Memory,
            port: 3000,
            seed_demo_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|raw| {
                    raw.parse()
                        .map_err(|e| warn!("{}, falling back to {}", e, defaults.storage_backend))
                        .ok()
                })
                .unwrap_or(defaults.storage_backend),
            port: env::var("PORT")
                .ok()
                .and_then(|raw| {
                    raw.parse()
                        .map_err(|_| warn!("PORT '{}' is not a valid port, using {}", raw, defaults.port))
                        .ok()
                })
                .unwrap_or(defaults.port),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|raw| parse_flag(&raw))
                .unwrap_or(defaults.seed_demo_data),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_configured() {
            warn!("Supabase backend selected but SUPABASE_URL / SUPABASE_ANON_PUBLIC_KEY are missing");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
