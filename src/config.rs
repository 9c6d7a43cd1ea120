use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub booking: BookingPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

/// Booking rules the scheduler enforces before touching the stores.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingPolicy {
    /// Appointment lengths a student may request, in minutes.
    pub allowed_durations: Vec<i64>,
    /// Additional attempts after a retryable storage failure.
    pub storage_retries: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            allowed_durations: vec![30, 45, 60],
            storage_retries: 2,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(
                val.parse()
                    .context("Failed to parse DATABASE_MAX_CONNECTIONS")?,
            ),
            Err(_) => None,
        };

        let allowed_durations = match env::var("BOOKING_ALLOWED_DURATIONS") {
            Ok(val) => val
                .split(',')
                .map(|d| {
                    d.trim()
                        .parse::<i64>()
                        .context("Failed to parse BOOKING_ALLOWED_DURATIONS")
                })
                .collect::<Result<Vec<_>>>()?,
            Err(_) => BookingPolicy::default().allowed_durations,
        };

        let storage_retries = match env::var("BOOKING_STORAGE_RETRIES") {
            Ok(val) => val
                .parse()
                .context("Failed to parse BOOKING_STORAGE_RETRIES")?,
            Err(_) => BookingPolicy::default().storage_retries,
        };

        Ok(Config {
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
            },
            booking: BookingPolicy {
                allowed_durations,
                storage_retries,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: Some(1),
            },
            booking: BookingPolicy::default(),
        }
    }
}
