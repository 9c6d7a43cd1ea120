use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::interval::TimeInterval;

/// An advisor-declared window of potential bookability on one date.
/// Windows for the same advisor and date are always pairwise disjoint.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub advisor_id: Uuid,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub is_open: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl AvailabilityWindow {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            date: self.date,
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAvailabilityWindow {
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    /// A closed window still reserves its slice of the day; it only
    /// refuses bookings.
    #[serde(default = "default_open")]
    pub is_open: bool,
}

fn default_open() -> bool {
    true
}

impl NewAvailabilityWindow {
    pub fn open(date: Date, start_time: Time, end_time: Time) -> Self {
        Self {
            date,
            start_time,
            end_time,
            is_open: true,
        }
    }
}
