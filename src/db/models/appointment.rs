use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;
use validator::Validate;

use crate::error::SchedulingError;
use crate::interval::TimeInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
    Completed,
}

/// The actions that move an appointment through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Confirm,
    Decline,
    Cancel,
    Complete,
}

impl AppointmentStatus {
    /// No transitions leave a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Declined
                | AppointmentStatus::Cancelled
                | AppointmentStatus::Completed
        )
    }

    /// A declined or cancelled appointment releases its slot; completed
    /// appointments keep blocking the time they occupied.
    pub fn blocks_slot(&self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Declined | AppointmentStatus::Cancelled
        )
    }

    /// Total transition function over `(status, action)`. A repeated or
    /// out-of-order action yields `InvalidTransition`, never a silent no-op.
    pub fn apply(self, action: StatusAction) -> Result<AppointmentStatus, SchedulingError> {
        use AppointmentStatus::*;
        use StatusAction::*;
        match (self, action) {
            (Pending, Confirm) => Ok(Confirmed),
            (Pending, Decline) => Ok(Declined),
            (Pending, Cancel) | (Confirmed, Cancel) => Ok(Cancelled),
            (Confirmed, Complete) => Ok(Completed),
            (from, action) => Err(SchedulingError::InvalidTransition { from, action }),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Declined => "declined",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusAction::Confirm => "confirm",
            StatusAction::Decline => "decline",
            StatusAction::Cancel => "cancel",
            StatusAction::Complete => "complete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub advisor_id: Uuid,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub duration_minutes: i64,
    pub purpose: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Appointment {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            date: self.date,
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Payload for a student booking request, as handed to the scheduler.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingRequest {
    pub student_id: Uuid,
    pub advisor_id: Uuid,
    pub date: Date,
    pub start_time: Time,
    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: i64,
    #[validate(length(min = 1, message = "Purpose must not be empty"))]
    pub purpose: String,
    pub notes: Option<String>,
}

impl BookingRequest {
    pub fn interval(&self) -> Result<TimeInterval, SchedulingError> {
        TimeInterval::from_start_and_duration(self.date, self.start_time, self.duration_minutes)
    }
}

/// Filter for appointment listings; any combination of fields may be set.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AppointmentFilter {
    pub advisor_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
}

/// Per-status appointment counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentStatistics {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub declined: i64,
    pub cancelled: i64,
    pub completed: i64,
}
