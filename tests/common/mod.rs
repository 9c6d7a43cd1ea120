use time::{Date, Time};
use uuid::Uuid;

use advising_core::db::models::BookingRequest;
use advising_core::{Config, Scheduler};

/// Fresh scheduler over an in-memory database with in-app notifications.
pub async fn scheduler() -> Scheduler {
    advising_core::telemetry::init();
    let config = Config::default();
    let pool = advising_core::db::init_pool(&config.database)
        .await
        .expect("in-memory pool");
    Scheduler::with_in_app_notifications(pool, config.booking)
}

pub fn booking(
    student_id: Uuid,
    advisor_id: Uuid,
    date: Date,
    start_time: Time,
    duration_minutes: i64,
) -> BookingRequest {
    BookingRequest {
        student_id,
        advisor_id,
        date,
        start_time,
        duration_minutes,
        purpose: "Course planning".to_string(),
        notes: None,
    }
}
