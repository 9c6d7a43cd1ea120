use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;
use time::Date;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::BookingPolicy;
use crate::db::models::{
    Appointment, AppointmentFilter, AppointmentStatistics, AvailabilityWindow, BookingRequest,
    NewAvailabilityWindow, Notification, Role, StatusAction,
};
use crate::db::repositories::{
    AppointmentRepository, AvailabilityRepository, DirectoryRepository, NotificationRepository,
};
use crate::error::{SchedulingError, SchedulingResult};
use crate::events::{DomainEvent, InAppNotifier, NotificationSink};

/// Composition root for the booking core. The scheduler is the only
/// component that sees both stores; repositories never call each other.
///
/// Identity is always an explicit parameter. The scheduler compares the
/// ids and roles it is handed and never reads ambient session state.
pub struct Scheduler {
    pool: SqlitePool,
    policy: BookingPolicy,
    sink: Arc<dyn NotificationSink>,
    // Per-advisor write serialization: the availability check, conflict
    // check, and insert of book() must be atomic relative to any other
    // mutation of the same advisor's calendar.
    advisor_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl Scheduler {
    pub fn new(pool: SqlitePool, policy: BookingPolicy, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            pool,
            policy,
            sink,
            advisor_locks: DashMap::new(),
        }
    }

    /// Scheduler wired to the in-app notification store.
    pub fn with_in_app_notifications(pool: SqlitePool, policy: BookingPolicy) -> Self {
        let sink = Arc::new(InAppNotifier::new(pool.clone()));
        Self::new(pool, policy, sink)
    }

    fn advisor_lock(&self, advisor_id: Uuid) -> Arc<Mutex<()>> {
        self.advisor_locks
            .entry(advisor_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // ---- directory -------------------------------------------------------

    pub async fn register_advisor(&self, name: &str) -> SchedulingResult<Uuid> {
        DirectoryRepository::register_advisor(&self.pool, name).await
    }

    pub async fn register_student(&self, name: &str) -> SchedulingResult<Uuid> {
        DirectoryRepository::register_student(&self.pool, name).await
    }

    // ---- availability ----------------------------------------------------

    pub async fn declare_availability(
        &self,
        advisor_id: Uuid,
        window: NewAvailabilityWindow,
    ) -> SchedulingResult<Uuid> {
        if !DirectoryRepository::advisor_exists(&self.pool, advisor_id).await? {
            return Err(SchedulingError::NotFound(format!("advisor {advisor_id}")));
        }

        let lock = self.advisor_lock(advisor_id);
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await?;
        let id = AvailabilityRepository::declare(&mut tx, advisor_id, &window).await?;
        tx.commit().await?;

        debug!(%advisor_id, window_id = %id, date = %window.date, "availability window declared");
        Ok(id)
    }

    pub async fn remove_availability(
        &self,
        window_id: Uuid,
        requesting_advisor_id: Uuid,
    ) -> SchedulingResult<()> {
        // Serialized against book() so a window cannot vanish mid-booking.
        let lock = self.advisor_lock(requesting_advisor_id);
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await?;
        AvailabilityRepository::remove(&mut tx, window_id, requesting_advisor_id).await?;
        tx.commit().await?;

        debug!(advisor_id = %requesting_advisor_id, %window_id, "availability window removed");
        Ok(())
    }

    pub async fn list_availability(
        &self,
        advisor_id: Uuid,
        date: Option<Date>,
    ) -> SchedulingResult<Vec<AvailabilityWindow>> {
        AvailabilityRepository::list(&self.pool, advisor_id, date).await
    }

    // ---- booking ---------------------------------------------------------

    /// Books an appointment: validates the request, then checks window
    /// coverage and appointment conflicts and inserts the pending record,
    /// all under the advisor's lock inside one transaction. Only storage
    /// failures are retried.
    pub async fn book_appointment(&self, request: BookingRequest) -> SchedulingResult<Uuid> {
        request
            .validate()
            .map_err(|e| SchedulingError::Validation(e.to_string()))?;
        if !self.policy.allowed_durations.contains(&request.duration_minutes) {
            return Err(SchedulingError::Validation(format!(
                "duration {} is not one of the allowed lengths {:?}",
                request.duration_minutes, self.policy.allowed_durations
            )));
        }
        let interval = request.interval()?;

        if !DirectoryRepository::student_exists(&self.pool, request.student_id).await? {
            return Err(SchedulingError::NotFound(format!(
                "student {}",
                request.student_id
            )));
        }
        if !DirectoryRepository::advisor_exists(&self.pool, request.advisor_id).await? {
            return Err(SchedulingError::NotFound(format!(
                "advisor {}",
                request.advisor_id
            )));
        }

        let mut attempts_left = self.policy.storage_retries;
        let id = loop {
            match self.try_book(&request, &interval).await {
                Ok(id) => break id,
                Err(err) if err.is_retryable() && attempts_left > 0 => {
                    attempts_left -= 1;
                    warn!(error = %err, attempts_left, "retrying booking after storage failure");
                }
                Err(err) => return Err(err),
            }
        };

        info!(
            appointment_id = %id,
            student_id = %request.student_id,
            advisor_id = %request.advisor_id,
            date = %interval.date,
            "appointment booked"
        );
        self.emit(DomainEvent::Requested {
            appointment_id: id,
            student_id: request.student_id,
            advisor_id: request.advisor_id,
        })
        .await;
        Ok(id)
    }

    async fn try_book(
        &self,
        request: &BookingRequest,
        interval: &crate::interval::TimeInterval,
    ) -> SchedulingResult<Uuid> {
        let lock = self.advisor_lock(request.advisor_id);
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await?;
        if !AvailabilityRepository::is_bookable(&mut tx, request.advisor_id, interval).await? {
            return Err(SchedulingError::NotBookable);
        }
        if AppointmentRepository::has_conflict(&mut tx, request.advisor_id, interval).await? {
            return Err(SchedulingError::Conflict(format!(
                "slot {}-{} on {} overlaps an existing appointment",
                interval.start, interval.end, interval.date
            )));
        }
        let id = AppointmentRepository::insert(&mut tx, request, interval).await?;
        tx.commit().await?;
        Ok(id)
    }

    // ---- lifecycle -------------------------------------------------------

    pub async fn confirm_appointment(
        &self,
        id: Uuid,
        requesting_advisor_id: Uuid,
    ) -> SchedulingResult<()> {
        let appointment = AppointmentRepository::find(&self.pool, id).await?;
        if appointment.advisor_id != requesting_advisor_id {
            return Err(SchedulingError::NotOwner);
        }
        let updated =
            AppointmentRepository::transition(&self.pool, id, StatusAction::Confirm).await?;

        info!(appointment_id = %id, "appointment confirmed");
        self.emit(DomainEvent::Confirmed {
            appointment_id: id,
            student_id: updated.student_id,
            advisor_id: updated.advisor_id,
        })
        .await;
        Ok(())
    }

    pub async fn decline_appointment(
        &self,
        id: Uuid,
        requesting_advisor_id: Uuid,
        reason: Option<String>,
    ) -> SchedulingResult<()> {
        let appointment = AppointmentRepository::find(&self.pool, id).await?;
        if appointment.advisor_id != requesting_advisor_id {
            return Err(SchedulingError::NotOwner);
        }
        let updated =
            AppointmentRepository::transition(&self.pool, id, StatusAction::Decline).await?;

        info!(appointment_id = %id, "appointment declined");
        self.emit(DomainEvent::Declined {
            appointment_id: id,
            student_id: updated.student_id,
            advisor_id: updated.advisor_id,
            reason,
        })
        .await;
        Ok(())
    }

    /// Cancellation is open to the appointment's own student or its own
    /// advisor; everyone else, admins included, gets `NotOwner`.
    pub async fn cancel_appointment(
        &self,
        id: Uuid,
        requesting_user_id: Uuid,
        requesting_role: Role,
    ) -> SchedulingResult<()> {
        let appointment = AppointmentRepository::find(&self.pool, id).await?;
        let owns = match requesting_role {
            Role::Student => appointment.student_id == requesting_user_id,
            Role::Advisor => appointment.advisor_id == requesting_user_id,
            Role::Admin => false,
        };
        if !owns {
            return Err(SchedulingError::NotOwner);
        }
        let updated =
            AppointmentRepository::transition(&self.pool, id, StatusAction::Cancel).await?;

        info!(appointment_id = %id, by = ?requesting_role, "appointment cancelled");
        self.emit(DomainEvent::Cancelled {
            appointment_id: id,
            student_id: updated.student_id,
            advisor_id: updated.advisor_id,
            by: requesting_role,
        })
        .await;
        Ok(())
    }

    /// Administrative transition; existence is the only precondition.
    pub async fn complete_appointment(&self, id: Uuid) -> SchedulingResult<()> {
        let updated =
            AppointmentRepository::transition(&self.pool, id, StatusAction::Complete).await?;

        info!(appointment_id = %id, "appointment completed");
        self.emit(DomainEvent::Completed {
            appointment_id: id,
            student_id: updated.student_id,
            advisor_id: updated.advisor_id,
        })
        .await;
        Ok(())
    }

    // ---- queries ---------------------------------------------------------

    pub async fn get_appointment(&self, id: Uuid) -> SchedulingResult<Appointment> {
        AppointmentRepository::find(&self.pool, id).await
    }

    pub async fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> SchedulingResult<Vec<Appointment>> {
        AppointmentRepository::list(&self.pool, &filter).await
    }

    pub async fn appointment_statistics(
        &self,
        advisor_id: Option<Uuid>,
        student_id: Option<Uuid>,
    ) -> SchedulingResult<AppointmentStatistics> {
        AppointmentRepository::statistics(&self.pool, advisor_id, student_id).await
    }

    // ---- notifications ---------------------------------------------------

    pub async fn notifications_for(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> SchedulingResult<Vec<Notification>> {
        NotificationRepository::list_for_user(&self.pool, user_id, unread_only).await
    }

    pub async fn mark_notification_read(
        &self,
        id: Uuid,
        requesting_user_id: Uuid,
    ) -> SchedulingResult<()> {
        NotificationRepository::mark_read(&self.pool, id, requesting_user_id).await
    }

    pub async fn mark_all_notifications_read(&self, user_id: Uuid) -> SchedulingResult<u64> {
        NotificationRepository::mark_all_read(&self.pool, user_id).await
    }

    pub async fn unread_notification_count(&self, user_id: Uuid) -> SchedulingResult<i64> {
        NotificationRepository::unread_count(&self.pool, user_id).await
    }

    /// Writes an upcoming-appointment reminder for one of its parties.
    /// When to remind is the caller's business; the core has no timers.
    pub async fn remind_appointment(
        &self,
        id: Uuid,
        user_id: Uuid,
        hours_until: i64,
    ) -> SchedulingResult<()> {
        let appointment = AppointmentRepository::find(&self.pool, id).await?;
        if appointment.student_id != user_id && appointment.advisor_id != user_id {
            return Err(SchedulingError::NotOwner);
        }
        self.emit(DomainEvent::Reminder {
            appointment_id: id,
            user_id,
            hours_until,
        })
        .await;
        Ok(())
    }

    // ---- retirement ------------------------------------------------------

    /// Removes an advisor from the directory, replacing the old cascade
    /// delete: every pending or confirmed appointment is explicitly
    /// cancelled (with events), their windows are dropped, and only then
    /// is the advisor record removed. Returns the number of appointments
    /// cancelled.
    pub async fn retire_advisor(&self, advisor_id: Uuid) -> SchedulingResult<usize> {
        if !DirectoryRepository::advisor_exists(&self.pool, advisor_id).await? {
            return Err(SchedulingError::NotFound(format!("advisor {advisor_id}")));
        }

        let lock = self.advisor_lock(advisor_id);
        let guard = lock.lock().await;

        let victims = {
            let mut conn = self.pool.acquire().await?;
            AppointmentRepository::non_terminal_for_advisor(&mut conn, advisor_id).await?
        };

        let mut cancelled = Vec::with_capacity(victims.len());
        for appointment in victims {
            match AppointmentRepository::transition(
                &self.pool,
                appointment.id,
                StatusAction::Cancel,
            )
            .await
            {
                Ok(updated) => cancelled.push(updated),
                // The student cancelled it first; nothing left to do.
                Err(SchedulingError::InvalidTransition { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        let mut tx = self.pool.begin().await?;
        AvailabilityRepository::remove_all_for_advisor(&mut tx, advisor_id).await?;
        DirectoryRepository::remove_advisor(&mut tx, advisor_id).await?;
        tx.commit().await?;

        drop(guard);
        // The advisor is gone; their lock entry has nothing left to guard.
        self.advisor_locks.remove(&advisor_id);

        info!(%advisor_id, cancelled = cancelled.len(), "advisor retired");
        for appointment in &cancelled {
            self.emit(DomainEvent::Cancelled {
                appointment_id: appointment.id,
                student_id: appointment.student_id,
                advisor_id: appointment.advisor_id,
                by: Role::Advisor,
            })
            .await;
        }
        Ok(cancelled.len())
    }

    /// Fire-and-forget dispatch. Runs after commit and outside the advisor
    /// lock; a sink failure is logged and swallowed.
    async fn emit(&self, event: DomainEvent) {
        if let Err(err) = self.sink.notify(&event).await {
            warn!(error = %err, ?event, "notification sink failed");
        }
    }
}
