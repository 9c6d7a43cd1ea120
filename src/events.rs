use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{NewNotification, NotificationKind, Role};
use crate::db::repositories::NotificationRepository;

/// What just happened to an appointment. Emitted by the scheduler after a
/// successful commit; consumed by a notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    Requested {
        appointment_id: Uuid,
        student_id: Uuid,
        advisor_id: Uuid,
    },
    Confirmed {
        appointment_id: Uuid,
        student_id: Uuid,
        advisor_id: Uuid,
    },
    Declined {
        appointment_id: Uuid,
        student_id: Uuid,
        advisor_id: Uuid,
        reason: Option<String>,
    },
    Cancelled {
        appointment_id: Uuid,
        student_id: Uuid,
        advisor_id: Uuid,
        by: Role,
    },
    Completed {
        appointment_id: Uuid,
        student_id: Uuid,
        advisor_id: Uuid,
    },
    /// A nudge about an upcoming appointment, addressed to one party.
    Reminder {
        appointment_id: Uuid,
        user_id: Uuid,
        hours_until: i64,
    },
}

/// Boundary to the notification collaborator. Delivery is best-effort:
/// the scheduler logs a failed `notify` and moves on, because a missed
/// message must never roll back a committed booking.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

/// Persists notification rows for later in-app retrieval. There is no
/// push channel; users poll their own feed.
pub struct InAppNotifier {
    pool: SqlitePool,
}

impl InAppNotifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn store(
        &self,
        user_id: Uuid,
        appointment_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> anyhow::Result<()> {
        NotificationRepository::insert(
            &self.pool,
            &NewNotification {
                user_id,
                appointment_id: Some(appointment_id),
                kind,
                message: message.into(),
            },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for InAppNotifier {
    async fn notify(&self, event: &DomainEvent) -> anyhow::Result<()> {
        match event {
            DomainEvent::Requested {
                appointment_id,
                student_id,
                advisor_id,
            } => {
                self.store(
                    *student_id,
                    *appointment_id,
                    NotificationKind::AppointmentCreated,
                    "Your appointment request has been submitted and is pending advisor approval.",
                )
                .await?;
                self.store(
                    *advisor_id,
                    *appointment_id,
                    NotificationKind::AppointmentRequest,
                    "You have a new appointment request from a student.",
                )
                .await?;
            }
            DomainEvent::Confirmed {
                appointment_id,
                student_id,
                ..
            } => {
                self.store(
                    *student_id,
                    *appointment_id,
                    NotificationKind::AppointmentConfirmed,
                    "Your appointment has been confirmed by the advisor.",
                )
                .await?;
            }
            DomainEvent::Declined {
                appointment_id,
                student_id,
                reason,
                ..
            } => {
                let mut message =
                    "Your appointment request has been declined by the advisor.".to_string();
                if let Some(reason) = reason {
                    message.push_str(&format!(" Reason: {reason}"));
                }
                self.store(
                    *student_id,
                    *appointment_id,
                    NotificationKind::AppointmentDeclined,
                    message,
                )
                .await?;
            }
            DomainEvent::Cancelled {
                appointment_id,
                student_id,
                advisor_id,
                by,
            } => match by {
                Role::Student => {
                    self.store(
                        *advisor_id,
                        *appointment_id,
                        NotificationKind::AppointmentCancelled,
                        "A student has cancelled their appointment with you.",
                    )
                    .await?;
                    self.store(
                        *student_id,
                        *appointment_id,
                        NotificationKind::AppointmentCancelled,
                        "You have cancelled your appointment.",
                    )
                    .await?;
                }
                _ => {
                    self.store(
                        *student_id,
                        *appointment_id,
                        NotificationKind::AppointmentCancelled,
                        "Your appointment has been cancelled by the advisor.",
                    )
                    .await?;
                }
            },
            DomainEvent::Completed {
                appointment_id,
                student_id,
                ..
            } => {
                self.store(
                    *student_id,
                    *appointment_id,
                    NotificationKind::AppointmentCompleted,
                    "Your appointment has been marked as completed.",
                )
                .await?;
            }
            DomainEvent::Reminder {
                appointment_id,
                user_id,
                hours_until,
            } => {
                self.store(
                    *user_id,
                    *appointment_id,
                    NotificationKind::AppointmentReminder,
                    format!("Reminder: You have an appointment in {hours_until} hours."),
                )
                .await?;
            }
        }
        Ok(())
    }
}

/// Sink that drops every event. Useful when embedding the scheduler
/// somewhere that handles notifications itself.
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, _event: &DomainEvent) -> anyhow::Result<()> {
        Ok(())
    }
}
