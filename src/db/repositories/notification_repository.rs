use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{NewNotification, Notification};
use crate::error::{SchedulingError, SchedulingResult};

pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn insert(
        pool: &SqlitePool,
        notification: &NewNotification,
    ) -> SchedulingResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, user_id, appointment_id, kind, message, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(id)
        .bind(notification.user_id)
        .bind(notification.appointment_id)
        .bind(notification.kind)
        .bind(&notification.message)
        .bind(OffsetDateTime::now_utc())
        .execute(pool)
        .await?;
        Ok(id)
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
        unread_only: bool,
    ) -> SchedulingResult<Vec<Notification>> {
        let query = if unread_only {
            r#"
            SELECT * FROM notifications
            WHERE user_id = ? AND is_read = 0
            ORDER BY created_at DESC
            "#
        } else {
            r#"
            SELECT * FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#
        };
        let notifications = sqlx::query_as::<_, Notification>(query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;
        Ok(notifications)
    }

    /// Marks one notification read. Users may only touch their own feed,
    /// so a mismatched owner is `NotOwner`, not a silent update.
    pub async fn mark_read(
        pool: &SqlitePool,
        id: Uuid,
        requesting_user_id: Uuid,
    ) -> SchedulingResult<()> {
        let notification = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| SchedulingError::NotFound(format!("notification {id}")))?;

        if notification.user_id != requesting_user_id {
            return Err(SchedulingError::NotOwner);
        }

        sqlx::query("UPDATE notifications SET is_read = 1, read_at = ? WHERE id = ?")
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn mark_all_read(pool: &SqlitePool, user_id: Uuid) -> SchedulingResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ? WHERE user_id = ? AND is_read = 0",
        )
        .bind(OffsetDateTime::now_utc())
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(pool: &SqlitePool, user_id: Uuid) -> SchedulingResult<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.0)
    }
}
