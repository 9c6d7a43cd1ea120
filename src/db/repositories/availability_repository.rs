use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::db::models::{AvailabilityWindow, NewAvailabilityWindow};
use crate::error::{SchedulingError, SchedulingResult};
use crate::interval::TimeInterval;

pub struct AvailabilityRepository;

impl AvailabilityRepository {
    /// Inserts a new window after checking it against every existing window
    /// for that advisor and date, open or closed. Advisors declare disjoint
    /// windows only; there is no merging.
    pub async fn declare(
        tx: &mut Transaction<'_, Sqlite>,
        advisor_id: Uuid,
        window: &NewAvailabilityWindow,
    ) -> SchedulingResult<Uuid> {
        let candidate =
            TimeInterval::new(window.date, window.start_time, window.end_time)?;

        let existing = Self::for_date(&mut **tx, advisor_id, window.date).await?;
        if let Some(clash) = existing
            .iter()
            .find(|w| w.interval().overlaps(&candidate))
        {
            return Err(SchedulingError::Conflict(format!(
                "window overlaps existing availability {}-{} on {}",
                clash.start_time, clash.end_time, clash.date
            )));
        }

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r#"
            INSERT INTO availability_windows
                (id, advisor_id, date, start_time, end_time, is_open, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(advisor_id)
        .bind(window.date)
        .bind(window.start_time)
        .bind(window.end_time)
        .bind(window.is_open)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(id)
    }

    /// Removes a window. The ownership check is the booking-layer access
    /// control: advisors may only delete their own windows.
    pub async fn remove(
        tx: &mut Transaction<'_, Sqlite>,
        window_id: Uuid,
        requesting_advisor_id: Uuid,
    ) -> SchedulingResult<()> {
        let window = sqlx::query_as::<_, AvailabilityWindow>(
            "SELECT * FROM availability_windows WHERE id = ?",
        )
        .bind(window_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            SchedulingError::NotFound(format!("availability window {window_id}"))
        })?;

        if window.advisor_id != requesting_advisor_id {
            return Err(SchedulingError::NotOwner);
        }

        sqlx::query("DELETE FROM availability_windows WHERE id = ?")
            .bind(window_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// True iff a single open window fully contains the candidate slot.
    /// A booking cannot span two adjacent windows.
    pub async fn is_bookable(
        conn: &mut SqliteConnection,
        advisor_id: Uuid,
        interval: &TimeInterval,
    ) -> SchedulingResult<bool> {
        let windows = Self::for_date(conn, advisor_id, interval.date).await?;
        Ok(windows
            .iter()
            .any(|w| w.is_open && w.interval().contains(interval)))
    }

    pub async fn for_date(
        conn: &mut SqliteConnection,
        advisor_id: Uuid,
        date: Date,
    ) -> SchedulingResult<Vec<AvailabilityWindow>> {
        let windows = sqlx::query_as::<_, AvailabilityWindow>(
            r#"
            SELECT * FROM availability_windows
            WHERE advisor_id = ? AND date = ?
            ORDER BY start_time
            "#,
        )
        .bind(advisor_id)
        .bind(date)
        .fetch_all(conn)
        .await?;
        Ok(windows)
    }

    pub async fn list(
        pool: &SqlitePool,
        advisor_id: Uuid,
        date: Option<Date>,
    ) -> SchedulingResult<Vec<AvailabilityWindow>> {
        let windows = match date {
            Some(date) => {
                sqlx::query_as::<_, AvailabilityWindow>(
                    r#"
                    SELECT * FROM availability_windows
                    WHERE advisor_id = ? AND date = ?
                    ORDER BY date, start_time
                    "#,
                )
                .bind(advisor_id)
                .bind(date)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AvailabilityWindow>(
                    r#"
                    SELECT * FROM availability_windows
                    WHERE advisor_id = ?
                    ORDER BY date, start_time
                    "#,
                )
                .bind(advisor_id)
                .fetch_all(pool)
                .await?
            }
        };
        Ok(windows)
    }

    /// Deletes every window an advisor owns. Used when retiring an advisor.
    pub async fn remove_all_for_advisor(
        tx: &mut Transaction<'_, Sqlite>,
        advisor_id: Uuid,
    ) -> SchedulingResult<u64> {
        let result = sqlx::query("DELETE FROM availability_windows WHERE advisor_id = ?")
            .bind(advisor_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}
