use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{
    Appointment, AppointmentFilter, AppointmentStatistics, AppointmentStatus, BookingRequest,
    StatusAction,
};
use crate::error::{SchedulingError, SchedulingResult};
use crate::interval::TimeInterval;

pub struct AppointmentRepository;

impl AppointmentRepository {
    pub async fn insert(
        tx: &mut Transaction<'_, Sqlite>,
        request: &BookingRequest,
        interval: &TimeInterval,
    ) -> SchedulingResult<Uuid> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r#"
            INSERT INTO appointments
                (id, student_id, advisor_id, date, start_time, end_time,
                 duration_minutes, purpose, notes, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(request.student_id)
        .bind(request.advisor_id)
        .bind(interval.date)
        .bind(interval.start)
        .bind(interval.end)
        .bind(request.duration_minutes)
        .bind(&request.purpose)
        .bind(&request.notes)
        .bind(AppointmentStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(id)
    }

    pub async fn find(pool: &SqlitePool, id: Uuid) -> SchedulingResult<Appointment> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {id}")))
    }

    /// True iff any appointment for the advisor still blocking its slot
    /// overlaps the candidate interval. Cancelled and declined appointments
    /// release their time.
    pub async fn has_conflict(
        conn: &mut SqliteConnection,
        advisor_id: Uuid,
        interval: &TimeInterval,
    ) -> SchedulingResult<bool> {
        let same_day = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE advisor_id = ? AND date = ?",
        )
        .bind(advisor_id)
        .bind(interval.date)
        .fetch_all(conn)
        .await?;

        Ok(same_day
            .iter()
            .any(|a| a.status.blocks_slot() && a.interval().overlaps(interval)))
    }

    /// Applies a lifecycle action with a compare-and-swap update. Losing a
    /// race against a concurrent transition re-reads the row, so a doubled
    /// submission always surfaces as `InvalidTransition` instead of silently
    /// re-applying.
    pub async fn transition(
        pool: &SqlitePool,
        id: Uuid,
        action: StatusAction,
    ) -> SchedulingResult<Appointment> {
        loop {
            let current = Self::find(pool, id).await?;
            let next = current.status.apply(action)?;

            let result = sqlx::query(
                r#"
                UPDATE appointments
                SET status = ?, updated_at = ?
                WHERE id = ? AND status = ?
                "#,
            )
            .bind(next)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .bind(current.status)
            .execute(pool)
            .await?;

            if result.rows_affected() == 1 {
                return Self::find(pool, id).await;
            }
            // Someone else moved the row between read and update; re-read
            // and re-evaluate from the fresh status.
        }
    }

    pub async fn list(
        pool: &SqlitePool,
        filter: &AppointmentFilter,
    ) -> SchedulingResult<Vec<Appointment>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM appointments WHERE 1 = 1");
        if let Some(advisor_id) = filter.advisor_id {
            qb.push(" AND advisor_id = ").push_bind(advisor_id);
        }
        if let Some(student_id) = filter.student_id {
            qb.push(" AND student_id = ").push_bind(student_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        qb.push(" ORDER BY date DESC, start_time DESC");

        let appointments = qb
            .build_query_as::<Appointment>()
            .fetch_all(pool)
            .await?;
        Ok(appointments)
    }

    /// Pending and confirmed appointments for one advisor; what a retiring
    /// advisor still owes explicit cancellations for.
    pub async fn non_terminal_for_advisor(
        conn: &mut SqliteConnection,
        advisor_id: Uuid,
    ) -> SchedulingResult<Vec<Appointment>> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE advisor_id = ? AND status IN ('pending', 'confirmed')
            ORDER BY date, start_time
            "#,
        )
        .bind(advisor_id)
        .fetch_all(conn)
        .await?;
        Ok(appointments)
    }

    pub async fn statistics(
        pool: &SqlitePool,
        advisor_id: Option<Uuid>,
        student_id: Option<Uuid>,
    ) -> SchedulingResult<AppointmentStatistics> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT status, COUNT(*) FROM appointments WHERE 1 = 1",
        );
        if let Some(advisor_id) = advisor_id {
            qb.push(" AND advisor_id = ").push_bind(advisor_id);
        }
        if let Some(student_id) = student_id {
            qb.push(" AND student_id = ").push_bind(student_id);
        }
        qb.push(" GROUP BY status");

        let rows = qb
            .build_query_as::<(AppointmentStatus, i64)>()
            .fetch_all(pool)
            .await?;

        let mut stats = AppointmentStatistics::default();
        for (status, count) in rows {
            stats.total += count;
            match status {
                AppointmentStatus::Pending => stats.pending = count,
                AppointmentStatus::Confirmed => stats.confirmed = count,
                AppointmentStatus::Declined => stats.declined = count,
                AppointmentStatus::Cancelled => stats.cancelled = count,
                AppointmentStatus::Completed => stats.completed = count,
            }
        }
        Ok(stats)
    }
}
