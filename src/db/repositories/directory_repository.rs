use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::SchedulingResult;

/// Minimal advisor/student registry. Profile management lives outside the
/// core; the scheduler only needs existence checks for booking parties.
pub struct DirectoryRepository;

impl DirectoryRepository {
    pub async fn register_advisor(pool: &SqlitePool, name: &str) -> SchedulingResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO advisors (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(OffsetDateTime::now_utc())
            .execute(pool)
            .await?;
        Ok(id)
    }

    pub async fn register_student(pool: &SqlitePool, name: &str) -> SchedulingResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO students (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(OffsetDateTime::now_utc())
            .execute(pool)
            .await?;
        Ok(id)
    }

    pub async fn advisor_exists(pool: &SqlitePool, id: Uuid) -> SchedulingResult<bool> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM advisors WHERE id = ?")
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(count.0 > 0)
    }

    pub async fn student_exists(pool: &SqlitePool, id: Uuid) -> SchedulingResult<bool> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM students WHERE id = ?")
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(count.0 > 0)
    }

    pub async fn remove_advisor(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> SchedulingResult<u64> {
        let result = sqlx::query("DELETE FROM advisors WHERE id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}
