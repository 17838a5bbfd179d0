//! Postgres Student Store
//!
//! Documents live in a JSONB column; the unique lookup keys are mirrored into
//! indexed columns so Postgres enforces uniqueness. Every call is bounded by
//! a timeout and surfaces expiry as `StoreError::Unavailable`.

use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

use super::{StoreError, StudentFilter, StudentRecord, StudentStore, StudentUpdate};

#[derive(Debug, Clone)]
pub struct PgStudentStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStudentStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        bounded(self.timeout, operation, call).await
    }
}

/// Run a query under a deadline; expiry is a transient `Unavailable`
pub(crate) async fn bounded<T, F>(
    timeout: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Unavailable(format!(
            "{} timed out after {}ms",
            operation,
            timeout.as_millis()
        ))),
    }
}

/// Decode a `(document, version)` row
fn decode_row((document, version): (serde_json::Value, i64)) -> Result<StudentRecord, StoreError> {
    let mut record: StudentRecord = serde_json::from_value(document)?;
    record.version = version;
    Ok(record)
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn find_one(&self, filter: &StudentFilter) -> Result<Option<StudentRecord>, StoreError> {
        let row: Option<(serde_json::Value, i64)> = match filter.column() {
            Some((column, value)) => {
                let sql = format!(
                    "SELECT document, version FROM students WHERE {} = $1 ORDER BY created_at ASC LIMIT 1",
                    column
                );
                self.timed(
                    "find_one",
                    sqlx::query_as(&sql).bind(value).fetch_optional(&self.pool),
                )
                .await?
            }
            None => {
                self.timed(
                    "find_one",
                    sqlx::query_as(
                        "SELECT document, version FROM students ORDER BY created_at ASC LIMIT 1",
                    )
                    .fetch_optional(&self.pool),
                )
                .await?
            }
        };

        row.map(decode_row).transpose()
    }

    async fn insert_one(&self, record: &StudentRecord) -> Result<(), StoreError> {
        let document = serde_json::to_value(record)?;

        self.timed(
            "insert_one",
            sqlx::query(
                r#"
                INSERT INTO students (
                    id, application_number, mobile_number, national_id_number,
                    email, plan, version, document
                )
                VALUES ($1, $2, $3, $4, LOWER($5), $6, 1, $7)
                "#,
            )
            .bind(&record.id)
            .bind(&record.application_number)
            .bind(&record.mobile_number)
            .bind(&record.national_id_number)
            .bind(&record.email)
            .bind(&record.plan)
            .bind(&document)
            .execute(&self.pool),
        )
        .await?;

        tracing::debug!(student_id = %record.id, "Student document inserted");
        Ok(())
    }

    async fn update_one(
        &self,
        filter: &StudentFilter,
        update: &StudentUpdate,
    ) -> Result<u64, StoreError> {
        let record = &update.record;
        let document = serde_json::to_value(record)?;

        // Single statement: the document, the key columns and the version
        // move together or not at all
        let (column, value) = filter.column().unwrap_or(("id", record.id.as_str()));
        let sql = format!(
            r#"
            UPDATE students
            SET
                application_number = $1,
                mobile_number = $2,
                national_id_number = $3,
                email = LOWER($4),
                plan = $5,
                document = $6,
                version = version + 1,
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM students WHERE {} = $7 ORDER BY created_at ASC LIMIT 1
            )
            AND ($8::BIGINT IS NULL OR version = $8)
            "#,
            column
        );

        let result = self
            .timed(
                "update_one",
                sqlx::query(&sql)
                    .bind(&record.application_number)
                    .bind(&record.mobile_number)
                    .bind(&record.national_id_number)
                    .bind(&record.email)
                    .bind(&record.plan)
                    .bind(&document)
                    .bind(value)
                    .bind(update.expected_version)
                    .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, filter: &StudentFilter) -> Result<u64, StoreError> {
        let result = match filter.column() {
            Some((column, value)) => {
                let sql = format!(
                    "DELETE FROM students WHERE id = (SELECT id FROM students WHERE {} = $1 ORDER BY created_at ASC LIMIT 1)",
                    column
                );
                self.timed("delete_one", sqlx::query(&sql).bind(value).execute(&self.pool))
                    .await?
            }
            None => {
                self.timed(
                    "delete_one",
                    sqlx::query(
                        "DELETE FROM students WHERE id = (SELECT id FROM students ORDER BY created_at ASC LIMIT 1)",
                    )
                    .execute(&self.pool),
                )
                .await?
            }
        };

        Ok(result.rows_affected())
    }

    async fn find_many(
        &self,
        filter: &StudentFilter,
        limit: usize,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<(serde_json::Value, i64)> = match filter.column() {
            Some((column, value)) => {
                let sql = format!(
                    "SELECT document, version FROM students WHERE {} = $1 ORDER BY created_at ASC LIMIT $2",
                    column
                );
                self.timed(
                    "find_many",
                    sqlx::query_as(&sql).bind(value).bind(limit).fetch_all(&self.pool),
                )
                .await?
            }
            None => {
                self.timed(
                    "find_many",
                    sqlx::query_as(
                        "SELECT document, version FROM students ORDER BY created_at ASC LIMIT $1",
                    )
                    .bind(limit)
                    .fetch_all(&self.pool),
                )
                .await?
            }
        };

        rows.into_iter().map(decode_row).collect()
    }
}
