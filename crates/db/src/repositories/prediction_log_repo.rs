//! Repository for the `prediction_logs` table.
//!
//! `create` is generic over the executor so the ingest pipeline can run it
//! inside the same transaction as the image inserts.

use leukoscan_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::prediction::{CreatePredictionLog, PredictionLog, UpdatePredictionLog};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, image_count, detections, title, description, created_at";

/// Provides CRUD operations for prediction logs.
pub struct PredictionLogRepo;

impl PredictionLogRepo {
    /// Insert a new prediction log, returning the created row.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreatePredictionLog,
    ) -> Result<PredictionLog, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO prediction_logs (user_id, image_count, detections, title, description)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PredictionLog>(&query)
            .bind(input.user_id)
            .bind(input.image_count)
            .bind(Json(&input.detections))
            .bind(&input.title)
            .bind(&input.description)
            .fetch_one(executor)
            .await
    }

    /// Find a prediction log by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PredictionLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prediction_logs WHERE id = $1");
        sqlx::query_as::<_, PredictionLog>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of a user's logs, newest first.
    pub async fn list_page_by_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PredictionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prediction_logs
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, PredictionLog>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Number of logs owned by a user.
    pub async fn count_by_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM prediction_logs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Total number of prediction logs.
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM prediction_logs")
            .fetch_one(pool)
            .await
    }

    /// Number of logs created in the last `hours` hours.
    pub async fn count_recent(pool: &PgPool, hours: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM prediction_logs
             WHERE created_at > NOW() - ($1 || ' hours')::interval",
        )
        .bind(hours.to_string())
        .fetch_one(pool)
        .await
    }

    /// Update the owner-editable fields. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePredictionLog,
    ) -> Result<Option<PredictionLog>, sqlx::Error> {
        let query = format!(
            "UPDATE prediction_logs SET
                title = COALESCE($2, title),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PredictionLog>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a prediction log. Its images cascade in the schema.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prediction_logs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
