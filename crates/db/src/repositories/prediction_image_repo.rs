//! Repository for the `prediction_images` table.
//!
//! `create` is generic over the executor so the ingest pipeline can write
//! each image inside the submission's transaction (under a savepoint).

use leukoscan_core::types::DbId;
use sqlx::PgPool;

use crate::models::prediction::{CreatePredictionImage, PredictionImage, PredictionImageMeta};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, prediction_log_id, original_image, annotated_image, \
                        original_key, annotated_key, mime_type, filename, created_at";

/// Blob-free projection used by listings.
const META_COLUMNS: &str = "id, prediction_log_id, mime_type, filename, \
                             (original_image IS NOT NULL OR original_key IS NOT NULL) AS has_original, \
                             (annotated_image IS NOT NULL OR annotated_key IS NOT NULL) AS has_annotated, \
                             created_at";

/// Provides CRUD operations for prediction images.
pub struct PredictionImageRepo;

impl PredictionImageRepo {
    /// Insert a new prediction image, returning its ID.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreatePredictionImage,
    ) -> Result<DbId, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "INSERT INTO prediction_images
                (prediction_log_id, original_image, annotated_image,
                 original_key, annotated_key, mime_type, filename)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(input.prediction_log_id)
        .bind(&input.original_image)
        .bind(&input.annotated_image)
        .bind(&input.original_key)
        .bind(&input.annotated_key)
        .bind(&input.mime_type)
        .bind(&input.filename)
        .fetch_one(executor)
        .await
    }

    /// Find a prediction image by ID, blobs included.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PredictionImage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prediction_images WHERE id = $1");
        sqlx::query_as::<_, PredictionImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Blob-free listing of a log's images, in insertion order.
    pub async fn list_meta_by_log(
        pool: &PgPool,
        prediction_log_id: DbId,
    ) -> Result<Vec<PredictionImageMeta>, sqlx::Error> {
        let query = format!(
            "SELECT {META_COLUMNS} FROM prediction_images
             WHERE prediction_log_id = $1
             ORDER BY id"
        );
        sqlx::query_as::<_, PredictionImageMeta>(&query)
            .bind(prediction_log_id)
            .fetch_all(pool)
            .await
    }

    /// Number of images stored for a log.
    pub async fn count_by_log(pool: &PgPool, prediction_log_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM prediction_images WHERE prediction_log_id = $1")
            .bind(prediction_log_id)
            .fetch_one(pool)
            .await
    }

    /// Total number of prediction images.
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM prediction_images")
            .fetch_one(pool)
            .await
    }

    /// Object-store keys for a log's images (for bucket cleanup on delete).
    pub async fn list_keys_by_log(
        pool: &PgPool,
        prediction_log_id: DbId,
    ) -> Result<Vec<(Option<String>, Option<String>)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT original_key, annotated_key FROM prediction_images
             WHERE prediction_log_id = $1",
        )
        .bind(prediction_log_id)
        .fetch_all(pool)
        .await
    }

    /// The user who owns the log an image belongs to, if the image exists.
    pub async fn owner_of(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT l.user_id FROM prediction_images i
             JOIN prediction_logs l ON l.id = i.prediction_log_id
             WHERE i.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
