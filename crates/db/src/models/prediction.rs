//! Prediction log and image entity models and DTOs.
//!
//! Covers two related tables:
//! - `prediction_logs` -- one row per detection submission
//! - `prediction_images` -- the binary attachments of a log

use leukoscan_core::detection::Detection;
use leukoscan_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `prediction_logs` table.
///
/// `image_count` is the number of files the client submitted, captured once
/// at creation. It is not reconciled against the child rows that actually
/// survived ingest; readers wanting stored-image counts must count
/// `prediction_images`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PredictionLog {
    pub id: DbId,
    pub user_id: DbId,
    pub image_count: i32,
    pub detections: Json<Vec<Detection>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new prediction log.
#[derive(Debug, Clone)]
pub struct CreatePredictionLog {
    pub user_id: DbId,
    pub image_count: i32,
    pub detections: Vec<Detection>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// DTO for the owner-editable fields of a prediction log.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePredictionLog {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A full row from the `prediction_images` table, blobs included.
///
/// Exactly one storage shape is populated per payload: inline bytes when the
/// deployment uses the `inline` backend, an object key when it uses `s3`.
/// A row where original and annotated are both absent (no bytes, no key) is
/// "no data" to readers.
#[derive(Debug, Clone, FromRow)]
pub struct PredictionImage {
    pub id: DbId,
    pub prediction_log_id: DbId,
    pub original_image: Option<Vec<u8>>,
    pub annotated_image: Option<Vec<u8>>,
    pub original_key: Option<String>,
    pub annotated_key: Option<String>,
    pub mime_type: String,
    pub filename: String,
    pub created_at: Timestamp,
}

/// Blob-free projection of a prediction image, for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PredictionImageMeta {
    pub id: DbId,
    pub prediction_log_id: DbId,
    pub mime_type: String,
    pub filename: String,
    pub has_original: bool,
    pub has_annotated: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a new prediction image.
#[derive(Debug, Clone)]
pub struct CreatePredictionImage {
    pub prediction_log_id: DbId,
    pub original_image: Option<Vec<u8>>,
    pub annotated_image: Option<Vec<u8>>,
    pub original_key: Option<String>,
    pub annotated_key: Option<String>,
    pub mime_type: String,
    pub filename: String,
}
