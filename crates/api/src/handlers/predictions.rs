//! Handlers for the `/predictions` resource.
//!
//! One ingest pipeline serves every submission shape, parameterized by the
//! `persist_mode` field: `metadata` stores no image payloads, `full` writes
//! them back-to-back, and `chunked` (the default) pauses briefly between
//! writes to bound load on the data layer.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use leukoscan_core::detection::{parse_detections, Detection, MAX_IMAGE_BYTES};
use leukoscan_core::error::CoreError;
use leukoscan_core::roles::ROLE_ADMIN;
use leukoscan_core::types::DbId;
use leukoscan_db::models::prediction::{
    CreatePredictionImage, CreatePredictionLog, PredictionImageMeta, PredictionLog,
    UpdatePredictionLog,
};
use leukoscan_db::repositories::{PredictionImageRepo, PredictionLogRepo};
use leukoscan_storage::object_key;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PageParams;
use crate::response::{DataResponse, Paginated};
use crate::state::AppState;

/// Pause between child writes in `chunked` mode.
const CHUNK_DELAY: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// How a submission's image payloads are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Parent row and detections only; no image rows.
    Metadata,
    /// All image rows written back-to-back.
    Full,
    /// Image rows written one at a time with a short pause in between.
    #[default]
    Chunked,
}

impl PersistMode {
    fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "metadata" => Ok(Self::Metadata),
            "full" => Ok(Self::Full),
            "chunked" => Ok(Self::Chunked),
            other => Err(AppError::BadRequest(format!(
                "Unknown persist_mode '{other}' (expected 'metadata', 'full', or 'chunked')"
            ))),
        }
    }
}

/// Response body for `POST /predictions`.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    #[serde(rename = "predictionId")]
    pub prediction_id: DbId,
    #[serde(rename = "processedImages")]
    pub processed_images: u32,
    #[serde(rename = "totalImages")]
    pub total_images: u32,
}

/// Detail response: the log plus blob-free image metadata.
#[derive(Debug, Serialize)]
pub struct PredictionDetail {
    #[serde(flatten)]
    pub log: PredictionLog,
    pub images: Vec<PredictionImageMeta>,
}

/// One uploaded file, held only for the duration of the request.
struct IncomingFile {
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Everything parsed out of the multipart body.
struct IngestForm {
    /// Slot per submitted file; `None` marks a file skipped at read time
    /// (oversized or empty). Indices line up with `annotated_<index>` keys.
    files: Vec<Option<IncomingFile>>,
    annotated: HashMap<usize, IncomingFile>,
    detections: Vec<Detection>,
    mode: PersistMode,
    title: Option<String>,
    description: Option<String>,
}

// ---------------------------------------------------------------------------
// Multipart parsing
// ---------------------------------------------------------------------------

async fn read_form(mut multipart: Multipart) -> AppResult<IngestForm> {
    let mut files: Vec<Option<IncomingFile>> = Vec::new();
    let mut annotated: HashMap<usize, IncomingFile> = HashMap::new();
    let mut detections_raw: Option<String> = None;
    let mut mode = PersistMode::default();
    let mut title = None;
    let mut description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" | "files[]" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                // Oversized or empty files keep their slot (so annotated
                // indices stay aligned) but are skipped, not rejected.
                if bytes.len() > MAX_IMAGE_BYTES {
                    tracing::warn!(
                        filename = %filename,
                        size = bytes.len(),
                        "Skipping file over the size ceiling"
                    );
                    files.push(None);
                } else if bytes.is_empty() {
                    tracing::warn!(filename = %filename, "Skipping empty file");
                    files.push(None);
                } else {
                    files.push(Some(IncomingFile {
                        filename,
                        mime_type,
                        bytes: bytes.to_vec(),
                    }));
                }
            }
            "detections" => {
                detections_raw = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "persist_mode" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                mode = PersistMode::parse(raw.trim())?;
            }
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "description" => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            other if other.starts_with("annotated_") => {
                let Ok(index) = other["annotated_".len()..].parse::<usize>() else {
                    return Err(AppError::BadRequest(format!(
                        "Malformed annotated field name '{other}'"
                    )));
                };
                let filename = field.file_name().unwrap_or("annotated").to_string();
                let mime_type = field.content_type().unwrap_or("image/png").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if bytes.len() > MAX_IMAGE_BYTES || bytes.is_empty() {
                    tracing::warn!(index, "Skipping unusable annotated overlay");
                    continue;
                }
                annotated.insert(
                    index,
                    IncomingFile {
                        filename,
                        mime_type,
                        bytes: bytes.to_vec(),
                    },
                );
            }
            _ => {
                // Unknown fields are ignored.
            }
        }
    }

    let detections_raw = detections_raw
        .ok_or_else(|| AppError::BadRequest("Missing 'detections' field".to_string()))?;
    let detections = parse_detections(&detections_raw).map_err(AppError::Core)?;

    Ok(IngestForm {
        files,
        annotated,
        detections,
        mode,
        title,
        description,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/predictions
///
/// Accept one detection submission: N images, the detections JSON, and
/// optional per-index annotated overlays.
///
/// The parent row and all surviving image rows are written inside one
/// transaction. Each image gets its own savepoint, so an individual write
/// failure is logged and skipped without poisoning the submission; a crash
/// before commit leaves no orphaned parent.
pub async fn ingest(
    State(state): State<AppState>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<IngestResponse>)> {
    let form = read_form(multipart).await?;
    let total_images = form.files.len() as u32;

    let pool = state.db.pool().await;
    let mut tx = pool.begin().await?;

    // `image_count` records the submitted total, not the stored total.
    let log = PredictionLogRepo::create(
        &mut *tx,
        &CreatePredictionLog {
            user_id: auth_user.user_id,
            image_count: total_images as i32,
            detections: form.detections,
            title: form.title,
            description: form.description,
        },
    )
    .await?;

    let mut processed_images: u32 = 0;

    if form.mode != PersistMode::Metadata {
        for (index, slot) in form.files.iter().enumerate() {
            let Some(file) = slot else {
                continue; // skipped at read time, slot preserved
            };

            match persist_image(&state, &mut tx, log.id, index, file, form.annotated.get(&index))
                .await
            {
                Ok(()) => processed_images += 1,
                Err(e) => {
                    tracing::warn!(
                        prediction_id = log.id,
                        index,
                        error = %e,
                        "Failed to persist image, continuing"
                    );
                }
            }

            if form.mode == PersistMode::Chunked && index + 1 < form.files.len() {
                tokio::time::sleep(CHUNK_DELAY).await;
            }
        }
    }

    tx.commit().await?;

    tracing::info!(
        prediction_id = log.id,
        user_id = auth_user.user_id,
        processed_images,
        total_images,
        "Ingest complete"
    );

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            prediction_id: log.id,
            processed_images,
            total_images,
        }),
    ))
}

/// Store one image's payloads and insert its row under a savepoint.
async fn persist_image(
    state: &AppState,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    prediction_log_id: DbId,
    index: usize,
    file: &IncomingFile,
    annotated: Option<&IncomingFile>,
) -> AppResult<()> {
    let original = state
        .store
        .put(
            &object_key("predictions", &file.filename),
            file.bytes.clone(),
            &file.mime_type,
        )
        .await?;
    let (original_image, original_key) = original.into_parts();

    let (annotated_image, annotated_key) = match annotated {
        Some(overlay) => {
            let payload = state
                .store
                .put(
                    &object_key("predictions/annotated", &overlay.filename),
                    overlay.bytes.clone(),
                    &overlay.mime_type,
                )
                .await?;
            payload.into_parts()
        }
        None => (None, None),
    };

    // Savepoint: a failed insert rolls back this image only.
    let mut savepoint = sqlx::Acquire::begin(&mut **tx).await?;
    let result = PredictionImageRepo::create(
        &mut *savepoint,
        &CreatePredictionImage {
            prediction_log_id,
            original_image,
            annotated_image,
            original_key,
            annotated_key,
            mime_type: file.mime_type.clone(),
            filename: file.filename.clone(),
        },
    )
    .await;

    match result {
        Ok(_) => {
            savepoint.commit().await?;
            Ok(())
        }
        Err(e) => {
            savepoint.rollback().await?;
            tracing::debug!(index, "Rolled back image savepoint");
            Err(e.into())
        }
    }
}

/// GET /api/v1/predictions
///
/// The authenticated user's logs, newest first, paginated. A transient
/// database outage degrades to an empty page rather than an error.
pub async fn list(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Paginated<PredictionLog>>> {
    let (page, limit, offset) = params.resolve();
    let user_id = auth_user.user_id;

    let result = state
        .db
        .run(|pool| async move {
            let items = PredictionLogRepo::list_page_by_user(&pool, user_id, limit, offset).await?;
            let total = PredictionLogRepo::count_by_user(&pool, user_id).await?;
            Ok((items, total))
        })
        .await?;

    let (items, total) = result.unwrap_or((Vec::new(), 0));
    Ok(Json(Paginated::new(items, page, limit, total)))
}

/// GET /api/v1/predictions/{id}
pub async fn get(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PredictionDetail>>> {
    let pool = state.db.pool().await;
    let log = fetch_owned_log(&pool, id, &auth_user).await?;
    let images = PredictionImageRepo::list_meta_by_log(&pool, id).await?;

    Ok(Json(DataResponse {
        data: PredictionDetail { log, images },
    }))
}

/// PATCH /api/v1/predictions/{id}
///
/// Title/description are mutable by the owner only.
pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePredictionLog>,
) -> AppResult<Json<DataResponse<PredictionLog>>> {
    let pool = state.db.pool().await;
    let log = fetch_owned_log(&pool, id, &auth_user).await?;
    if log.user_id != auth_user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner may edit a prediction".into(),
        )));
    }

    let updated = PredictionLogRepo::update(&pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PredictionLog",
            id,
        }))?;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/predictions/{id}
///
/// Deletes the log; its images cascade in the schema. Externally stored
/// payloads are removed from the bucket afterwards.
pub async fn delete(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let pool = state.db.pool().await;
    fetch_owned_log(&pool, id, &auth_user).await?;

    // Collect object keys before the rows cascade away.
    let keys = PredictionImageRepo::list_keys_by_log(&pool, id).await?;

    PredictionLogRepo::delete(&pool, id).await?;

    // Best-effort bucket cleanup; inline payloads died with their rows.
    for (original_key, annotated_key) in keys {
        if let Err(e) = state.store.delete(original_key.as_deref()).await {
            tracing::warn!(prediction_id = id, error = %e, "Failed to delete stored original");
        }
        if let Err(e) = state.store.delete(annotated_key.as_deref()).await {
            tracing::warn!(prediction_id = id, error = %e, "Failed to delete stored overlay");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Load a log and enforce owner-or-admin visibility.
async fn fetch_owned_log(
    pool: &sqlx::PgPool,
    id: DbId,
    auth_user: &AuthUser,
) -> AppResult<PredictionLog> {
    let log = PredictionLogRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PredictionLog",
            id,
        }))?;

    if log.user_id != auth_user.user_id && auth_user.role != ROLE_ADMIN {
        // Hide existence from non-owners.
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PredictionLog",
            id,
        }));
    }
    Ok(log)
}
