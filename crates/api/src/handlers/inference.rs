//! Proxy handler for the external detection service.
//!
//! The browser never talks to the inference service directly; it submits one
//! image here and gets back the detections plus the annotated overlay
//! re-encoded as a data URL it can render immediately.

use axum::extract::{Multipart, State};
use axum::Json;
use base64::{engine::general_purpose, Engine as _};
use leukoscan_core::detection::{Detection, MAX_IMAGE_BYTES};
use leukoscan_core::error::CoreError;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Response body for `POST /inference/detect`.
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
    /// Annotated overlay as a `data:` URL, when the model produced one.
    #[serde(rename = "annotatedImage")]
    pub annotated_image: Option<String>,
}

/// POST /api/v1/inference/detect
///
/// Forward one image to the detection service. Service failures surface as
/// 502 with a typed body; they never crash the request.
pub async fn detect(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<DetectResponse>> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("image").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((filename, mime_type, bytes.to_vec()));
    }

    let (filename, mime_type, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Image exceeds the {MAX_IMAGE_BYTES} byte limit"
        ))));
    }
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Empty file".to_string()));
    }

    let result = state.inference.detect(bytes, &filename, &mime_type).await?;

    let annotated_image = match (result.annotated_image, result.annotated_mime) {
        (Some(bytes), Some(mime)) => Some(format!(
            "data:{mime};base64,{}",
            general_purpose::STANDARD.encode(bytes)
        )),
        _ => None,
    };

    Ok(Json(DetectResponse {
        detections: result.detections,
        annotated_image,
    }))
}
