//! Detection records produced by the white-blood-cell inference service.
//!
//! A submission carries one `Detection` per bounding box the model found,
//! tagged with the index of the uploaded image it belongs to. The ingest
//! endpoint receives these as a JSON array in a multipart text field.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum size of a single uploaded image, in bytes (5 MB).
///
/// Files above this ceiling are skipped during ingest, not rejected.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// One detected cell: class label, model confidence, and the index of the
/// uploaded image the box was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub confidence: f64,
    #[serde(rename = "imageIndex")]
    pub image_index: i32,
}

/// Parse and validate the `detections` multipart field.
///
/// Rejects the whole submission on malformed JSON, a confidence outside
/// `0..=1`, or a negative image index.
pub fn parse_detections(raw: &str) -> Result<Vec<Detection>, CoreError> {
    let detections: Vec<Detection> = serde_json::from_str(raw)
        .map_err(|e| CoreError::Validation(format!("Malformed detections JSON: {e}")))?;

    for (i, d) in detections.iter().enumerate() {
        if !(0.0..=1.0).contains(&d.confidence) {
            return Err(CoreError::Validation(format!(
                "Detection {i}: confidence {} is outside 0..=1",
                d.confidence
            )));
        }
        if d.image_index < 0 {
            return Err(CoreError::Validation(format!(
                "Detection {i}: negative image index {}",
                d.image_index
            )));
        }
        if d.class.trim().is_empty() {
            return Err(CoreError::Validation(format!("Detection {i}: empty class")));
        }
    }

    Ok(detections)
}
