//! HTTP client for the detection service.

use std::time::Duration;

use leukoscan_core::detection::Detection;
use serde::Deserialize;

use crate::data_url;
use crate::InferenceError;

/// HTTP request timeout for a single detection call. Model inference on a
/// large smear image can take a while; this bounds it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default service URL for local development.
const DEFAULT_BASE_URL: &str = "http://localhost:8500";

/// Wire shape of the service response.
#[derive(Debug, Deserialize)]
struct DetectWire {
    detections: Vec<Detection>,
    #[serde(rename = "annotatedImage")]
    annotated_image: Option<String>,
}

/// Decoded result of one detection call.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    pub detections: Vec<Detection>,
    /// Annotated overlay, decoded from the service's data URL.
    pub annotated_image: Option<Vec<u8>>,
    pub annotated_mime: Option<String>,
}

/// Client for the white-blood-cell detection service.
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
}

impl InferenceClient {
    /// Create a client targeting `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Build the client from the `INFERENCE_URL` environment variable.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("INFERENCE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit one image for detection.
    ///
    /// Sends the image as a multipart `file` field to `POST {base}/detect`
    /// and decodes the annotated overlay if the service produced one. An
    /// overlay that fails to decode is dropped with a warning rather than
    /// failing the call.
    pub async fn detect(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<InferenceResult, InferenceError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| InferenceError::Malformed(format!("Invalid mime type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/detect", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InferenceError::HttpStatus(response.status().as_u16()));
        }

        let wire: DetectWire = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        let (annotated_image, annotated_mime) = match wire.annotated_image.as_deref() {
            Some(url) => match data_url::decode(url) {
                Some(decoded) => (Some(decoded.bytes), Some(decoded.mime_type)),
                None => {
                    tracing::warn!(filename = %filename, "Discarding undecodable annotated overlay");
                    (None, None)
                }
            },
            None => (None, None),
        };

        Ok(InferenceResult {
            detections: wire.detections,
            annotated_image,
            annotated_mime,
        })
    }
}
