//! Client for the external white-blood-cell detection service.
//!
//! The service accepts one image per request and answers with a list of
//! detections plus, optionally, an annotated overlay encoded as a data URL.

pub mod client;
pub mod data_url;

pub use client::{InferenceClient, InferenceResult};

/// Error type for inference calls.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The HTTP request failed (network, DNS, timeout).
    #[error("Inference request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Inference service returned HTTP {0}")]
    HttpStatus(u16),

    /// The response body did not match the expected shape.
    #[error("Malformed inference response: {0}")]
    Malformed(String),
}
