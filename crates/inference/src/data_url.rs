//! Decoding for `data:` URLs returned by the inference service.

use base64::{engine::general_purpose, Engine as _};

/// A decoded data URL: media type plus raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a `data:<mime>;base64,<payload>` URL.
///
/// Returns `None` for anything that is not a base64 data URL (the caller
/// treats that as "no annotated overlay", not an error).
pub fn decode(data_url: &str) -> Option<DecodedDataUrl> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    if mime_type.is_empty() {
        return None;
    }
    let bytes = general_purpose::STANDARD.decode(payload.trim()).ok()?;
    Some(DecodedDataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_data_url() {
        // "leuko" base64-encoded.
        let url = "data:image/png;base64,bGV1a28=";
        let decoded = decode(url).expect("valid data URL");
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.bytes, b"leuko");
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(decode("https://example.com/a.png").is_none());
        assert!(decode("").is_none());
    }

    #[test]
    fn rejects_non_base64_encoding() {
        assert!(decode("data:image/png,rawbytes").is_none());
    }

    #[test]
    fn rejects_missing_mime() {
        assert!(decode("data:;base64,bGV1a28=").is_none());
    }

    #[test]
    fn rejects_invalid_base64_payload() {
        assert!(decode("data:image/png;base64,@@@@").is_none());
    }
}
