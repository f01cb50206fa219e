//! Decoding of image payloads: data URLs, lenient base64 and multipart
//! uploads.

use axum::extract::Multipart;
use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, general_purpose::GeneralPurposeConfig, DecodePaddingMode},
    Engine as _,
};
use serde::de::DeserializeOwned;
use std::io::Cursor;
use tracing::debug;

use crate::error::{AppError, Result};

/// Standard alphabet, padding optional, trailing bits tolerated
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Multipart field names accepted for uploads, in order of preference
const UPLOAD_FIELDS: [&str; 2] = ["image", "file"];

/// Drop a `data:<mime>;base64,` style prefix: everything up to and
/// including the first comma.
pub fn strip_data_url(payload: &str) -> &str {
    payload
        .split_once(',')
        .map_or(payload, |(_, encoded)| encoded)
}

/// Decode a base64 or data-URL image string. Characters outside the base64
/// alphabet (whitespace, line breaks) are ignored.
pub fn decode_image(payload: &str) -> Result<Vec<u8>> {
    let cleaned: String = strip_data_url(payload)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();

    let bytes = LENIENT_BASE64
        .decode(cleaned.trim_end_matches('='))
        .map_err(|e| {
            debug!(error = %e, "Rejected base64 payload");
            AppError::InvalidRequest("Invalid base64 image".to_string())
        })?;

    if bytes.is_empty() {
        return Err(AppError::InvalidRequest("Invalid base64 image".to_string()));
    }

    Ok(bytes)
}

/// Width and height read from the image header.
///
/// Bytes that decode from base64 but are not a PNG, JPEG, WebP, GIF or BMP
/// image are a client error, so this answers 400 rather than letting the
/// failure surface later as a 500.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::InvalidRequest(format!("Unreadable image: {}", e)))?
        .into_dimensions()
        .map_err(|e| AppError::InvalidRequest(format!("Unsupported or corrupt image: {}", e)))
}

/// Whether a `Content-Type` value names a multipart form upload. Media types
/// compare case-insensitively.
pub fn is_multipart(content_type: &str) -> bool {
    const MULTIPART_FORM: &str = "multipart/form-data";

    content_type
        .trim_start()
        .get(..MULTIPART_FORM.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM))
}

/// Parse a JSON body, treating anything unparseable as the default value
pub fn lenient_json<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

/// First non-empty upload named `image`, else `file`
pub async fn multipart_image(mut multipart: Multipart) -> Result<Option<Vec<u8>>> {
    let mut found: [Option<Vec<u8>>; 2] = [None, None];

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(slot) = field
            .name()
            .and_then(|name| UPLOAD_FIELDS.iter().position(|f| *f == name))
        else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?;

        if !bytes.is_empty() && found[slot].is_none() {
            found[slot] = Some(bytes.to_vec());
        }
    }

    let [image, file] = found;
    Ok(image.or(file))
}
