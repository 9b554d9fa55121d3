//! Data-URI image payload extraction.
//!
//! Camera clients publish frames as `data:image/<fmt>;base64,<data>`
//! inside an ordinary PUBLISH payload. This module recognizes that
//! convention and decodes the embedded image. Decoding is strict: bad
//! base64 is an error rather than something to repair, but the error is
//! local to the one payload and never penalizes the connection.

use base64::prelude::*;
use bytes::Bytes;
use thiserror::Error;

/// Prefix every data-URI image payload starts with.
const DATA_URI_PREFIX: &[u8] = b"data:image/";

/// Separator between the format token and the base64 data.
const BASE64_MARKER: &[u8] = b";base64,";

/// An image decoded out of a PUBLISH payload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Lowercase format token from the URI (e.g. "png", "jpeg").
    pub format: String,
    pub bytes: Bytes,
}

/// Failure to decode a payload that did match the data-URI prefix.
#[derive(Error, Debug)]
pub enum ImageDecodeError {
    #[error("invalid base64 in image payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Inspect a PUBLISH payload for the data-URI image convention.
///
/// Returns `Ok(None)` when the payload does not match the convention at
/// all (an opaque, non-image message), `Ok(Some(_))` on a successful
/// decode, and `Err` when the prefix matched but the base64 remainder is
/// invalid.
pub fn extract(payload: &[u8]) -> Result<Option<DecodedImage>, ImageDecodeError> {
    let Some(rest) = payload.strip_prefix(DATA_URI_PREFIX) else {
        return Ok(None);
    };

    // Format token: lowercase alphanumeric, terminated by ";base64,".
    let Some(marker_pos) = rest.windows(BASE64_MARKER.len()).position(|w| w == BASE64_MARKER)
    else {
        return Ok(None);
    };
    let format = &rest[..marker_pos];
    if format.is_empty()
        || !format
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Ok(None);
    }

    let data = &rest[marker_pos + BASE64_MARKER.len()..];
    let bytes = BASE64_STANDARD.decode(data)?;

    Ok(Some(DecodedImage {
        // format is pure ASCII at this point
        format: String::from_utf8_lossy(format).into_owned(),
        bytes: Bytes::from(bytes),
    }))
}
