//! Locating media bytes in a finished job's result record.
//!
//! The record's shape is not fixed, so extraction walks an ordered list of
//! strategies and stops at the first one that yields a non-empty payload.
//! Fetching a remote URI is always the last resort.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::MediaFetcher;
use crate::error::{Result, StudioError};

/// Fields holding base64 media directly.
const INLINE_FIELDS: &[&str] = &["videoBytes", "bytesBase64Encoded"];
/// Alternate fields that may carry the payload in several encodings.
const DATA_FIELDS: &[&str] = &["data", "content", "bytes", "videoData", "inlineData"];
const URI_FIELDS: &[&str] = &["uri", "url", "downloadUri"];

type Strategy = fn(&Value) -> Option<Vec<u8>>;

/// Local strategies, in the order they are tried.
const STRATEGIES: &[(&str, Strategy)] = &[("inline bytes", inline_bytes), ("data field", data_field)];

fn non_empty(bytes: Vec<u8>) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then_some(bytes)
}

fn decode_base64(s: &str) -> Option<Vec<u8>> {
    match STANDARD.decode(s.trim()) {
        Ok(bytes) => non_empty(bytes),
        Err(e) => {
            warn!("Failed to decode base64 payload: {}", e);
            None
        }
    }
}

/// A JSON array of byte values.
fn raw_buffer(items: &[Value]) -> Option<Vec<u8>> {
    let bytes = items
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect::<Option<Vec<u8>>>()?;
    non_empty(bytes)
}

pub fn inline_bytes(record: &Value) -> Option<Vec<u8>> {
    INLINE_FIELDS
        .iter()
        .find_map(|field| record.get(field)?.as_str().and_then(decode_base64))
}

pub fn data_field(record: &Value) -> Option<Vec<u8>> {
    DATA_FIELDS.iter().find_map(|field| {
        let value = record.get(field)?;
        let decoded = match value {
            Value::String(s) => decode_base64(s),
            Value::Array(items) => raw_buffer(items),
            Value::Object(nested) => match nested.get("data") {
                Some(Value::String(s)) => decode_base64(s),
                Some(Value::Array(items)) => raw_buffer(items),
                _ => None,
            },
            _ => None,
        };
        if decoded.is_some() {
            info!("Extracted media from '{}' field", field);
        }
        decoded
    })
}

pub fn media_uri(record: &Value) -> Option<&str> {
    URI_FIELDS
        .iter()
        .find_map(|field| record.get(field)?.as_str().filter(|uri| !uri.trim().is_empty()))
}

fn field_names(record: &Value) -> Vec<String> {
    record
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default()
}

/// Returns the media bytes of a result record.
///
/// Fails with [`StudioError::Extraction`] listing the record's fields when no
/// strategy yields data. A failed or empty download counts as no data.
pub async fn extract_media<F>(record: &Value, fetcher: &F) -> Result<Vec<u8>>
where
    F: MediaFetcher + ?Sized,
{
    for (name, strategy) in STRATEGIES {
        if let Some(bytes) = strategy(record) {
            info!("Media extracted via {} ({} bytes)", name, bytes.len());
            return Ok(bytes);
        }
    }

    if let Some(uri) = media_uri(record) {
        match fetcher.fetch_media(uri).await {
            Ok(bytes) if !bytes.is_empty() => {
                info!("Downloaded media, size: {}", bytes.len());
                return Ok(bytes);
            }
            Ok(_) => warn!("Download from {} returned an empty body", uri),
            Err(e) => warn!("Download from {} failed: {}", uri, e),
        }
    }

    Err(StudioError::Extraction {
        fields: field_names(record),
    })
}
