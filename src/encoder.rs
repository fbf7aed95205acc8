use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::{Read, Write};

use crate::error::{TrackError, TrackResult};
use crate::pipeline::EventRecord;

/// One compact JSON object, no trailing newline.
pub fn encode_event(record: &EventRecord) -> TrackResult<String> {
    Ok(serde_json::to_string(record)?)
}

/// Batch envelope: `base64(gzip("[" + messages.join(",") + "]"))`.
pub fn encode_batch(messages: &[String]) -> TrackResult<String> {
    let mut payload = String::with_capacity(messages.iter().map(|m| m.len() + 1).sum::<usize>() + 2);
    payload.push('[');
    payload.push_str(&messages.join(","));
    payload.push(']');

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Inverse of [`encode_batch`].
pub fn decode_batch(envelope: &str) -> TrackResult<Vec<Value>> {
    let compressed = STANDARD
        .decode(envelope)
        .map_err(|e| TrackError::illegal(format!("envelope is not base64: {e}")))?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut json = String::new();
    decoder.read_to_string(&mut json)?;
    Ok(serde_json::from_str(&json)?)
}
