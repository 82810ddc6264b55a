use std::borrow::Cow;

use chrono::{DateTime, Utc};

use agora_types::{Board, SharePayload};

use crate::error::{BoardError, Result};
use crate::expiry::ShareTtl;

/// Decompressed payloads larger than this are refused.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize the shareable projection of `board`, stamped with issue and
/// expiry times. The result is zlib-compressed when the `compression`
/// feature is enabled.
pub fn encode(board: &Board, ttl: ShareTtl, now: DateTime<Utc>) -> Result<Vec<u8>> {
    let (issued_at, expires_at) = ttl.stamp(now);
    let payload = SharePayload::project(board, issued_at, expires_at);
    let json = serde_json::to_vec(&payload)
        .map_err(|e| BoardError::validation(format!("cannot encode board: {}", e)))?;
    Ok(compress(json))
}

/// Inverse of [`encode`]. Accepts both compressed and plain JSON bodies.
pub fn decode(bytes: &[u8]) -> Result<SharePayload> {
    let inflated = decompress(bytes)?;
    let json = inflated.strip_prefix(UTF8_BOM).unwrap_or(&inflated[..]);
    serde_json::from_slice(json)
        .map_err(|e| BoardError::validation(format!("share payload is not a board: {}", e)))
}

#[cfg(feature = "compression")]
fn compress(json: Vec<u8>) -> Vec<u8> {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), Compression::best());
    match encoder.write_all(&json).and_then(|_| encoder.finish()) {
        Ok(compressed) if compressed.len() < json.len() => compressed,
        Ok(_) => json,
        Err(e) => {
            tracing::warn!("Compression failed, sharing uncompressed: {}", e);
            json
        }
    }
}

#[cfg(not(feature = "compression"))]
fn compress(json: Vec<u8>) -> Vec<u8> {
    json
}

#[cfg(feature = "compression")]
fn decompress(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    use std::io::Read;

    use flate2::read::ZlibDecoder;

    // Anything that does not inflate is handed to the JSON parser as is.
    let mut out = Vec::new();
    if let Err(e) = ZlibDecoder::new(bytes)
        .take(MAX_PAYLOAD_BYTES as u64 + 1)
        .read_to_end(&mut out)
    {
        tracing::debug!("Share payload is not zlib ({}), reading as plain JSON", e);
        return Ok(Cow::Borrowed(bytes));
    }
    if out.len() > MAX_PAYLOAD_BYTES {
        return Err(BoardError::validation("share payload is too large"));
    }
    Ok(Cow::Owned(out))
}

#[cfg(not(feature = "compression"))]
fn decompress(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    Ok(Cow::Borrowed(bytes))
}
