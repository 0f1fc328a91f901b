use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NumericIdError {
  #[error("object id is not valid base64url")]
  InvalidEncoding,
  #[error("decoded object id is not a 16-byte uuid, got {0} bytes")]
  UnexpectedLength(usize),
}

/// Decodes the legacy numeric identifier embedded in a base64url-encoded
/// object id, e.g. `builtin:management-zones` object ids. The object id
/// decodes to 16 raw bytes that are themselves a UUID; how the numeric
/// value is carried inside those bytes depends on the UUID version:
///
/// - v4 / other RFC 4122 random UUIDs: bytes `0..6` and `12..16` are
///   concatenated into a 10-byte signed big-endian integer.
/// - any other version: bytes `0..8` are a signed big-endian `i64`.
pub fn decode_numeric_id(object_id: &str) -> Result<i64, NumericIdError> {
  let bytes = URL_SAFE_NO_PAD
    .decode(object_id)
    .map_err(|_| NumericIdError::InvalidEncoding)?;
  if bytes.len() != 16 {
    return Err(NumericIdError::UnexpectedLength(bytes.len()));
  }

  let mut raw = [0u8; 16];
  raw.copy_from_slice(&bytes);
  let embedded = Uuid::from_bytes(raw);

  let is_rfc4122_random = embedded.get_version_num() == 4;
  if is_rfc4122_random {
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(&raw[0..6]);
    buf[6..].copy_from_slice(&raw[12..16]);
    Ok(signed_big_endian_to_i64(&buf))
  } else {
    Ok(signed_big_endian_to_i64(&raw[0..8]))
  }
}

/// Interprets `bytes` as a signed, big-endian, arbitrary-length integer
/// and narrows it to `i64` (the narrowing is lossless for every value
/// this module actually decodes: 8 or 10 input bytes never exceed i64's
/// range once the borrow from two's-complement sign-extension is done
/// in `i128`).
fn signed_big_endian_to_i64(bytes: &[u8]) -> i64 {
  let negative = bytes[0] & 0x80 != 0;
  let mut value: i128 = if negative { -1 } else { 0 };
  for &b in bytes {
    value = (value << 8) | i128::from(b);
  }
  value as i64
}
