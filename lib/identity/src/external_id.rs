use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::coordinate::Coordinate;
use crate::stable_uuid::uuid_from_coordinate;

const MONACO_PREFIX: &str = "monaco:";
const MAX_EXTERNAL_ID_LEN: usize = 500;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExternalIdError {
  #[error("settings external id requires a non-empty schema id")]
  MissingSchema,
  #[error("settings external id requires a non-empty config id")]
  MissingConfigId,
}

/// External ID for a `Settings` configuration: `monaco:` followed by the
/// base64 encoding of `[project$]schema$configId`. Truncated *from the
/// front* (keeping the suffix) when the encoded payload would push the
/// total past 500 characters.
pub fn settings_external_id(
  c: &Coordinate,
) -> Result<String, ExternalIdError> {
  if c.kind.is_empty() {
    return Err(ExternalIdError::MissingSchema);
  }
  if c.config_id.is_empty() {
    return Err(ExternalIdError::MissingConfigId);
  }

  let payload = if c.project.is_empty() {
    format!("{}${}", c.kind, c.config_id)
  } else {
    format!("{}${}${}", c.project, c.kind, c.config_id)
  };

  let mut encoded = BASE64.encode(payload.as_bytes());
  let max_encoded_len = MAX_EXTERNAL_ID_LEN - MONACO_PREFIX.len();
  if encoded.len() > max_encoded_len {
    let start = encoded.len() - max_encoded_len;
    encoded = encoded[start..].to_string();
  }

  Ok(format!("{MONACO_PREFIX}{encoded}"))
}

/// External ID for Document / Segment / SLO / other generic kinds:
/// `monaco-` followed by [`uuid_from_coordinate`]. Always ≤ 50 bytes.
pub fn generic_external_id(c: &Coordinate) -> String {
  format!("monaco-{}", uuid_from_coordinate(c))
}
