//! Process-wide feature toggles for the deployment engine.
//!
//! This is not a file-merging config loader — manifest and project loading
//! are external collaborators. This is only the small set of env-driven
//! flags that gate engine-internal behavior.

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("failed to parse feature flags from environment | {0}")]
  Env(#[from] envy::Error),
}

pub type Result<T> = ::core::result::Result<T, Error>;

/// Immutable, process-wide toggles. Constructed once at startup and passed
/// by reference into every component that needs it — never read from a
/// global, per the engine's Design Notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
  /// Sanitize bucket names (lowercase, restrict charset, truncate).
  /// Default off preserves raw `project_configId`.
  pub sanitize_bucket_names: bool,
  /// Post-process `builtin:management-zones` Settings object IDs through
  /// the numeric-ID decoder so `properties[id]` is the human-usable
  /// numeric identifier rather than the raw object ID.
  pub management_zone_numeric_ids: bool,
  /// Enable the `Segment` configuration kind. When off, `Segment`
  /// configurations fail fast with `UnknownKind` before any client call.
  pub segments_enabled: bool,
  /// Maximum number of weakly-connected components deployed concurrently
  /// within one environment.
  pub max_concurrent_components: usize,
  /// Maximum number of same-layer nodes deployed concurrently within one
  /// component.
  pub max_concurrent_nodes: usize,
  /// Maximum number of environments deployed concurrently.
  pub max_concurrent_environments: usize,
}

impl Default for FeatureFlags {
  fn default() -> Self {
    Self {
      sanitize_bucket_names: false,
      management_zone_numeric_ids: false,
      segments_enabled: false,
      max_concurrent_components: 10,
      max_concurrent_nodes: 10,
      max_concurrent_environments: 4,
    }
  }
}

impl FeatureFlags {
  /// Loads flags from `MONACO_*` prefixed environment variables, falling
  /// back to [`Default`] for anything unset. Called explicitly by the
  /// caller rather than cached behind a global.
  pub fn from_env() -> Result<Self> {
    Ok(envy::prefixed("MONACO_").from_env::<Self>()?)
  }
}
