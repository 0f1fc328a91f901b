use std::fmt;

use serde::{Deserialize, Serialize};

/// Globally unique, immutable address of a configuration within the
/// declarative description. Independent of anything a tenant assigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
  pub project: String,
  /// The specific type string for this configuration, e.g. `"workflow"`,
  /// `"dashboard"`, `"bucket"`, a Settings schema id, or a classic API id.
  /// This is the same string the original description uses as `type`.
  pub kind: String,
  pub config_id: String,
}

impl Coordinate {
  pub fn new(
    project: impl Into<String>,
    kind: impl Into<String>,
    config_id: impl Into<String>,
  ) -> Self {
    Self {
      project: project.into(),
      kind: kind.into(),
      config_id: config_id.into(),
    }
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.project, self.kind, self.config_id)
  }
}
