use std::collections::HashMap;

use identity::Coordinate;
use indexmap::IndexMap;
use parameter::Parameter;
use serde::{Deserialize, Serialize};

/// Selects which dispatcher adapter and client capability a configuration
/// needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigurationKind {
  ClassicApi { api_id: String, non_unique_name: bool, deprecated: bool },
  Settings { schema_id: String, schema_version: String },
  Automation { resource: AutomationResource },
  Bucket,
  Document { kind: DocumentKind, private: bool },
  OpenPipeline { kind: String },
  Segment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomationResource {
  Workflow,
  BusinessCalendar,
  SchedulingRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
  Dashboard,
  Notebook,
  Launchpad,
}

impl ConfigurationKind {
  pub fn name(&self) -> &'static str {
    match self {
      ConfigurationKind::ClassicApi { .. } => "classic_api",
      ConfigurationKind::Settings { .. } => "settings",
      ConfigurationKind::Automation { .. } => "automation",
      ConfigurationKind::Bucket => "bucket",
      ConfigurationKind::Document { .. } => "document",
      ConfigurationKind::OpenPipeline { .. } => "open_pipeline",
      ConfigurationKind::Segment => "segment",
    }
  }

  /// Whether this kind enforces a unique `entityName` within an
  /// environment.
  pub fn requires_unique_name(&self) -> bool {
    matches!(
      self,
      ConfigurationKind::ClassicApi { non_unique_name: false, .. }
        | ConfigurationKind::Document { .. }
    )
  }
}

/// Names reserved by the engine; a project MUST NOT declare parameters
/// with these names.
pub const RESERVED_PARAMETER_NAMES: [&str; 4] = ["id", "name", "scope", "skip"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
  pub coordinate: Coordinate,
  pub kind: ConfigurationKind,
  pub group: String,
  pub environment: String,
  pub template: String,
  pub parameters: IndexMap<String, Parameter>,
  pub skip: bool,
  pub origin_object_id: Option<String>,
}

/// A single target tenant, named in the manifest (an external
/// collaborator owns parsing the manifest file itself).
#[derive(Debug, Clone)]
pub struct ManifestEnvironment {
  pub name: String,
  pub group: String,
}

/// A project's configurations, already grouped the way the manifest
/// loader would group them: by environment, then by kind.
#[derive(Debug, Clone, Default)]
pub struct ProjectInput {
  pub id: String,
  pub group: Option<String>,
  pub configurations: Vec<Configuration>,
  /// Other project ids this project transitively depends on, keyed by
  /// environment name.
  pub dependencies_per_environment: HashMap<String, Vec<String>>,
}
