use identity::Coordinate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a [`Parameter::Reference`] points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterRef {
  /// Another parameter within the same configuration.
  Local(String),
  /// A property on the resolved entity of another configuration,
  /// discovered through the entity registry.
  Remote {
    coordinate: Coordinate,
    property: String,
  },
}

/// A single parameter value, possibly composed of nested parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parameter {
  /// A literal, already-resolved JSON value.
  Value(serde_json::Value),
  /// Read from a process environment variable at resolve time, falling
  /// back to `default` when unset; an error if unset and no default.
  EnvVar {
    name: String,
    #[serde(default)]
    default: Option<serde_json::Value>,
  },
  /// Resolved through a [`ParameterRef`].
  Reference(ParameterRef),
  /// An ordered list of nested parameters.
  List(Vec<Parameter>),
  /// A string template with `{{name}}` placeholders substituted from
  /// `parameters`, then parsed back as JSON.
  Compound {
    template: String,
    parameters: IndexMap<String, Parameter>,
  },
}

impl Parameter {
  /// Every [`ParameterRef`] reachable from this parameter, depth-first.
  pub fn references(&self) -> Vec<&ParameterRef> {
    let mut out = Vec::new();
    self.collect_references(&mut out);
    out
  }

  fn collect_references<'a>(&'a self, out: &mut Vec<&'a ParameterRef>) {
    match self {
      Parameter::Value(_) | Parameter::EnvVar { .. } => {}
      Parameter::Reference(r) => out.push(r),
      Parameter::List(items) => {
        for item in items {
          item.collect_references(out);
        }
      }
      Parameter::Compound { parameters, .. } => {
        for p in parameters.values() {
          p.collect_references(out);
        }
      }
    }
  }
}
