use std::collections::HashMap;
use std::env;

use identity::Coordinate;
use indexmap::IndexMap;

use crate::error::{ParameterError, Result};
use crate::sort::topological_order;
use crate::value::{Parameter, ParameterRef};

/// Looks up a property on another configuration's already-deployed
/// entity. Implemented by the entity registry; kept as a trait here so
/// this crate has no dependency on the registry's concrete type.
pub trait EntityLookup {
  fn lookup(
    &self,
    coordinate: &Coordinate,
    property: &str,
  ) -> Option<serde_json::Value>;
}

/// Source of environment-variable values available during resolution.
/// Abstracted so tests can supply a fixed map instead of touching the
/// process environment.
pub trait EnvSource {
  fn get(&self, name: &str) -> Option<String>;
}

/// Reads from the real process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
  fn get(&self, name: &str) -> Option<String> {
    env::var(name).ok()
  }
}

/// Resolves every parameter in `parameters`, honoring local
/// (intra-configuration) dependency order, and returns each parameter's
/// name mapped to its resolved JSON value.
pub fn resolve_all(
  parameters: &IndexMap<String, Parameter>,
  entities: &dyn EntityLookup,
  env_source: &dyn EnvSource,
) -> Result<IndexMap<String, serde_json::Value>> {
  let order = topological_order(parameters)?;
  let mut resolved: IndexMap<String, serde_json::Value> = IndexMap::new();

  for name in order {
    let param = &parameters[&name];
    let value = resolve_one(&name, param, &resolved, entities, env_source)?;
    resolved.insert(name, value);
  }

  Ok(resolved)
}

fn resolve_one(
  name: &str,
  param: &Parameter,
  local_values: &IndexMap<String, serde_json::Value>,
  entities: &dyn EntityLookup,
  env_source: &dyn EnvSource,
) -> Result<serde_json::Value> {
  match param {
    Parameter::Value(v) => Ok(v.clone()),
    Parameter::EnvVar { name: var_name, default } => match env_source.get(var_name) {
      Some(value) => Ok(serde_json::Value::String(value)),
      None => default.clone().ok_or_else(|| {
        ParameterError::UnresolvedEnvVar(name.to_string(), var_name.clone())
      }),
    },
    Parameter::Reference(reference) => {
      resolve_reference(name, reference, local_values, entities)
    }
    Parameter::List(items) => {
      let mut out = Vec::with_capacity(items.len());
      for (i, item) in items.iter().enumerate() {
        let item_name = format!("{name}[{i}]");
        out.push(resolve_one(
          &item_name,
          item,
          local_values,
          entities,
          env_source,
        )?);
      }
      Ok(serde_json::Value::Array(out))
    }
    Parameter::Compound { template, parameters } => {
      let mut rendered: HashMap<String, serde_json::Value> = HashMap::new();
      for (key, nested) in parameters {
        let nested_name = format!("{name}.{key}");
        rendered.insert(
          key.clone(),
          resolve_one(&nested_name, nested, local_values, entities, env_source)?,
        );
      }
      crate::template::render(name, template, |key| rendered.get(key).cloned())
    }
  }
}

fn resolve_reference(
  name: &str,
  reference: &ParameterRef,
  local_values: &IndexMap<String, serde_json::Value>,
  entities: &dyn EntityLookup,
) -> Result<serde_json::Value> {
  match reference {
    ParameterRef::Local(dep) => {
      // `topological_order` guarantees `dep` was resolved before `name`.
      Ok(
        local_values
          .get(dep)
          .cloned()
          .expect("local reference resolved out of order"),
      )
    }
    ParameterRef::Remote { coordinate, property } => {
      entities.lookup(coordinate, property).ok_or_else(|| {
        ParameterError::UnresolvedReference(
          name.to_string(),
          coordinate.clone(),
          property.clone(),
        )
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct NoEntities;
  impl EntityLookup for NoEntities {
    fn lookup(&self, _: &Coordinate, _: &str) -> Option<serde_json::Value> {
      None
    }
  }

  struct FixedEntities(HashMap<(Coordinate, String), serde_json::Value>);
  impl EntityLookup for FixedEntities {
    fn lookup(
      &self,
      coordinate: &Coordinate,
      property: &str,
    ) -> Option<serde_json::Value> {
      self.0.get(&(coordinate.clone(), property.to_string())).cloned()
    }
  }

  struct FixedEnv(HashMap<String, String>);
  impl EnvSource for FixedEnv {
    fn get(&self, name: &str) -> Option<String> {
      self.0.get(name).cloned()
    }
  }

  #[test]
  fn resolves_value_and_local_reference_in_order() {
    let mut parameters = IndexMap::new();
    parameters.insert("a".to_string(), Parameter::Value(serde_json::json!(5)));
    parameters.insert(
      "b".to_string(),
      Parameter::Reference(ParameterRef::Local("a".to_string())),
    );

    let resolved =
      resolve_all(&parameters, &NoEntities, &FixedEnv(HashMap::new())).unwrap();
    assert_eq!(resolved["a"], serde_json::json!(5));
    assert_eq!(resolved["b"], serde_json::json!(5));
  }

  #[test]
  fn resolves_env_var() {
    let mut parameters = IndexMap::new();
    parameters.insert(
      "token".to_string(),
      Parameter::EnvVar { name: "API_TOKEN".to_string(), default: None },
    );
    let env = FixedEnv(HashMap::from([(
      "API_TOKEN".to_string(),
      "secret".to_string(),
    )]));

    let resolved = resolve_all(&parameters, &NoEntities, &env).unwrap();
    assert_eq!(resolved["token"], serde_json::json!("secret"));
  }

  #[test]
  fn missing_env_var_errors() {
    let mut parameters = IndexMap::new();
    parameters.insert(
      "token".to_string(),
      Parameter::EnvVar { name: "MISSING".to_string(), default: None },
    );
    let err = resolve_all(&parameters, &NoEntities, &FixedEnv(HashMap::new()))
      .unwrap_err();
    assert!(matches!(err, ParameterError::UnresolvedEnvVar(_, _)));
  }

  #[test]
  fn missing_env_var_falls_back_to_default() {
    let mut parameters = IndexMap::new();
    parameters.insert(
      "token".to_string(),
      Parameter::EnvVar {
        name: "MISSING".to_string(),
        default: Some(serde_json::json!("fallback")),
      },
    );
    let resolved = resolve_all(&parameters, &NoEntities, &FixedEnv(HashMap::new())).unwrap();
    assert_eq!(resolved["token"], serde_json::json!("fallback"));
  }

  #[test]
  fn resolves_remote_reference() {
    let coordinate = Coordinate::new("proj", "workflow", "wf1");
    let mut parameters = IndexMap::new();
    parameters.insert(
      "id".to_string(),
      Parameter::Reference(ParameterRef::Remote {
        coordinate: coordinate.clone(),
        property: "id".to_string(),
      }),
    );
    let entities = FixedEntities(HashMap::from([(
      (coordinate, "id".to_string()),
      serde_json::json!("abc-123"),
    )]));

    let resolved =
      resolve_all(&parameters, &entities, &FixedEnv(HashMap::new())).unwrap();
    assert_eq!(resolved["id"], serde_json::json!("abc-123"));
  }

  #[test]
  fn missing_remote_reference_errors() {
    let coordinate = Coordinate::new("proj", "workflow", "wf1");
    let mut parameters = IndexMap::new();
    parameters.insert(
      "id".to_string(),
      Parameter::Reference(ParameterRef::Remote {
        coordinate,
        property: "id".to_string(),
      }),
    );
    let err = resolve_all(&parameters, &NoEntities, &FixedEnv(HashMap::new()))
      .unwrap_err();
    assert!(matches!(err, ParameterError::UnresolvedReference(_, _, _)));
  }

  #[test]
  fn resolves_list_of_values() {
    let mut parameters = IndexMap::new();
    parameters.insert(
      "tags".to_string(),
      Parameter::List(vec![
        Parameter::Value(serde_json::json!("a")),
        Parameter::Value(serde_json::json!("b")),
      ]),
    );
    let resolved =
      resolve_all(&parameters, &NoEntities, &FixedEnv(HashMap::new())).unwrap();
    assert_eq!(resolved["tags"], serde_json::json!(["a", "b"]));
  }
}
