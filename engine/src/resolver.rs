use parameter::{EnvSource, ParameterError, ParameterRef, resolve_all};
use registry::RegistrySnapshot;

use crate::error::{EngineError, EnvironmentDetails};
use crate::model::{Configuration, RESERVED_PARAMETER_NAMES};

/// Resolves every parameter of `config`, validating the parameter names
/// and cross-configuration references against `snapshot` first
/// (reserved names, self-references, references to unknown or skipped
/// coordinates), then delegating value resolution to the parameter
/// crate.
pub async fn resolve_configuration(
  config: &Configuration,
  snapshot: &RegistrySnapshot,
  env_source: &dyn EnvSource,
  env: &EnvironmentDetails,
) -> Result<indexmap::IndexMap<String, serde_json::Value>, EngineError> {
  validate_parameter_names(config, env)?;
  validate_references(config, snapshot, env)?;

  resolve_all(&config.parameters, snapshot, env_source)
    .map_err(|err| translate(config, env, err))
}

fn validate_parameter_names(
  config: &Configuration,
  env: &EnvironmentDetails,
) -> Result<(), EngineError> {
  for name in config.parameters.keys() {
    if RESERVED_PARAMETER_NAMES.contains(&name.as_str()) {
      return Err(EngineError::ReservedParameterName {
        coordinate: config.coordinate.clone(),
        env: env.clone(),
        parameter_name: name.clone(),
      });
    }
  }
  Ok(())
}

fn validate_references(
  config: &Configuration,
  snapshot: &RegistrySnapshot,
  env: &EnvironmentDetails,
) -> Result<(), EngineError> {
  for (name, param) in &config.parameters {
    for reference in param.references() {
      let ParameterRef::Remote { coordinate, property } = reference else {
        continue;
      };

      if coordinate == &config.coordinate && property == name {
        return Err(EngineError::ParamRef {
          coordinate: config.coordinate.clone(),
          env: env.clone(),
          parameter_name: name.clone(),
          reference: coordinate.clone(),
          reason: "parameter references itself".to_string(),
        });
      }

      match snapshot.lookup_entity(coordinate) {
        None => {
          return Err(EngineError::ReferencedConfigNotFound {
            coordinate: config.coordinate.clone(),
            env: env.clone(),
            reference: coordinate.clone(),
          });
        }
        Some(entity) if entity.skip => {
          return Err(EngineError::ReferencedConfigSkipped {
            coordinate: config.coordinate.clone(),
            env: env.clone(),
            reference: coordinate.clone(),
          });
        }
        Some(_) => {}
      }
    }
  }
  Ok(())
}

fn translate(
  config: &Configuration,
  env: &EnvironmentDetails,
  err: ParameterError,
) -> EngineError {
  match err {
    ParameterError::CircularDependencyParameterSort(names) => {
      EngineError::CircularDependencyParameterSort {
        coordinate: config.coordinate.clone(),
        env: env.clone(),
        parameter_name: names.first().cloned().unwrap_or_default(),
        depends_on: names,
      }
    }
    ParameterError::InvalidJson(parameter_name, cause) => EngineError::InvalidJson {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      template_path: parameter_name,
      cause: cause.into(),
    },
    other => EngineError::ConfigDeploy {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      reason: other.to_string(),
      cause: Some(anyhow::anyhow!(other)),
    },
  }
}

/// Coerces the resolved `name` property to a string.
pub fn coerce_name_to_string(
  resolved: &indexmap::IndexMap<String, serde_json::Value>,
) -> Option<String> {
  resolved.get("name").map(|value| match value {
    serde_json::Value::String(s) => s.clone(),
    other => other.to_string(),
  })
}
