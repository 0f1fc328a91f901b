use identity::Coordinate;

/// Where in the manifest a failing configuration lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDetails {
  pub environment: String,
  pub group: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error("{coordinate} failed to deploy in {env:?} | {reason}")]
  ConfigDeploy {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    reason: String,
    #[source]
    cause: Option<anyhow::Error>,
  },

  #[error(
    "{coordinate} parameter {parameter_name:?} reference {reference} is invalid in {env:?} | {reason}"
  )]
  ParamRef {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    parameter_name: String,
    reference: Coordinate,
    reason: String,
  },

  #[error(
    "{coordinate} parameter {parameter_name:?} has a circular dependency in {env:?}, depends on {depends_on:?}"
  )]
  CircularDependencyParameterSort {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    parameter_name: String,
    depends_on: Vec<String>,
  },

  #[error(
    "{coordinate} template {template_path:?} did not render to valid json in {env:?} | {cause}"
  )]
  InvalidJson {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    template_path: String,
    #[source]
    cause: anyhow::Error,
  },

  #[error("{coordinate} references {reference}, which was not found in {env:?}")]
  ReferencedConfigNotFound {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    reference: Coordinate,
  },

  #[error("{coordinate} references {reference}, which was skipped in {env:?}")]
  ReferencedConfigSkipped {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    reference: Coordinate,
  },

  #[error("{coordinate} has kind {kind:?}, for which {env:?} has no client capability")]
  UnknownKind { coordinate: Coordinate, env: EnvironmentDetails, kind: String },

  #[error("{coordinate} and another configuration of kind {kind:?} both resolve to name {name:?} in {env:?}")]
  DuplicateName {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    kind: String,
    name: String,
  },

  #[error("{coordinate} is missing required parameter \"name\" in {env:?}")]
  MissingName { coordinate: Coordinate, env: EnvironmentDetails },

  #[error("{coordinate} is missing required parameter \"scope\" in {env:?}")]
  MissingScope { coordinate: Coordinate, env: EnvironmentDetails },

  #[error("{coordinate} declares reserved parameter name {parameter_name:?} in {env:?}")]
  ReservedParameterName {
    coordinate: Coordinate,
    env: EnvironmentDetails,
    parameter_name: String,
  },
}

impl EngineError {
  pub fn coordinate(&self) -> &Coordinate {
    match self {
      EngineError::ConfigDeploy { coordinate, .. }
      | EngineError::ParamRef { coordinate, .. }
      | EngineError::CircularDependencyParameterSort { coordinate, .. }
      | EngineError::InvalidJson { coordinate, .. }
      | EngineError::ReferencedConfigNotFound { coordinate, .. }
      | EngineError::ReferencedConfigSkipped { coordinate, .. }
      | EngineError::UnknownKind { coordinate, .. }
      | EngineError::DuplicateName { coordinate, .. }
      | EngineError::MissingName { coordinate, .. }
      | EngineError::MissingScope { coordinate, .. }
      | EngineError::ReservedParameterName { coordinate, .. } => coordinate,
    }
  }

  pub fn location_details(&self) -> &EnvironmentDetails {
    match self {
      EngineError::ConfigDeploy { env, .. }
      | EngineError::ParamRef { env, .. }
      | EngineError::CircularDependencyParameterSort { env, .. }
      | EngineError::InvalidJson { env, .. }
      | EngineError::ReferencedConfigNotFound { env, .. }
      | EngineError::ReferencedConfigSkipped { env, .. }
      | EngineError::UnknownKind { env, .. }
      | EngineError::DuplicateName { env, .. }
      | EngineError::MissingName { env, .. }
      | EngineError::MissingScope { env, .. }
      | EngineError::ReservedParameterName { env, .. } => env,
    }
  }
}
