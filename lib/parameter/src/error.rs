use identity::Coordinate;

#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
  #[error("parameter {0:?} references an unset environment variable {1:?}")]
  UnresolvedEnvVar(String, String),
  #[error("parameter {0:?} references unknown local parameter {1:?}")]
  UnknownLocalReference(String, String),
  #[error(
    "parameter {0:?} references {1}.{2:?}, which is not in the entity registry"
  )]
  UnresolvedReference(String, Coordinate, String),
  #[error(
    "parameter {0:?} references property {1:?} on {2}, which the resolved entity does not have"
  )]
  MissingProperty(String, String, Coordinate),
  #[error("circular dependency while sorting parameters: {0:?}")]
  CircularDependencyParameterSort(Vec<String>),
  #[error("rendered template for parameter {0:?} is not valid json | {1}")]
  InvalidJson(String, serde_json::Error),
  #[error("template for parameter {0:?} references undeclared key {1:?}")]
  UnknownTemplateKey(String, String),
}

pub type Result<T> = ::core::result::Result<T, ParameterError>;
