//! Deployment engine: reconciles a declarative project description against
//! one or more tenant environments.
//!
//! [`client`] models the per-environment transport capabilities an
//! external collaborator supplies; [`model`] describes the project and
//! configuration shapes this engine consumes; [`Deployer`] is the single
//! public entry point that ties dependency resolution, scheduling, and
//! dispatch together and returns a report.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod preloader;
pub mod resolver;

mod deployer;
mod reporter;

pub use client::{
  Automation, Bucket, ClassicApi, ClientSet, ClientResult, Document, ListedObject, Segment,
  Settings, SettingsUpsert, UpsertResult,
};
pub use deployer::{Deployer, ScheduleOptions};
pub use error::{EngineError, EnvironmentDetails};
pub use model::{
  AutomationResource, Configuration, ConfigurationKind, DocumentKind, ManifestEnvironment,
  ProjectInput, RESERVED_PARAMETER_NAMES,
};
pub use reporter::render_report;
