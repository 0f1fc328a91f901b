//! Concurrent scheduler: environment-level, component-level, and
//! node-level (same-layer) bounded fan-out, honoring `ContinueOnError`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use config::FeatureFlags;
use graph::DependencyGraph;
use identity::Coordinate;
use parameter::{ParameterRef, ProcessEnv};
use registry::{EntityRegistry, RegistryError, RegistrySnapshot, ResolvedEntity};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::ClientSet;
use crate::dispatcher::dispatch;
use crate::error::{EngineError, EnvironmentDetails};
use crate::model::{Configuration, ManifestEnvironment, ProjectInput};
use crate::preloader::preload;
use crate::resolver::resolve_configuration;

#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
  pub continue_on_error: bool,
  pub dry_run: bool,
}

impl Default for ScheduleOptions {
  fn default() -> Self {
    Self { continue_on_error: false, dry_run: false }
  }
}

/// Top-level API: deploys every project to every environment and returns
/// the accumulated per-environment error lists.
pub struct Deployer {
  flags: FeatureFlags,
}

impl Deployer {
  pub fn new(flags: FeatureFlags) -> Self {
    Self { flags }
  }

  pub async fn deploy(
    &self,
    environments: Vec<(ManifestEnvironment, ClientSet)>,
    projects: &[ProjectInput],
    options: ScheduleOptions,
  ) -> HashMap<String, Vec<EngineError>> {
    let semaphore = Arc::new(Semaphore::new(self.flags.max_concurrent_environments.max(1)));
    let mut join_set = JoinSet::new();

    for (manifest_env, clients) in environments {
      let configs: Vec<Configuration> = projects
        .iter()
        .flat_map(|p| p.configurations.iter())
        .filter(|c| c.environment == manifest_env.name)
        .cloned()
        .collect();

      let semaphore = semaphore.clone();
      let flags = self.flags;
      join_set.spawn(async move {
        let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
        let name = manifest_env.name.clone();
        let errors = deploy_environment(manifest_env, configs, clients, &flags, options).await;
        (name, errors)
      });
    }

    let mut results = HashMap::new();
    while let Some(joined) = join_set.join_next().await {
      if let Ok((name, errors)) = joined {
        results.insert(name, errors);
      }
    }
    results
  }
}

async fn deploy_environment(
  manifest_env: ManifestEnvironment,
  configs: Vec<Configuration>,
  clients: ClientSet,
  flags: &FeatureFlags,
  options: ScheduleOptions,
) -> Vec<EngineError> {
  let env_details =
    EnvironmentDetails { environment: manifest_env.name.clone(), group: manifest_env.group.clone() };
  let registry = Arc::new(EntityRegistry::new());
  let errors: Arc<Mutex<Vec<EngineError>>> = Arc::new(Mutex::new(Vec::new()));
  let failed: Arc<Mutex<HashSet<Coordinate>>> = Arc::new(Mutex::new(HashSet::new()));
  let cancel = CancellationToken::new();

  let (_, build) = tokio::join!(
    preload(&manifest_env.name, &configs, &clients),
    build_environment_graph(&configs, &registry, &env_details)
  );

  let graph = match build {
    Ok(graph) => graph,
    Err(cycle_error) => return vec![cycle_error],
  };

  let components = graph.weakly_connected_components();
  let layers = match graph.topological_layers() {
    Ok(layers) => layers,
    Err(_) => {
      // `build_environment_graph` already rejects cycles before this
      // point; this only triggers on an internal inconsistency.
      return Arc::try_unwrap(errors)
        .expect("no tasks spawned yet, errors has a single owner")
        .into_inner();
    }
  };
  let layer_index: HashMap<Coordinate, usize> = layers
    .iter()
    .enumerate()
    .flat_map(|(i, layer)| layer.iter().map(move |c| (c.clone(), i)))
    .collect();

  let node_semaphore = Arc::new(Semaphore::new(flags.max_concurrent_nodes.max(1)));
  let component_semaphore = Arc::new(Semaphore::new(flags.max_concurrent_components.max(1)));
  let clients = Arc::new(clients);
  let configs_by_coordinate: Arc<HashMap<Coordinate, Configuration>> = Arc::new(
    configs.iter().map(|c| (c.coordinate.clone(), c.clone())).collect(),
  );

  let mut component_tasks = JoinSet::new();
  for component in components {
    let mut component_layers: HashMap<usize, Vec<Coordinate>> = HashMap::new();
    for coordinate in component {
      if let Some(&layer) = layer_index.get(&coordinate) {
        component_layers.entry(layer).or_default().push(coordinate);
      }
    }
    let mut ordered: Vec<(usize, Vec<Coordinate>)> = component_layers.into_iter().collect();
    ordered.sort_by_key(|(layer, _)| *layer);

    let registry = registry.clone();
    let errors = errors.clone();
    let failed = failed.clone();
    let cancel = cancel.clone();
    let node_semaphore = node_semaphore.clone();
    let component_semaphore = component_semaphore.clone();
    let clients = clients.clone();
    let configs_by_coordinate = configs_by_coordinate.clone();
    let env_details = env_details.clone();
    let flags = *flags;

    component_tasks.spawn(async move {
      let _permit = component_semaphore.acquire_owned().await.expect("semaphore closed");
      for (_, layer) in ordered {
        if cancel.is_cancelled() && !options.continue_on_error {
          break;
        }
        run_layer(
          layer,
          &configs_by_coordinate,
          &registry,
          &clients,
          &flags,
          &env_details,
          options,
          &node_semaphore,
          &errors,
          &failed,
          &cancel,
        )
        .await;
      }
    });
  }

  while component_tasks.join_next().await.is_some() {}

  Arc::try_unwrap(errors)
    .expect("every spawned task has finished and dropped its clone")
    .into_inner()
}

#[allow(clippy::too_many_arguments)]
async fn run_layer(
  layer: Vec<Coordinate>,
  configs_by_coordinate: &Arc<HashMap<Coordinate, Configuration>>,
  registry: &Arc<EntityRegistry>,
  clients: &Arc<ClientSet>,
  flags: &FeatureFlags,
  env_details: &EnvironmentDetails,
  options: ScheduleOptions,
  node_semaphore: &Arc<Semaphore>,
  errors: &Arc<Mutex<Vec<EngineError>>>,
  failed: &Arc<Mutex<HashSet<Coordinate>>>,
  cancel: &CancellationToken,
) {
  let mut node_tasks = JoinSet::new();
  for coordinate in layer {
    let Some(config) = configs_by_coordinate.get(&coordinate).cloned() else { continue };

    if cancel.is_cancelled() && !options.continue_on_error {
      continue;
    }

    let registry = registry.clone();
    let clients = clients.clone();
    let flags = *flags;
    let env_details = env_details.clone();
    let node_semaphore = node_semaphore.clone();
    let errors = errors.clone();
    let failed = failed.clone();
    let cancel = cancel.clone();

    node_tasks.spawn(async move {
      let _permit = node_semaphore.acquire_owned().await.expect("semaphore closed");

      if options.continue_on_error {
        let mut has_failed_ancestor = false;
        'refs: for param in config.parameters.values() {
          for reference in param.references() {
            if let ParameterRef::Remote { coordinate, .. } = reference {
              if failed.lock().await.contains(coordinate) {
                has_failed_ancestor = true;
                break 'refs;
              }
            }
          }
        }
        if has_failed_ancestor {
          failed.lock().await.insert(config.coordinate.clone());
          errors.lock().await.push(EngineError::ConfigDeploy {
            coordinate: config.coordinate.clone(),
            env: env_details.clone(),
            reason: "an upstream dependency failed to deploy".to_string(),
            cause: None,
          });
          return;
        }
      }

      let snapshot = RegistrySnapshot::capture(&registry).await;
      let result =
        deploy_one(&config, &snapshot, &clients, &flags, &env_details, options.dry_run).await;

      let result = match result {
        Ok(entity) => {
          let unique_name = config.kind.requires_unique_name();
          registry.put(entity, unique_name).await.map_err(|registry_error| {
            let RegistryError::DuplicateName { kind, name } = registry_error;
            EngineError::DuplicateName {
              coordinate: config.coordinate.clone(),
              env: env_details.clone(),
              kind,
              name,
            }
          })
        }
        Err(error) => Err(error),
      };

      if let Err(error) = result {
        failed.lock().await.insert(config.coordinate.clone());
        errors.lock().await.push(error);
        if !options.continue_on_error {
          cancel.cancel();
        }
      }
    });
  }
  while node_tasks.join_next().await.is_some() {}
}

async fn deploy_one(
  config: &Configuration,
  snapshot: &RegistrySnapshot,
  clients: &ClientSet,
  flags: &FeatureFlags,
  env_details: &EnvironmentDetails,
  dry_run: bool,
) -> Result<ResolvedEntity, EngineError> {
  let resolved = resolve_configuration(config, snapshot, &ProcessEnv, env_details).await?;
  let payload = parameter::render_template(&config.coordinate.to_string(), &config.template, |key| {
    resolved.get(key).cloned()
  })
  .map_err(|cause| EngineError::InvalidJson {
    coordinate: config.coordinate.clone(),
    env: env_details.clone(),
    template_path: "template".to_string(),
    cause: cause.into(),
  })?;

  if dry_run {
    let mut properties: HashMap<String, serde_json::Value> =
      resolved.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let id = format!("dry-run-{}", identity::uuid_from_coordinate(&config.coordinate));
    properties.insert("id".to_string(), serde_json::Value::String(id.clone()));
    return Ok(ResolvedEntity {
      coordinate: config.coordinate.clone(),
      id,
      name: crate::resolver::coerce_name_to_string(&resolved),
      properties,
      skip: false,
    });
  }

  dispatch(config, &resolved, &payload, clients, flags, env_details).await
}

/// Builds the per-environment dependency graph, pre-publishing skipped
/// configurations to the registry first so their skip propagates to
/// dependents.
///
/// References to a coordinate outside the environment's configuration set
/// entirely, or to one that is present but skipped, are intentionally left
/// unvalidated here — both surface as the correct `EngineError` variant
/// (`ReferencedConfigNotFound` / `ReferencedConfigSkipped`) once
/// `resolve_configuration` looks the reference up against the registry
/// snapshot, so the graph only needs to know about edges between two
/// non-skipped nodes.
async fn build_environment_graph(
  configs: &[Configuration],
  registry: &EntityRegistry,
  env_details: &EnvironmentDetails,
) -> Result<DependencyGraph, EngineError> {
  let non_skipped: HashSet<Coordinate> =
    configs.iter().filter(|c| !c.skip).map(|c| c.coordinate.clone()).collect();

  for config in configs {
    if config.skip {
      let _ = registry
        .put(
          ResolvedEntity {
            coordinate: config.coordinate.clone(),
            id: String::new(),
            name: None,
            properties: HashMap::new(),
            skip: true,
          },
          false,
        )
        .await;
    }
  }

  let mut nodes = Vec::new();
  for config in configs {
    if config.skip {
      continue;
    }
    let deps: Vec<Coordinate> = config
      .parameters
      .values()
      .flat_map(|p| p.references())
      .filter_map(|r| match r {
        ParameterRef::Remote { coordinate, .. } if non_skipped.contains(coordinate) => {
          Some(coordinate.clone())
        }
        _ => None,
      })
      .collect();
    nodes.push((config.coordinate.clone(), deps));
  }

  DependencyGraph::build(nodes).map_err(|graph_error| EngineError::ConfigDeploy {
    coordinate: configs
      .iter()
      .find(|c| !c.skip)
      .map(|c| c.coordinate.clone())
      .unwrap_or_else(|| Coordinate::new("", "", "")),
    env: env_details.clone(),
    reason: graph_error.to_string(),
    cause: None,
  })
}

#[cfg(test)]
mod tests {
  use identity::Coordinate;
  use indexmap::IndexMap;
  use parameter::Parameter;

  use super::*;
  use crate::client::mock::full_client_set;
  use crate::model::ConfigurationKind;

  fn config(
    id: &str,
    environment: &str,
    kind: ConfigurationKind,
    parameters: IndexMap<String, Parameter>,
    skip: bool,
  ) -> Configuration {
    Configuration {
      coordinate: Coordinate::new("proj", kind.name(), id),
      kind,
      group: "default".to_string(),
      environment: environment.to_string(),
      template: r#"{"name": "{{name}}"}"#.to_string(),
      parameters,
      skip,
      origin_object_id: None,
    }
  }

  fn value_params(name: &str) -> IndexMap<String, Parameter> {
    let mut p = IndexMap::new();
    p.insert("name".to_string(), Parameter::Value(serde_json::json!(name)));
    p
  }

  #[tokio::test]
  async fn deploys_independent_configurations() {
    let deployer = Deployer::new(FeatureFlags::default());
    let configs = vec![
      config("a", "prod", ConfigurationKind::Bucket, value_params("bucket-a"), false),
      config("b", "prod", ConfigurationKind::Bucket, value_params("bucket-b"), false),
    ];
    let project = ProjectInput { id: "proj".to_string(), configurations: configs, ..Default::default() };
    let environments = vec![(
      ManifestEnvironment { name: "prod".to_string(), group: "default".to_string() },
      full_client_set(),
    )];

    let results = deployer.deploy(environments, &[project], ScheduleOptions::default()).await;
    assert_eq!(results["prod"].len(), 0);
  }

  #[tokio::test]
  async fn skip_propagates_as_one_error() {
    let deployer = Deployer::new(FeatureFlags::default());
    let mut dependent_params = IndexMap::new();
    let b_coordinate = Coordinate::new("proj", "bucket", "b");
    dependent_params.insert(
      "name".to_string(),
      Parameter::Reference(ParameterRef::Remote {
        coordinate: b_coordinate.clone(),
        property: "id".to_string(),
      }),
    );

    let configs = vec![
      config("a", "prod", ConfigurationKind::Bucket, dependent_params, false),
      config("b", "prod", ConfigurationKind::Bucket, value_params("bucket-b"), true),
    ];
    let project = ProjectInput { id: "proj".to_string(), configurations: configs, ..Default::default() };
    let environments = vec![(
      ManifestEnvironment { name: "prod".to_string(), group: "default".to_string() },
      full_client_set(),
    )];

    let results = deployer.deploy(environments, &[project], ScheduleOptions::default()).await;
    assert_eq!(results["prod"].len(), 1);
    assert!(matches!(results["prod"][0], EngineError::ReferencedConfigSkipped { .. }));
  }

  #[tokio::test]
  async fn duplicate_unique_name_fails_one_configuration() {
    let deployer = Deployer::new(FeatureFlags::default());
    let make = |id: &str| {
      config(
        id,
        "prod",
        ConfigurationKind::ClassicApi {
          api_id: "host".to_string(),
          non_unique_name: false,
          deprecated: false,
        },
        value_params("same-name"),
        false,
      )
    };
    let project = ProjectInput {
      id: "proj".to_string(),
      configurations: vec![make("a"), make("b")],
      ..Default::default()
    };
    let environments = vec![(
      ManifestEnvironment { name: "prod".to_string(), group: "default".to_string() },
      full_client_set(),
    )];

    let results = deployer.deploy(environments, &[project], ScheduleOptions::default()).await;
    assert_eq!(results["prod"].len(), 1);
    assert!(matches!(results["prod"][0], EngineError::DuplicateName { .. }));
  }

  #[tokio::test]
  async fn independent_components_continue_on_error() {
    let deployer = Deployer::new(FeatureFlags::default());
    let failing = config(
      "broken",
      "prod",
      ConfigurationKind::ClassicApi {
        api_id: "host".to_string(),
        non_unique_name: false,
        deprecated: false,
      },
      IndexMap::new(),
      false,
    );
    let healthy = config("ok", "prod", ConfigurationKind::Bucket, value_params("bucket-ok"), false);
    let project = ProjectInput {
      id: "proj".to_string(),
      configurations: vec![failing, healthy],
      ..Default::default()
    };
    let environments = vec![(
      ManifestEnvironment { name: "prod".to_string(), group: "default".to_string() },
      full_client_set(),
    )];

    let options = ScheduleOptions { continue_on_error: true, dry_run: false };
    let results = deployer.deploy(environments, &[project], options).await;
    assert_eq!(results["prod"].len(), 1);
    assert!(matches!(results["prod"][0], EngineError::MissingName { .. }));
  }

  #[tokio::test]
  async fn dry_run_produces_deterministic_synthetic_id() {
    let deployer = Deployer::new(FeatureFlags::default());
    let configs =
      vec![config("a", "prod", ConfigurationKind::Bucket, value_params("bucket-a"), false)];
    let project = ProjectInput { id: "proj".to_string(), configurations: configs, ..Default::default() };
    let environments = vec![(
      ManifestEnvironment { name: "prod".to_string(), group: "default".to_string() },
      full_client_set(),
    )];

    let options = ScheduleOptions { continue_on_error: false, dry_run: true };
    let results = deployer.deploy(environments, &[project], options).await;
    assert_eq!(results["prod"].len(), 0);
  }
}
