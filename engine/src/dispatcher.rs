//! Per-kind upsert adapters. Each adapter consumes the resolved
//! properties and rendered payload for one configuration and produces a
//! [`ResolvedEntity`], dispatching through whichever [`ClientSet`]
//! capability its kind requires.

use std::collections::HashMap;

use config::FeatureFlags;
use identity::{bucket_name, decode_numeric_id, generic_external_id, uuid_from_coordinate, uuid_from_string};
use indexmap::IndexMap;
use registry::ResolvedEntity;

use crate::client::{ClientSet, SettingsUpsert};
use crate::error::{EngineError, EnvironmentDetails};
use crate::model::{Configuration, ConfigurationKind};

fn properties_map(
  resolved: &IndexMap<String, serde_json::Value>,
) -> HashMap<String, serde_json::Value> {
  resolved.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn string_property(
  resolved: &IndexMap<String, serde_json::Value>,
  key: &str,
) -> Option<String> {
  match resolved.get(key) {
    Some(serde_json::Value::String(s)) => Some(s.clone()),
    Some(other) => Some(other.to_string()),
    None => None,
  }
}

pub async fn dispatch(
  config: &Configuration,
  resolved: &IndexMap<String, serde_json::Value>,
  payload: &serde_json::Value,
  clients: &ClientSet,
  flags: &FeatureFlags,
  env: &EnvironmentDetails,
) -> Result<ResolvedEntity, EngineError> {
  match &config.kind {
    ConfigurationKind::ClassicApi { api_id, non_unique_name, deprecated } => {
      dispatch_classic_api(
        config,
        resolved,
        payload,
        clients,
        env,
        api_id,
        *non_unique_name,
        *deprecated,
      )
      .await
    }
    ConfigurationKind::Settings { schema_id, schema_version } => {
      dispatch_settings(config, resolved, payload, clients, flags, env, schema_id, schema_version)
        .await
    }
    ConfigurationKind::Automation { resource } => {
      dispatch_automation(config, resolved, payload, clients, env, *resource).await
    }
    ConfigurationKind::Document { .. } => {
      dispatch_document(config, resolved, payload, clients, env).await
    }
    ConfigurationKind::Bucket => {
      dispatch_bucket(config, resolved, payload, clients, flags, env).await
    }
    ConfigurationKind::Segment | ConfigurationKind::OpenPipeline { .. } => {
      if let ConfigurationKind::Segment = &config.kind {
        if !flags.segments_enabled {
          return Err(EngineError::UnknownKind {
            coordinate: config.coordinate.clone(),
            env: env.clone(),
            kind: config.kind.name().to_string(),
          });
        }
      }
      dispatch_segment_like(config, resolved, payload, clients, env).await
    }
  }
}

async fn dispatch_classic_api(
  config: &Configuration,
  resolved: &IndexMap<String, serde_json::Value>,
  payload: &serde_json::Value,
  clients: &ClientSet,
  env: &EnvironmentDetails,
  api_id: &str,
  non_unique_name: bool,
  deprecated: bool,
) -> Result<ResolvedEntity, EngineError> {
  let Some(client) = &clients.classic_api else {
    return Err(EngineError::UnknownKind {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      kind: config.kind.name().to_string(),
    });
  };

  let Some(name) = string_property(resolved, "name") else {
    return Err(EngineError::MissingName {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
    });
  };

  if deprecated {
    tracing::warn!(coordinate = %config.coordinate, api_id, "classic api marked deprecated");
  }

  let result = if non_unique_name {
    let id = stable_entity_id(config);
    client
      .upsert_by_name_and_id(api_id, &id, &name, payload)
      .await
      .map_err(|cause| deploy_error(config, env, cause))?
  } else {
    client
      .upsert_by_name(api_id, &name, payload)
      .await
      .map_err(|cause| deploy_error(config, env, cause))?
  };

  Ok(finish(config, properties_map(resolved), result.id, result.name.or(Some(name))))
}

/// `id` to use when a kind's uniqueness is enforced by name *and* id
/// together: the declared `configId` when it already looks like a stable
/// identifier, else a UUID derived from `project/configId` (deliberately
/// excludes `kind`, unlike `uuid_from_coordinate`, to match the fallback
/// identity other tooling in this ecosystem derives for these resources).
fn stable_entity_id(config: &Configuration) -> String {
  let config_id = &config.coordinate.config_id;
  let looks_like_uuid = uuid::Uuid::parse_str(config_id).is_ok();
  let looks_like_me_id = identity::is_me_id(config_id);
  if looks_like_uuid || looks_like_me_id {
    config_id.clone()
  } else {
    uuid_from_string(&format!("{}/{}", config.coordinate.project, config_id)).to_string()
  }
}

async fn dispatch_settings(
  config: &Configuration,
  resolved: &IndexMap<String, serde_json::Value>,
  payload: &serde_json::Value,
  clients: &ClientSet,
  flags: &FeatureFlags,
  env: &EnvironmentDetails,
  schema_id: &str,
  schema_version: &str,
) -> Result<ResolvedEntity, EngineError> {
  let Some(client) = &clients.settings else {
    return Err(EngineError::UnknownKind {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      kind: config.kind.name().to_string(),
    });
  };

  let Some(scope) = string_property(resolved, "scope") else {
    return Err(EngineError::MissingScope {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
    });
  };

  let request = SettingsUpsert {
    coordinate_str: config.coordinate.to_string(),
    schema_id: schema_id.to_string(),
    schema_version: schema_version.to_string(),
    scope,
    content: payload.clone(),
    origin_object_id: config.origin_object_id.clone(),
  };

  let result =
    client.upsert(request).await.map_err(|cause| deploy_error(config, env, cause))?;

  let id = if schema_id == "builtin:management-zones" && flags.management_zone_numeric_ids {
    decode_numeric_id(&result.id)
      .map(|n| n.to_string())
      .unwrap_or(result.id.clone())
  } else {
    result.id.clone()
  };

  let name = result.name.unwrap_or_else(|| format!("[UNKNOWN NAME]{id}"));
  Ok(finish(config, properties_map(resolved), id, Some(name)))
}

async fn dispatch_automation(
  config: &Configuration,
  resolved: &IndexMap<String, serde_json::Value>,
  payload: &serde_json::Value,
  clients: &ClientSet,
  env: &EnvironmentDetails,
  resource: crate::model::AutomationResource,
) -> Result<ResolvedEntity, EngineError> {
  let Some(client) = &clients.automation else {
    return Err(EngineError::UnknownKind {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      kind: config.kind.name().to_string(),
    });
  };

  let id = config
    .origin_object_id
    .clone()
    .unwrap_or_else(|| uuid_from_coordinate(&config.coordinate).to_string());

  let resource_str = match resource {
    crate::model::AutomationResource::Workflow => "workflow",
    crate::model::AutomationResource::BusinessCalendar => "business-calendar",
    crate::model::AutomationResource::SchedulingRule => "scheduling-rule",
  };

  let result = client
    .upsert(resource_str, &id, payload)
    .await
    .map_err(|cause| deploy_error(config, env, cause))?;

  Ok(finish(config, properties_map(resolved), result.id, result.name))
}

async fn dispatch_document(
  config: &Configuration,
  resolved: &IndexMap<String, serde_json::Value>,
  payload: &serde_json::Value,
  clients: &ClientSet,
  env: &EnvironmentDetails,
) -> Result<ResolvedEntity, EngineError> {
  let Some(client) = &clients.document else {
    return Err(EngineError::UnknownKind {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      kind: config.kind.name().to_string(),
    });
  };

  let kind_str = config.kind.name();
  let external_id = generic_external_id(&config.coordinate);

  if let Some(origin_id) = &config.origin_object_id {
    if let Some(_existing) =
      client.get(kind_str, origin_id).await.map_err(|cause| deploy_error(config, env, cause))?
    {
      let result = client
        .update(kind_str, origin_id, payload)
        .await
        .map_err(|cause| deploy_error(config, env, cause))?;
      return Ok(finish(config, properties_map(resolved), result.id, result.name));
    }
  }

  let matches = client
    .list(kind_str, &external_id)
    .await
    .map_err(|cause| deploy_error(config, env, cause))?;

  match matches.len() {
    0 => {
      let result = client
        .create(kind_str, &external_id, payload)
        .await
        .map_err(|cause| deploy_error(config, env, cause))?;
      Ok(finish(config, properties_map(resolved), result.id, result.name))
    }
    1 => {
      let existing = &matches[0];
      let result = client
        .update(kind_str, &existing.id, payload)
        .await
        .map_err(|cause| deploy_error(config, env, cause))?;
      Ok(finish(config, properties_map(resolved), result.id, result.name))
    }
    _ => Err(EngineError::ConfigDeploy {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      reason: format!("{} documents share external id {external_id:?}", matches.len()),
      cause: None,
    }),
  }
}

async fn dispatch_bucket(
  config: &Configuration,
  resolved: &IndexMap<String, serde_json::Value>,
  payload: &serde_json::Value,
  clients: &ClientSet,
  flags: &FeatureFlags,
  env: &EnvironmentDetails,
) -> Result<ResolvedEntity, EngineError> {
  let Some(client) = &clients.bucket else {
    return Err(EngineError::UnknownKind {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      kind: config.kind.name().to_string(),
    });
  };

  let name = bucket_name(&config.coordinate, flags.sanitize_bucket_names);
  let result =
    client.upsert(&name, payload).await.map_err(|cause| deploy_error(config, env, cause))?;
  Ok(finish(config, properties_map(resolved), result.id, result.name.or(Some(name))))
}

async fn dispatch_segment_like(
  config: &Configuration,
  resolved: &IndexMap<String, serde_json::Value>,
  payload: &serde_json::Value,
  clients: &ClientSet,
  env: &EnvironmentDetails,
) -> Result<ResolvedEntity, EngineError> {
  let Some(client) = &clients.segment else {
    return Err(EngineError::UnknownKind {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      kind: config.kind.name().to_string(),
    });
  };

  if let Some(origin_id) = &config.origin_object_id {
    if let Some(_existing) =
      client.get(origin_id).await.map_err(|cause| deploy_error(config, env, cause))?
    {
      let result = client
        .update(origin_id, payload)
        .await
        .map_err(|cause| deploy_error(config, env, cause))?;
      return Ok(finish(config, properties_map(resolved), result.id, result.name));
    }
  }

  let external_id = generic_external_id(&config.coordinate);
  let matches =
    client.list(&external_id).await.map_err(|cause| deploy_error(config, env, cause))?;

  match matches.len() {
    0 => {
      let result = client
        .create(payload)
        .await
        .map_err(|cause| deploy_error(config, env, cause))?;
      Ok(finish(config, properties_map(resolved), result.id, result.name))
    }
    1 => {
      let existing = &matches[0];
      let result = client
        .update(&existing.id, payload)
        .await
        .map_err(|cause| deploy_error(config, env, cause))?;
      Ok(finish(config, properties_map(resolved), result.id, result.name))
    }
    _ => Err(EngineError::ConfigDeploy {
      coordinate: config.coordinate.clone(),
      env: env.clone(),
      reason: format!("{} segments share external id {external_id:?}", matches.len()),
      cause: None,
    }),
  }
}

fn deploy_error(
  config: &Configuration,
  env: &EnvironmentDetails,
  cause: anyhow::Error,
) -> EngineError {
  EngineError::ConfigDeploy {
    coordinate: config.coordinate.clone(),
    env: env.clone(),
    reason: cause.to_string(),
    cause: Some(cause),
  }
}

fn finish(
  config: &Configuration,
  mut properties: HashMap<String, serde_json::Value>,
  id: String,
  name: Option<String>,
) -> ResolvedEntity {
  properties.insert("id".to_string(), serde_json::Value::String(id.clone()));
  if let Some(name) = &name {
    properties.insert("name".to_string(), serde_json::Value::String(name.clone()));
  }
  ResolvedEntity {
    coordinate: config.coordinate.clone(),
    id,
    name,
    properties,
    skip: false,
  }
}
