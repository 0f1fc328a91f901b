//! Best-effort cache warm-up. Runs concurrently with graph
//! construction; failures are logged and otherwise ignored, they never
//! block deployment.

use std::collections::HashSet;

use crate::client::ClientSet;
use crate::model::{Configuration, ConfigurationKind};

pub async fn preload(environment: &str, configs: &[Configuration], clients: &ClientSet) {
  let mut api_ids = HashSet::new();
  let mut schema_ids = HashSet::new();

  for config in configs {
    if config.skip {
      continue;
    }
    match &config.kind {
      ConfigurationKind::ClassicApi { api_id, .. } => {
        api_ids.insert(api_id.clone());
      }
      ConfigurationKind::Settings { schema_id, .. } => {
        schema_ids.insert(schema_id.clone());
      }
      _ => {}
    }
  }

  if let Some(client) = &clients.classic_api {
    for api_id in &api_ids {
      if let Err(error) = client.cache(api_id).await {
        tracing::warn!(environment, api_id, %error, "classic api preload failed");
      }
    }
  }

  if let Some(client) = &clients.settings {
    for schema_id in &schema_ids {
      if let Err(error) = client.cache(schema_id).await {
        tracing::warn!(environment, schema_id, %error, "settings preload failed");
      }
    }
  }
}
