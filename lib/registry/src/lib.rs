//! Thread-safe registry of already-deployed entities for one environment.
//! Populated as the scheduler finishes each configuration, and consulted
//! by later parameters that reference an earlier configuration's
//! tenant-assigned id or properties.

use std::collections::{HashMap, HashSet};

use identity::Coordinate;
use parameter::EntityLookup;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
  pub coordinate: Coordinate,
  /// Tenant-assigned identifier (classic API id, Settings object id,
  /// document id, ...).
  pub id: String,
  /// Name used to enforce per-kind uniqueness, when the kind has one.
  pub name: Option<String>,
  /// Every property another configuration's reference may resolve
  /// against, keyed by property name.
  pub properties: HashMap<String, serde_json::Value>,
  /// True when this configuration's deployment was skipped rather than
  /// applied (e.g. because an upstream dependency failed under
  /// `continue_on_error`).
  pub skip: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
  #[error("{kind:?} already has a configuration named {name:?}")]
  DuplicateName { kind: String, name: String },
}

/// Per-environment store of resolved entities, keyed by [`Coordinate`].
#[derive(Default)]
pub struct EntityRegistry {
  entities: RwLock<HashMap<Coordinate, ResolvedEntity>>,
  names_by_kind: RwLock<HashMap<String, HashSet<String>>>,
}

impl EntityRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `entity`. When `enforce_unique_name` is set and another
  /// configuration of the same kind already claimed `entity.name`, the
  /// entity is rejected and left unregistered; callers pass this for
  /// kinds whose uniqueness constraint covers the name (not every kind
  /// has one).
  pub async fn put(
    &self,
    entity: ResolvedEntity,
    enforce_unique_name: bool,
  ) -> Result<(), RegistryError> {
    if enforce_unique_name {
      if let Some(name) = &entity.name {
        let mut names = self.names_by_kind.write().await;
        let claimed = names.entry(entity.coordinate.kind.clone()).or_default();
        if !claimed.insert(name.clone()) {
          return Err(RegistryError::DuplicateName {
            kind: entity.coordinate.kind.clone(),
            name: name.clone(),
          });
        }
      }
    }

    self.entities.write().await.insert(entity.coordinate.clone(), entity);
    Ok(())
  }

  pub async fn get(&self, coordinate: &Coordinate) -> Option<ResolvedEntity> {
    self.entities.read().await.get(coordinate).cloned()
  }

  pub async fn is_known_name(&self, kind: &str, name: &str) -> bool {
    self
      .names_by_kind
      .read()
      .await
      .get(kind)
      .is_some_and(|names| names.contains(name))
  }

  pub async fn len(&self) -> usize {
    self.entities.read().await.len()
  }
}

/// Synchronous snapshot-based lookup used by parameter resolution, which
/// runs after every upstream dependency in the same layer has already
/// been registered and does not need to await the registry lock.
pub struct RegistrySnapshot(HashMap<Coordinate, ResolvedEntity>);

impl RegistrySnapshot {
  pub async fn capture(registry: &EntityRegistry) -> Self {
    Self(registry.entities.read().await.clone())
  }

  pub fn lookup_entity(&self, coordinate: &Coordinate) -> Option<&ResolvedEntity> {
    self.0.get(coordinate)
  }
}

impl EntityLookup for RegistrySnapshot {
  fn lookup(
    &self,
    coordinate: &Coordinate,
    property: &str,
  ) -> Option<serde_json::Value> {
    self.0.get(coordinate)?.properties.get(property).cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entity(coordinate: Coordinate, name: Option<&str>) -> ResolvedEntity {
    ResolvedEntity {
      coordinate,
      id: "id-1".to_string(),
      name: name.map(str::to_string),
      properties: HashMap::new(),
      skip: false,
    }
  }

  #[tokio::test]
  async fn put_then_get_round_trips() {
    let registry = EntityRegistry::new();
    let coordinate = Coordinate::new("proj", "dashboard", "d1");
    registry.put(entity(coordinate.clone(), Some("My Dashboard")), true).await.unwrap();

    let stored = registry.get(&coordinate).await.unwrap();
    assert_eq!(stored.id, "id-1");
  }

  #[tokio::test]
  async fn rejects_duplicate_name_within_kind() {
    let registry = EntityRegistry::new();
    let c1 = Coordinate::new("proj", "dashboard", "d1");
    let c2 = Coordinate::new("proj", "dashboard", "d2");
    registry.put(entity(c1, Some("shared")), true).await.unwrap();

    let err = registry.put(entity(c2, Some("shared")), true).await.unwrap_err();
    assert_eq!(
      err,
      RegistryError::DuplicateName {
        kind: "dashboard".to_string(),
        name: "shared".to_string(),
      }
    );
  }

  #[tokio::test]
  async fn allows_same_name_across_different_kinds() {
    let registry = EntityRegistry::new();
    let c1 = Coordinate::new("proj", "dashboard", "d1");
    let c2 = Coordinate::new("proj", "workflow", "w1");
    registry.put(entity(c1, Some("shared")), true).await.unwrap();
    registry.put(entity(c2, Some("shared")), true).await.unwrap();
  }

  #[tokio::test]
  async fn duplicate_names_allowed_when_not_enforced() {
    let registry = EntityRegistry::new();
    let c1 = Coordinate::new("proj", "bucket", "b1");
    let c2 = Coordinate::new("proj", "bucket", "b2");
    registry.put(entity(c1, Some("shared")), false).await.unwrap();
    registry.put(entity(c2, Some("shared")), false).await.unwrap();
  }

  #[tokio::test]
  async fn snapshot_implements_entity_lookup() {
    let registry = EntityRegistry::new();
    let coordinate = Coordinate::new("proj", "workflow", "w1");
    let mut e = entity(coordinate.clone(), None);
    e.properties.insert("id".to_string(), serde_json::json!("abc"));
    registry.put(e, true).await.unwrap();

    let snapshot = RegistrySnapshot::capture(&registry).await;
    assert_eq!(
      snapshot.lookup(&coordinate, "id"),
      Some(serde_json::json!("abc"))
    );
    assert_eq!(snapshot.lookup(&coordinate, "missing"), None);
  }
}
