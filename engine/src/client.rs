//! Per-environment client capabilities. Each trait models one row of
//! the capability table; a [`ClientSet`] holds whichever subset an
//! environment's transport collaborator actually implements. No capability
//! here performs real HTTP I/O — that transport is an external collaborator;
//! [`mock`] provides an in-memory reference implementation for tests.

use std::sync::Arc;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertResult {
  pub id: String,
  pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
  pub id: String,
  pub external_id: Option<String>,
  pub name: Option<String>,
}

pub type ClientResult<T> = anyhow::Result<T>;

#[async_trait]
pub trait ClassicApi: Send + Sync {
  async fn upsert_by_name(
    &self,
    api_id: &str,
    name: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;

  async fn upsert_by_name_and_id(
    &self,
    api_id: &str,
    id: &str,
    name: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;

  async fn cache(&self, api_id: &str) -> ClientResult<()>;
}

#[derive(Debug, Clone)]
pub struct SettingsUpsert {
  pub coordinate_str: String,
  pub schema_id: String,
  pub schema_version: String,
  pub scope: String,
  pub content: serde_json::Value,
  pub origin_object_id: Option<String>,
}

#[async_trait]
pub trait Settings: Send + Sync {
  async fn upsert(&self, request: SettingsUpsert) -> ClientResult<UpsertResult>;
  async fn list(
    &self,
    schema_id: &str,
    filter: &str,
  ) -> ClientResult<Vec<ListedObject>>;
  async fn cache(&self, schema_id: &str) -> ClientResult<()>;
}

#[async_trait]
pub trait Automation: Send + Sync {
  async fn upsert(
    &self,
    resource: &str,
    id: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;
}

#[async_trait]
pub trait Document: Send + Sync {
  async fn create(
    &self,
    kind: &str,
    external_id: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;
  async fn update(
    &self,
    kind: &str,
    id: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;
  async fn get(&self, kind: &str, id: &str) -> ClientResult<Option<ListedObject>>;
  async fn list(
    &self,
    kind: &str,
    filter: &str,
  ) -> ClientResult<Vec<ListedObject>>;
}

#[async_trait]
pub trait Bucket: Send + Sync {
  async fn upsert(
    &self,
    name: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;
}

#[async_trait]
pub trait Segment: Send + Sync {
  async fn get(&self, id: &str) -> ClientResult<Option<ListedObject>>;
  async fn list(&self, filter: &str) -> ClientResult<Vec<ListedObject>>;
  async fn create(&self, payload: &serde_json::Value) -> ClientResult<UpsertResult>;
  async fn update(
    &self,
    id: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;
  async fn delete(&self, id: &str) -> ClientResult<()>;
}

#[async_trait]
pub trait Slo: Send + Sync {
  async fn get(&self, id: &str) -> ClientResult<Option<ListedObject>>;
  async fn list(&self, filter: &str) -> ClientResult<Vec<ListedObject>>;
  async fn create(&self, payload: &serde_json::Value) -> ClientResult<UpsertResult>;
  async fn update(
    &self,
    id: &str,
    payload: &serde_json::Value,
  ) -> ClientResult<UpsertResult>;
  async fn delete(&self, id: &str) -> ClientResult<()>;
}

/// One environment's capability bundle. Any field may be absent;
/// dispatching a configuration whose kind needs a missing capability
/// yields `EngineError::UnknownKind`.
#[derive(Clone, Default)]
pub struct ClientSet {
  pub classic_api: Option<Arc<dyn ClassicApi>>,
  pub settings: Option<Arc<dyn Settings>>,
  pub automation: Option<Arc<dyn Automation>>,
  pub document: Option<Arc<dyn Document>>,
  pub bucket: Option<Arc<dyn Bucket>>,
  pub segment: Option<Arc<dyn Segment>>,
  pub slo: Option<Arc<dyn Slo>>,
}

pub mod mock {
  //! In-memory reference implementations used by the engine's own test
  //! suite. Not a transport; every call is synchronous-fast and never
  //! suspends on real I/O.

  use std::collections::HashMap;
  use std::sync::atomic::{AtomicU64, Ordering};
  use std::sync::Mutex;

  use super::*;

  #[derive(Default)]
  pub struct MockClassicApi {
    next_id: AtomicU64,
    pub upserts: Mutex<Vec<(String, String)>>,
  }

  #[async_trait]
  impl ClassicApi for MockClassicApi {
    async fn upsert_by_name(
      &self,
      api_id: &str,
      name: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      self.upserts.lock().unwrap().push((api_id.to_string(), name.to_string()));
      let id = self.next_id.fetch_add(1, Ordering::SeqCst);
      Ok(UpsertResult { id: id.to_string(), name: Some(name.to_string()) })
    }

    async fn upsert_by_name_and_id(
      &self,
      api_id: &str,
      id: &str,
      name: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      self.upserts.lock().unwrap().push((api_id.to_string(), name.to_string()));
      Ok(UpsertResult { id: id.to_string(), name: Some(name.to_string()) })
    }

    async fn cache(&self, _api_id: &str) -> ClientResult<()> {
      Ok(())
    }
  }

  #[derive(Default)]
  pub struct MockSettings {
    next_id: AtomicU64,
  }

  #[async_trait]
  impl Settings for MockSettings {
    async fn upsert(&self, request: SettingsUpsert) -> ClientResult<UpsertResult> {
      let id = request.origin_object_id.unwrap_or_else(|| {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
      });
      Ok(UpsertResult { id, name: None })
    }

    async fn list(
      &self,
      _schema_id: &str,
      _filter: &str,
    ) -> ClientResult<Vec<ListedObject>> {
      Ok(vec![])
    }

    async fn cache(&self, _schema_id: &str) -> ClientResult<()> {
      Ok(())
    }
  }

  #[derive(Default)]
  pub struct MockAutomation {
    next_id: AtomicU64,
  }

  #[async_trait]
  impl Automation for MockAutomation {
    async fn upsert(
      &self,
      _resource: &str,
      id: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      let _ = self.next_id.fetch_add(1, Ordering::SeqCst);
      Ok(UpsertResult { id: id.to_string(), name: None })
    }
  }

  #[derive(Default)]
  pub struct MockDocument {
    by_external_id: Mutex<HashMap<String, ListedObject>>,
    next_id: AtomicU64,
  }

  #[async_trait]
  impl Document for MockDocument {
    async fn create(
      &self,
      _kind: &str,
      external_id: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
      self.by_external_id.lock().unwrap().insert(
        external_id.to_string(),
        ListedObject {
          id: id.clone(),
          external_id: Some(external_id.to_string()),
          name: None,
        },
      );
      Ok(UpsertResult { id, name: None })
    }

    async fn update(
      &self,
      _kind: &str,
      id: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      Ok(UpsertResult { id: id.to_string(), name: None })
    }

    async fn get(
      &self,
      _kind: &str,
      id: &str,
    ) -> ClientResult<Option<ListedObject>> {
      Ok(
        self
          .by_external_id
          .lock()
          .unwrap()
          .values()
          .find(|o| o.id == id)
          .cloned(),
      )
    }

    async fn list(
      &self,
      _kind: &str,
      filter: &str,
    ) -> ClientResult<Vec<ListedObject>> {
      Ok(
        self
          .by_external_id
          .lock()
          .unwrap()
          .get(filter)
          .cloned()
          .into_iter()
          .collect(),
      )
    }
  }

  #[derive(Default)]
  pub struct MockBucket {
    next_id: AtomicU64,
  }

  #[async_trait]
  impl Bucket for MockBucket {
    async fn upsert(
      &self,
      name: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      let _ = self.next_id.fetch_add(1, Ordering::SeqCst);
      Ok(UpsertResult { id: name.to_string(), name: Some(name.to_string()) })
    }
  }

  #[derive(Default)]
  pub struct MockSegment {
    by_id: Mutex<HashMap<String, ListedObject>>,
    next_id: AtomicU64,
  }

  #[async_trait]
  impl Segment for MockSegment {
    async fn get(&self, id: &str) -> ClientResult<Option<ListedObject>> {
      Ok(self.by_id.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, filter: &str) -> ClientResult<Vec<ListedObject>> {
      Ok(self.by_id.lock().unwrap().get(filter).cloned().into_iter().collect())
    }

    async fn create(
      &self,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
      self.by_id.lock().unwrap().insert(
        id.clone(),
        ListedObject { id: id.clone(), external_id: None, name: None },
      );
      Ok(UpsertResult { id, name: None })
    }

    async fn update(
      &self,
      id: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      Ok(UpsertResult { id: id.to_string(), name: None })
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
      self.by_id.lock().unwrap().remove(id);
      Ok(())
    }
  }

  #[derive(Default)]
  pub struct MockSlo {
    by_id: Mutex<HashMap<String, ListedObject>>,
    next_id: AtomicU64,
  }

  #[async_trait]
  impl Slo for MockSlo {
    async fn get(&self, id: &str) -> ClientResult<Option<ListedObject>> {
      Ok(self.by_id.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, filter: &str) -> ClientResult<Vec<ListedObject>> {
      Ok(self.by_id.lock().unwrap().get(filter).cloned().into_iter().collect())
    }

    async fn create(
      &self,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
      self.by_id.lock().unwrap().insert(
        id.clone(),
        ListedObject { id: id.clone(), external_id: None, name: None },
      );
      Ok(UpsertResult { id, name: None })
    }

    async fn update(
      &self,
      id: &str,
      _payload: &serde_json::Value,
    ) -> ClientResult<UpsertResult> {
      Ok(UpsertResult { id: id.to_string(), name: None })
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
      self.by_id.lock().unwrap().remove(id);
      Ok(())
    }
  }

  /// Builds a `ClientSet` with every capability backed by a fresh mock.
  pub fn full_client_set() -> ClientSet {
    ClientSet {
      classic_api: Some(Arc::new(MockClassicApi::default())),
      settings: Some(Arc::new(MockSettings::default())),
      automation: Some(Arc::new(MockAutomation::default())),
      document: Some(Arc::new(MockDocument::default())),
      bucket: Some(Arc::new(MockBucket::default())),
      segment: Some(Arc::new(MockSegment::default())),
      slo: Some(Arc::new(MockSlo::default())),
    }
  }
}
