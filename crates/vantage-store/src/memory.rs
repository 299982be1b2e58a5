//! In-memory resource store.
//!
//! Map-backed twin of the Kubernetes store, used by the gateway tests
//! and local development. Sources, applications, and namespaces are
//! seeded through the `put_*` methods, standing in for cluster
//! discovery; destinations and actions go through the normal
//! `ResourceStore` lifecycle.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::store::{ResourceStore, generate_id};
use crate::types::*;

#[derive(Default)]
struct Inner {
    /// namespace name → selected flag
    namespaces: BTreeMap<String, bool>,
    /// "{namespace}/{kind}/{name}" → source
    sources: BTreeMap<String, Source>,
    /// namespace name → discovered applications
    applications: BTreeMap<String, Vec<Application>>,
    /// "{namespace}/{id}" → destination
    destinations: BTreeMap<String, Destination>,
    /// "{namespace}/{id}" → action
    actions: BTreeMap<String, AddClusterInfo>,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn scoped_key(namespace: &str, id: &str) -> String {
    format!("{namespace}/{id}")
}

fn scoped_prefix(namespace: &str) -> String {
    format!("{namespace}/")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a namespace with its selection state.
    pub async fn put_namespace(&self, name: &str, selected: bool) {
        self.inner
            .write()
            .await
            .namespaces
            .insert(name.to_string(), selected);
    }

    /// Seed a discovered source.
    pub async fn put_source(&self, source: Source) {
        let key = source.key().table_key();
        self.inner.write().await.sources.insert(key, source);
    }

    /// Seed a discovered application.
    pub async fn put_application(&self, namespace: &str, app: Application) {
        self.inner
            .write()
            .await
            .applications
            .entry(namespace.to_string())
            .or_default()
            .push(app);
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn list_namespaces(&self) -> StoreResult<Vec<NamespaceInfo>> {
        let inner = self.inner.read().await;
        Ok(inner
            .namespaces
            .iter()
            .map(|(name, selected)| NamespaceInfo {
                name: name.clone(),
                selected: *selected,
            })
            .collect())
    }

    async fn persist_namespaces(&self, selections: &[NamespaceSelection]) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        for sel in selections {
            inner.namespaces.insert(sel.name.clone(), sel.selected);
        }
        Ok(())
    }

    async fn list_sources(&self) -> StoreResult<Vec<Source>> {
        let inner = self.inner.read().await;
        Ok(inner.sources.values().cloned().collect())
    }

    async fn get_source(&self, key: &SourceKey) -> StoreResult<Option<Source>> {
        let inner = self.inner.read().await;
        Ok(inner.sources.get(&key.table_key()).cloned())
    }

    async fn patch_source(
        &self,
        key: &SourceKey,
        patch: &SourcePatch,
    ) -> StoreResult<Option<Source>> {
        let mut inner = self.inner.write().await;
        let Some(source) = inner.sources.get_mut(&key.table_key()) else {
            return Ok(None);
        };
        if let Some(reported_name) = &patch.reported_name {
            source.reported_name = Some(reported_name.clone());
        }
        if let Some(instrumented) = patch.instrumented {
            source.instrumented = instrumented;
        }
        Ok(Some(source.clone()))
    }

    async fn delete_source(&self, key: &SourceKey) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.sources.remove(&key.table_key()).is_some())
    }

    async fn list_applications(&self, namespace: &str) -> StoreResult<Vec<Application>> {
        let inner = self.inner.read().await;
        Ok(inner.applications.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_destinations(&self, namespace: &str) -> StoreResult<Vec<Destination>> {
        let prefix = scoped_prefix(namespace);
        let inner = self.inner.read().await;
        Ok(inner
            .destinations
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn get_destination(
        &self,
        namespace: &str,
        id: &str,
    ) -> StoreResult<Option<Destination>> {
        let inner = self.inner.read().await;
        Ok(inner.destinations.get(&scoped_key(namespace, id)).cloned())
    }

    async fn create_destination(
        &self,
        namespace: &str,
        req: DestinationRequest,
    ) -> StoreResult<Destination> {
        let id = generate_id("dest");
        let dest = req.into_destination(id.clone());
        let mut inner = self.inner.write().await;
        inner
            .destinations
            .insert(scoped_key(namespace, &id), dest.clone());
        Ok(dest)
    }

    async fn update_destination(
        &self,
        namespace: &str,
        id: &str,
        req: DestinationRequest,
    ) -> StoreResult<Option<Destination>> {
        let key = scoped_key(namespace, id);
        let mut inner = self.inner.write().await;
        if !inner.destinations.contains_key(&key) {
            return Ok(None);
        }
        let dest = req.into_destination(id.to_string());
        inner.destinations.insert(key, dest.clone());
        Ok(Some(dest))
    }

    async fn delete_destination(&self, namespace: &str, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .destinations
            .remove(&scoped_key(namespace, id))
            .is_some())
    }

    async fn list_cluster_info_actions(
        &self,
        namespace: &str,
    ) -> StoreResult<Vec<AddClusterInfo>> {
        let prefix = scoped_prefix(namespace);
        let inner = self.inner.read().await;
        Ok(inner
            .actions
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn get_cluster_info_action(
        &self,
        namespace: &str,
        id: &str,
    ) -> StoreResult<Option<AddClusterInfo>> {
        let inner = self.inner.read().await;
        Ok(inner.actions.get(&scoped_key(namespace, id)).cloned())
    }

    async fn create_cluster_info_action(
        &self,
        namespace: &str,
        req: AddClusterInfoRequest,
    ) -> StoreResult<AddClusterInfo> {
        let id = generate_id("aci");
        let action = req.into_action(id.clone());
        let mut inner = self.inner.write().await;
        inner
            .actions
            .insert(scoped_key(namespace, &id), action.clone());
        Ok(action)
    }

    async fn update_cluster_info_action(
        &self,
        namespace: &str,
        id: &str,
        req: AddClusterInfoRequest,
    ) -> StoreResult<Option<AddClusterInfo>> {
        let key = scoped_key(namespace, id);
        let mut inner = self.inner.write().await;
        if !inner.actions.contains_key(&key) {
            return Ok(None);
        }
        let action = req.into_action(id.to_string());
        inner.actions.insert(key, action.clone());
        Ok(Some(action))
    }

    async fn delete_cluster_info_action(&self, namespace: &str, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.actions.remove(&scoped_key(namespace, id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_source(ns: &str, name: &str) -> Source {
        Source {
            namespace: ns.to_string(),
            kind: WorkloadKind::Deployment,
            name: name.to_string(),
            reported_name: None,
            instrumented: true,
        }
    }

    fn sample_destination_request(name: &str) -> DestinationRequest {
        DestinationRequest {
            name: name.to_string(),
            destination_type: "jaeger".to_string(),
            signals: ExportedSignals {
                traces: true,
                ..Default::default()
            },
            fields: HashMap::from([("endpoint".to_string(), "jaeger:4317".to_string())]),
        }
    }

    #[tokio::test]
    async fn namespaces_persist_and_list() {
        let store = MemoryStore::new();
        store.put_namespace("default", false).await;

        store
            .persist_namespaces(&[NamespaceSelection {
                name: "default".to_string(),
                selected: true,
            }])
            .await
            .unwrap();

        let namespaces = store.list_namespaces().await.unwrap();
        assert_eq!(namespaces.len(), 1);
        assert!(namespaces[0].selected);
    }

    #[tokio::test]
    async fn patch_source_touches_only_the_addressed_source() {
        let store = MemoryStore::new();
        store.put_source(sample_source("ns1", "app1")).await;
        store.put_source(sample_source("ns2", "app1")).await;

        let key = SourceKey::new("ns1", WorkloadKind::Deployment, "app1");
        let patch = SourcePatch {
            reported_name: Some("checkout".to_string()),
            instrumented: None,
        };
        let updated = store.patch_source(&key, &patch).await.unwrap().unwrap();
        assert_eq!(updated.reported_name.as_deref(), Some("checkout"));

        let other = SourceKey::new("ns2", WorkloadKind::Deployment, "app1");
        let untouched = store.get_source(&other).await.unwrap().unwrap();
        assert_eq!(untouched.reported_name, None);
    }

    #[tokio::test]
    async fn delete_source_reports_existence() {
        let store = MemoryStore::new();
        store.put_source(sample_source("ns1", "app1")).await;

        let key = SourceKey::new("ns1", WorkloadKind::Deployment, "app1");
        assert!(store.delete_source(&key).await.unwrap());
        assert!(!store.delete_source(&key).await.unwrap());
        assert!(store.get_source(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn destination_lifecycle() {
        let store = MemoryStore::new();

        let created = store
            .create_destination("vantage-system", sample_destination_request("prod traces"))
            .await
            .unwrap();
        assert!(created.id.starts_with("dest-"));

        let fetched = store
            .get_destination("vantage-system", &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);

        let update = DestinationRequest {
            name: "prod traces v2".to_string(),
            ..sample_destination_request("ignored")
        };
        let updated = store
            .update_destination("vantage-system", &created.id, update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "prod traces v2");
        assert_eq!(updated.id, created.id);

        assert!(
            store
                .delete_destination("vantage-system", &created.id)
                .await
                .unwrap()
        );
        assert!(
            store
                .get_destination("vantage-system", &created.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn destinations_are_namespace_scoped() {
        let store = MemoryStore::new();
        store
            .create_destination("ns-a", sample_destination_request("a"))
            .await
            .unwrap();
        store
            .create_destination("ns-b", sample_destination_request("b"))
            .await
            .unwrap();

        let in_a = store.list_destinations("ns-a").await.unwrap();
        assert_eq!(in_a.len(), 1);
        assert_eq!(in_a[0].name, "a");
    }

    #[tokio::test]
    async fn update_missing_action_is_none() {
        let store = MemoryStore::new();
        let req = AddClusterInfoRequest {
            action_name: None,
            notes: None,
            signals: vec![Signal::Traces],
            disabled: false,
            cluster_attributes: vec![],
        };
        let updated = store
            .update_cluster_info_action("vantage-system", "aci-missing", req)
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
