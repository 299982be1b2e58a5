//! Kubernetes-backed resource store.
//!
//! Sources and applications are apps/v1 workloads; a workload becomes a
//! managed source when it carries the instrumentation label. Namespace
//! selection lives in namespace labels. Destinations and actions are
//! namespaced custom resources in the `vantage.dev` group.
//!
//! The store holds a single `kube::Client`; cloning the store clones
//! the client handle, which is safe to share across request tasks.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, CustomResource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{ResourceStore, generate_id};
use crate::types::*;

/// Label marking a workload or namespace as managed. Value is
/// "enabled" or "disabled".
pub const INSTRUMENT_LABEL: &str = "vantage.dev/instrument";

/// Annotation carrying a source's overridden reported name.
pub const REPORTED_NAME_ANNOTATION: &str = "vantage.dev/reported-name";

const ENABLED: &str = "enabled";
const DISABLED: &str = "disabled";

// ── Custom resources ──────────────────────────────────────────────

/// Stored shape of a destination.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize)]
#[kube(
    group = "vantage.dev",
    version = "v1alpha1",
    kind = "TelemetryDestination",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryDestinationSpec {
    pub destination_name: String,
    pub destination_type: String,
    pub signals: ExportedSignals,
    pub data: HashMap<String, String>,
}

impl TelemetryDestinationSpec {
    fn from_request(req: DestinationRequest) -> Self {
        Self {
            destination_name: req.name,
            destination_type: req.destination_type,
            signals: req.signals,
            data: req.fields,
        }
    }
}

fn destination_from_cr(cr: &TelemetryDestination) -> Destination {
    Destination {
        id: cr.name_any(),
        name: cr.spec.destination_name.clone(),
        destination_type: cr.spec.destination_type.clone(),
        signals: cr.spec.signals,
        fields: cr.spec.data.clone(),
    }
}

/// Stored shape of an AddClusterInfo action.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize)]
#[kube(
    group = "vantage.dev",
    version = "v1alpha1",
    kind = "ClusterInfoAction",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfoActionSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub disabled: bool,
    pub cluster_attributes: Vec<ClusterAttribute>,
}

impl ClusterInfoActionSpec {
    fn from_request(req: AddClusterInfoRequest) -> Self {
        Self {
            action_name: req.action_name,
            notes: req.notes,
            signals: req.signals,
            disabled: req.disabled,
            cluster_attributes: req.cluster_attributes,
        }
    }
}

fn action_from_cr(cr: &ClusterInfoAction) -> AddClusterInfo {
    AddClusterInfo {
        id: cr.name_any(),
        action_name: cr.spec.action_name.clone(),
        notes: cr.spec.notes.clone(),
        signals: cr.spec.signals.clone(),
        disabled: cr.spec.disabled,
        cluster_attributes: cr.spec.cluster_attributes.clone(),
    }
}

// ── Workloads ─────────────────────────────────────────────────────

/// The apps/v1 kinds a source can be backed by.
trait WorkloadResource:
    kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + DeserializeOwned
    + Send
    + Sync
{
    const KIND: WorkloadKind;
    fn ready_instances(&self) -> i32;
}

impl WorkloadResource for Deployment {
    const KIND: WorkloadKind = WorkloadKind::Deployment;
    fn ready_instances(&self) -> i32 {
        self.status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0)
    }
}

impl WorkloadResource for StatefulSet {
    const KIND: WorkloadKind = WorkloadKind::StatefulSet;
    fn ready_instances(&self) -> i32 {
        self.status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0)
    }
}

impl WorkloadResource for DaemonSet {
    const KIND: WorkloadKind = WorkloadKind::DaemonSet;
    fn ready_instances(&self) -> i32 {
        self.status.as_ref().map(|s| s.number_ready).unwrap_or(0)
    }
}

fn source_from<K: WorkloadResource>(res: &K) -> Source {
    Source {
        namespace: res.namespace().unwrap_or_default(),
        kind: K::KIND,
        name: res.name_any(),
        reported_name: res.annotations().get(REPORTED_NAME_ANNOTATION).cloned(),
        instrumented: res
            .labels()
            .get(INSTRUMENT_LABEL)
            .is_some_and(|v| v == ENABLED),
    }
}

// ── Error mapping ─────────────────────────────────────────────────

fn map_kube_err(e: kube::Error) -> StoreError {
    match e {
        kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict(ae.message),
        kube::Error::Api(ae) => StoreError::Backend(ae.message),
        kube::Error::SerdeError(e) => StoreError::Serialize(e.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

/// Treat an API-server 404 as an absent entity.
fn absent_on_404<T>(res: Result<T, kube::Error>) -> StoreResult<Option<T>> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
        Err(e) => Err(map_kube_err(e)),
    }
}

// ── Store ─────────────────────────────────────────────────────────

/// Resource store backed by the cluster's API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Connect to the cluster and verify connectivity.
    ///
    /// With an explicit kubeconfig path the file must exist and parse;
    /// otherwise configuration is inferred (in-cluster service account
    /// or the default kubeconfig). The API-server probe makes
    /// connection and auth failures surface here rather than on the
    /// first request.
    pub async fn connect(kubeconfig: Option<&Path>) -> StoreResult<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kc = Kubeconfig::read_from(path)
                    .map_err(|e| StoreError::Connect(e.to_string()))?;
                Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| StoreError::Connect(e.to_string()))?
            }
            None => Config::infer()
                .await
                .map_err(|e| StoreError::Connect(e.to_string()))?,
        };

        let client =
            Client::try_from(config).map_err(|e| StoreError::Connect(e.to_string()))?;
        let version = client
            .apiserver_version()
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        debug!(version = %version.git_version, "connected to cluster");

        Ok(Self { client })
    }

    fn destinations(&self, namespace: &str) -> Api<TelemetryDestination> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn actions(&self, namespace: &str) -> Api<ClusterInfoAction> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn list_kind<K: WorkloadResource>(&self) -> StoreResult<Vec<Source>> {
        let api: Api<K> = Api::all(self.client.clone());
        let params = ListParams::default().labels(&format!("{INSTRUMENT_LABEL}={ENABLED}"));
        let list = api.list(&params).await.map_err(map_kube_err)?;
        Ok(list.items.iter().map(source_from).collect())
    }

    async fn get_workload<K: WorkloadResource>(
        &self,
        key: &SourceKey,
    ) -> StoreResult<Option<Source>> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        let res = api.get_opt(&key.name).await.map_err(map_kube_err)?;
        Ok(res.as_ref().map(source_from))
    }

    async fn patch_workload<K: WorkloadResource>(
        &self,
        key: &SourceKey,
        patch: &SourcePatch,
    ) -> StoreResult<Option<Source>> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);

        let mut labels = serde_json::Map::new();
        if let Some(instrumented) = patch.instrumented {
            let value = if instrumented { ENABLED } else { DISABLED };
            labels.insert(INSTRUMENT_LABEL.to_string(), json!(value));
        }
        let mut annotations = serde_json::Map::new();
        if let Some(name) = &patch.reported_name {
            annotations.insert(REPORTED_NAME_ANNOTATION.to_string(), json!(name));
        }
        let body = json!({"metadata": {"labels": labels, "annotations": annotations}});

        let res = api
            .patch(&key.name, &PatchParams::default(), &Patch::Merge(&body))
            .await;
        Ok(absent_on_404(res)?.as_ref().map(source_from))
    }

    async fn unmanage_workload<K: WorkloadResource>(&self, key: &SourceKey) -> StoreResult<bool> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        // Dropping the label stops management; the workload stays.
        let body = json!({"metadata": {"labels": {INSTRUMENT_LABEL: null}}});
        let res = api
            .patch(&key.name, &PatchParams::default(), &Patch::Merge(&body))
            .await;
        Ok(absent_on_404(res)?.is_some())
    }

    async fn list_apps_kind<K: WorkloadResource>(
        &self,
        namespace: &str,
    ) -> StoreResult<Vec<Application>> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await.map_err(map_kube_err)?;
        Ok(list
            .items
            .iter()
            .map(|res| Application {
                name: res.name_any(),
                kind: K::KIND,
                instances: res.ready_instances(),
            })
            .collect())
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn list_namespaces(&self) -> StoreResult<Vec<NamespaceInfo>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await.map_err(map_kube_err)?;
        Ok(list
            .items
            .iter()
            .map(|ns| NamespaceInfo {
                name: ns.name_any(),
                selected: ns
                    .labels()
                    .get(INSTRUMENT_LABEL)
                    .is_some_and(|v| v == ENABLED),
            })
            .collect())
    }

    async fn persist_namespaces(&self, selections: &[NamespaceSelection]) -> StoreResult<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        for sel in selections {
            let value = if sel.selected {
                json!(ENABLED)
            } else {
                serde_json::Value::Null
            };
            let body = json!({"metadata": {"labels": {INSTRUMENT_LABEL: value}}});
            api.patch(&sel.name, &PatchParams::default(), &Patch::Merge(&body))
                .await
                .map_err(map_kube_err)?;
            debug!(namespace = %sel.name, selected = sel.selected, "namespace selection persisted");
        }
        Ok(())
    }

    async fn list_sources(&self) -> StoreResult<Vec<Source>> {
        let (mut sources, stateful, daemon) = futures::try_join!(
            self.list_kind::<Deployment>(),
            self.list_kind::<StatefulSet>(),
            self.list_kind::<DaemonSet>(),
        )?;
        sources.extend(stateful);
        sources.extend(daemon);
        Ok(sources)
    }

    async fn get_source(&self, key: &SourceKey) -> StoreResult<Option<Source>> {
        match key.kind {
            WorkloadKind::Deployment => self.get_workload::<Deployment>(key).await,
            WorkloadKind::StatefulSet => self.get_workload::<StatefulSet>(key).await,
            WorkloadKind::DaemonSet => self.get_workload::<DaemonSet>(key).await,
        }
    }

    async fn patch_source(
        &self,
        key: &SourceKey,
        patch: &SourcePatch,
    ) -> StoreResult<Option<Source>> {
        match key.kind {
            WorkloadKind::Deployment => self.patch_workload::<Deployment>(key, patch).await,
            WorkloadKind::StatefulSet => self.patch_workload::<StatefulSet>(key, patch).await,
            WorkloadKind::DaemonSet => self.patch_workload::<DaemonSet>(key, patch).await,
        }
    }

    async fn delete_source(&self, key: &SourceKey) -> StoreResult<bool> {
        match key.kind {
            WorkloadKind::Deployment => self.unmanage_workload::<Deployment>(key).await,
            WorkloadKind::StatefulSet => self.unmanage_workload::<StatefulSet>(key).await,
            WorkloadKind::DaemonSet => self.unmanage_workload::<DaemonSet>(key).await,
        }
    }

    async fn list_applications(&self, namespace: &str) -> StoreResult<Vec<Application>> {
        let (mut apps, stateful, daemon) = futures::try_join!(
            self.list_apps_kind::<Deployment>(namespace),
            self.list_apps_kind::<StatefulSet>(namespace),
            self.list_apps_kind::<DaemonSet>(namespace),
        )?;
        apps.extend(stateful);
        apps.extend(daemon);
        Ok(apps)
    }

    async fn list_destinations(&self, namespace: &str) -> StoreResult<Vec<Destination>> {
        let list = self
            .destinations(namespace)
            .list(&ListParams::default())
            .await
            .map_err(map_kube_err)?;
        Ok(list.items.iter().map(destination_from_cr).collect())
    }

    async fn get_destination(
        &self,
        namespace: &str,
        id: &str,
    ) -> StoreResult<Option<Destination>> {
        let cr = self
            .destinations(namespace)
            .get_opt(id)
            .await
            .map_err(map_kube_err)?;
        Ok(cr.as_ref().map(destination_from_cr))
    }

    async fn create_destination(
        &self,
        namespace: &str,
        req: DestinationRequest,
    ) -> StoreResult<Destination> {
        let id = generate_id("dest");
        let cr = TelemetryDestination::new(&id, TelemetryDestinationSpec::from_request(req));
        let created = self
            .destinations(namespace)
            .create(&PostParams::default(), &cr)
            .await
            .map_err(map_kube_err)?;
        debug!(%id, "destination created");
        Ok(destination_from_cr(&created))
    }

    async fn update_destination(
        &self,
        namespace: &str,
        id: &str,
        req: DestinationRequest,
    ) -> StoreResult<Option<Destination>> {
        let api = self.destinations(namespace);
        let Some(mut existing) = api.get_opt(id).await.map_err(map_kube_err)? else {
            return Ok(None);
        };
        existing.spec = TelemetryDestinationSpec::from_request(req);
        let replaced = api
            .replace(id, &PostParams::default(), &existing)
            .await
            .map_err(map_kube_err)?;
        Ok(Some(destination_from_cr(&replaced)))
    }

    async fn delete_destination(&self, namespace: &str, id: &str) -> StoreResult<bool> {
        let res = self
            .destinations(namespace)
            .delete(id, &DeleteParams::default())
            .await;
        Ok(absent_on_404(res)?.is_some())
    }

    async fn list_cluster_info_actions(
        &self,
        namespace: &str,
    ) -> StoreResult<Vec<AddClusterInfo>> {
        let list = self
            .actions(namespace)
            .list(&ListParams::default())
            .await
            .map_err(map_kube_err)?;
        Ok(list.items.iter().map(action_from_cr).collect())
    }

    async fn get_cluster_info_action(
        &self,
        namespace: &str,
        id: &str,
    ) -> StoreResult<Option<AddClusterInfo>> {
        let cr = self
            .actions(namespace)
            .get_opt(id)
            .await
            .map_err(map_kube_err)?;
        Ok(cr.as_ref().map(action_from_cr))
    }

    async fn create_cluster_info_action(
        &self,
        namespace: &str,
        req: AddClusterInfoRequest,
    ) -> StoreResult<AddClusterInfo> {
        let id = generate_id("aci");
        let cr = ClusterInfoAction::new(&id, ClusterInfoActionSpec::from_request(req));
        let created = self
            .actions(namespace)
            .create(&PostParams::default(), &cr)
            .await
            .map_err(map_kube_err)?;
        debug!(%id, "action created");
        Ok(action_from_cr(&created))
    }

    async fn update_cluster_info_action(
        &self,
        namespace: &str,
        id: &str,
        req: AddClusterInfoRequest,
    ) -> StoreResult<Option<AddClusterInfo>> {
        let api = self.actions(namespace);
        let Some(mut existing) = api.get_opt(id).await.map_err(map_kube_err)? else {
            return Ok(None);
        };
        existing.spec = ClusterInfoActionSpec::from_request(req);
        let replaced = api
            .replace(id, &PostParams::default(), &existing)
            .await
            .map_err(map_kube_err)?;
        Ok(Some(action_from_cr(&replaced)))
    }

    async fn delete_cluster_info_action(&self, namespace: &str, id: &str) -> StoreResult<bool> {
        let res = self
            .actions(namespace)
            .delete(id, &DeleteParams::default())
            .await;
        Ok(absent_on_404(res)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::ErrorResponse;
    use std::collections::BTreeMap;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("status {code}"),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn not_found_maps_to_absent() {
        let res: StoreResult<Option<()>> = absent_on_404(Err(api_error(404)));
        assert!(res.unwrap().is_none());
    }

    #[test]
    fn conflict_maps_to_conflict() {
        assert!(matches!(map_kube_err(api_error(409)), StoreError::Conflict(_)));
        assert!(matches!(map_kube_err(api_error(500)), StoreError::Backend(_)));
    }

    #[test]
    fn source_reads_label_and_annotation() {
        let dep = Deployment {
            metadata: ObjectMeta {
                name: Some("checkout".to_string()),
                namespace: Some("shop".to_string()),
                labels: Some(BTreeMap::from([(
                    INSTRUMENT_LABEL.to_string(),
                    ENABLED.to_string(),
                )])),
                annotations: Some(BTreeMap::from([(
                    REPORTED_NAME_ANNOTATION.to_string(),
                    "checkout-svc".to_string(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        };

        let source = source_from(&dep);
        assert_eq!(source.key().table_key(), "shop/deployment/checkout");
        assert!(source.instrumented);
        assert_eq!(source.reported_name.as_deref(), Some("checkout-svc"));
    }

    #[test]
    fn disabled_label_is_not_instrumented() {
        let dep = Deployment {
            metadata: ObjectMeta {
                name: Some("cart".to_string()),
                namespace: Some("shop".to_string()),
                labels: Some(BTreeMap::from([(
                    INSTRUMENT_LABEL.to_string(),
                    DISABLED.to_string(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!source_from(&dep).instrumented);
    }

    #[tokio::test]
    async fn connect_fails_on_missing_kubeconfig() {
        let err = KubeStore::connect(Some(Path::new("/does/not/exist/kubeconfig")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Connect(_)));
    }
}
