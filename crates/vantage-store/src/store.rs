//! The `ResourceStore` contract the API gateway programs against.
//!
//! Handlers receive the store as a trait object so tests can substitute
//! an in-memory implementation for the Kubernetes-backed one. Get-style
//! operations return `Ok(None)` for absent entities and deletes return
//! `Ok(bool)` ("existed"); only genuine backend faults are errors.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::*;

/// System of record for all console-managed entities.
///
/// Implementations must be safe for concurrent use; the gateway shares
/// one instance across all in-flight requests.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    // ── Namespaces ────────────────────────────────────────────────

    async fn list_namespaces(&self) -> StoreResult<Vec<NamespaceInfo>>;

    /// Bulk-persist namespace selection state.
    async fn persist_namespaces(&self, selections: &[NamespaceSelection]) -> StoreResult<()>;

    // ── Sources ───────────────────────────────────────────────────

    /// List every managed source across the whole cluster.
    async fn list_sources(&self) -> StoreResult<Vec<Source>>;

    async fn get_source(&self, key: &SourceKey) -> StoreResult<Option<Source>>;

    /// Apply a partial update; returns the updated source, or `None`
    /// if the key does not address an existing workload.
    async fn patch_source(
        &self,
        key: &SourceKey,
        patch: &SourcePatch,
    ) -> StoreResult<Option<Source>>;

    /// Stop managing a source. The underlying workload is untouched.
    /// Returns whether the source existed.
    async fn delete_source(&self, key: &SourceKey) -> StoreResult<bool>;

    /// List instrumentation candidates in one namespace.
    async fn list_applications(&self, namespace: &str) -> StoreResult<Vec<Application>>;

    // ── Destinations ──────────────────────────────────────────────

    async fn list_destinations(&self, namespace: &str) -> StoreResult<Vec<Destination>>;

    async fn get_destination(
        &self,
        namespace: &str,
        id: &str,
    ) -> StoreResult<Option<Destination>>;

    /// Persist a new destination; the returned value carries the
    /// generated id.
    async fn create_destination(
        &self,
        namespace: &str,
        req: DestinationRequest,
    ) -> StoreResult<Destination>;

    async fn update_destination(
        &self,
        namespace: &str,
        id: &str,
        req: DestinationRequest,
    ) -> StoreResult<Option<Destination>>;

    async fn delete_destination(&self, namespace: &str, id: &str) -> StoreResult<bool>;

    // ── Actions ───────────────────────────────────────────────────

    async fn list_cluster_info_actions(
        &self,
        namespace: &str,
    ) -> StoreResult<Vec<AddClusterInfo>>;

    async fn get_cluster_info_action(
        &self,
        namespace: &str,
        id: &str,
    ) -> StoreResult<Option<AddClusterInfo>>;

    async fn create_cluster_info_action(
        &self,
        namespace: &str,
        req: AddClusterInfoRequest,
    ) -> StoreResult<AddClusterInfo>;

    async fn update_cluster_info_action(
        &self,
        namespace: &str,
        id: &str,
        req: AddClusterInfoRequest,
    ) -> StoreResult<Option<AddClusterInfo>>;

    async fn delete_cluster_info_action(&self, namespace: &str, id: &str) -> StoreResult<bool>;
}

/// Generate a store id with the given prefix, e.g. `dest-1f2e3d4c`.
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_differ() {
        let a = generate_id("dest");
        let b = generate_id("dest");
        assert!(a.starts_with("dest-"));
        assert_eq!(a.len(), "dest-".len() + 8);
        assert_ne!(a, b);
    }
}
