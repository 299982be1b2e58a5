//! Domain types for the Vantage resource store.
//!
//! These types represent the entities the console manages: instrumented
//! workload sources, telemetry destinations, pipeline actions, and
//! namespace selection state. All types are serializable to/from JSON.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a destination within the configured namespace.
pub type DestinationId = String;

/// Unique identifier for an action within the configured namespace.
pub type ActionId = String;

// ── Sources ───────────────────────────────────────────────────────

/// Workload category a source can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
}

impl WorkloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::StatefulSet => "statefulset",
            WorkloadKind::DaemonSet => "daemonset",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" => Ok(WorkloadKind::Deployment),
            "statefulset" => Ok(WorkloadKind::StatefulSet),
            "daemonset" => Ok(WorkloadKind::DaemonSet),
            other => Err(format!("unknown workload kind: {other}")),
        }
    }
}

/// Composite key addressing one source across the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceKey {
    pub namespace: String,
    pub kind: WorkloadKind,
    pub name: String,
}

impl SourceKey {
    pub fn new(namespace: &str, kind: WorkloadKind, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind,
            name: name.to_string(),
        }
    }

    /// Build the composite key string used by map-backed stores.
    pub fn table_key(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.kind, self.name)
    }
}

/// One instrumentable workload the control plane manages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub namespace: String,
    pub kind: WorkloadKind,
    pub name: String,
    /// Display name reported to telemetry backends, if overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_name: Option<String>,
    /// Whether instrumentation is currently enabled for this workload.
    pub instrumented: bool,
}

impl Source {
    pub fn key(&self) -> SourceKey {
        SourceKey::new(&self.namespace, self.kind, &self.name)
    }
}

/// Partial update applied to a source via PATCH.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumented: Option<bool>,
}

/// An instrumentation candidate discovered in a namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub name: String,
    pub kind: WorkloadKind,
    /// Number of ready instances backing this workload.
    pub instances: i32,
}

// ── Namespaces ────────────────────────────────────────────────────

/// A cluster namespace with its persisted selection state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespaceInfo {
    pub name: String,
    /// Whether the namespace is selected for instrumentation.
    pub selected: bool,
}

/// One entry of a bulk namespace selection update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespaceSelection {
    pub name: String,
    pub selected: bool,
}

// ── Destinations ──────────────────────────────────────────────────

/// Telemetry signals a destination exports.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedSignals {
    pub traces: bool,
    pub metrics: bool,
    pub logs: bool,
}

/// A single telemetry signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Traces,
    Metrics,
    Logs,
}

/// A configured telemetry sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub id: DestinationId,
    pub name: String,
    /// Catalog type name (e.g. "jaeger", "datadog").
    #[serde(rename = "type")]
    pub destination_type: String,
    pub signals: ExportedSignals,
    /// Connection and auth fields, opaque to this layer.
    pub fields: HashMap<String, String>,
}

/// Payload for creating or replacing a destination. The id is assigned
/// by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DestinationRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub destination_type: String,
    pub signals: ExportedSignals,
    pub fields: HashMap<String, String>,
}

impl DestinationRequest {
    /// Materialize this request into a stored destination with the
    /// given id.
    pub fn into_destination(self, id: DestinationId) -> Destination {
        Destination {
            id,
            name: self.name,
            destination_type: self.destination_type,
            signals: self.signals,
            fields: self.fields,
        }
    }
}

// ── Actions ───────────────────────────────────────────────────────

/// One static attribute injected into telemetry by AddClusterInfo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterAttribute {
    pub attribute_name: String,
    pub attribute_value: String,
}

/// The AddClusterInfo action: injects static cluster metadata into
/// every telemetry record flowing through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddClusterInfo {
    pub id: ActionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub disabled: bool,
    pub cluster_attributes: Vec<ClusterAttribute>,
}

/// Payload for creating or replacing an AddClusterInfo action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddClusterInfoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub disabled: bool,
    pub cluster_attributes: Vec<ClusterAttribute>,
}

impl AddClusterInfoRequest {
    /// Materialize this request into a stored action with the given id.
    pub fn into_action(self, id: ActionId) -> AddClusterInfo {
        AddClusterInfo {
            id,
            action_name: self.action_name,
            notes: self.notes,
            signals: self.signals,
            disabled: self.disabled,
            cluster_attributes: self.cluster_attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_kind_parses_case_insensitively() {
        assert_eq!(
            "Deployment".parse::<WorkloadKind>().unwrap(),
            WorkloadKind::Deployment
        );
        assert_eq!(
            "statefulset".parse::<WorkloadKind>().unwrap(),
            WorkloadKind::StatefulSet
        );
        assert!("cronjob".parse::<WorkloadKind>().is_err());
    }

    #[test]
    fn source_key_composite_shape() {
        let key = SourceKey::new("default", WorkloadKind::DaemonSet, "node-agent");
        assert_eq!(key.table_key(), "default/daemonset/node-agent");
    }

    #[test]
    fn destination_request_round_trips_through_json() {
        let req: DestinationRequest = serde_json::from_str(
            r#"{
                "name": "prod traces",
                "type": "jaeger",
                "signals": {"traces": true, "metrics": false, "logs": false},
                "fields": {"endpoint": "jaeger.tracing:4317"}
            }"#,
        )
        .unwrap();
        assert_eq!(req.destination_type, "jaeger");

        let dest = req.into_destination("dest-0a1b2c3d".to_string());
        let value = serde_json::to_value(&dest).unwrap();
        assert_eq!(value["type"], "jaeger");
        assert_eq!(value["id"], "dest-0a1b2c3d");
    }

    #[test]
    fn action_disabled_defaults_to_false() {
        let req: AddClusterInfoRequest = serde_json::from_str(
            r#"{
                "signals": ["traces"],
                "cluster_attributes": [
                    {"attribute_name": "cluster.name", "attribute_value": "prod-eu"}
                ]
            }"#,
        )
        .unwrap();
        assert!(!req.disabled);
        assert_eq!(req.signals, vec![Signal::Traces]);
    }
}
