//! Destination-type catalog.
//!
//! Static reference data describing every telemetry sink the console can
//! configure: display metadata, which signals the sink accepts, and the
//! field schema the web app renders as a form. The data ships embedded
//! in the binary and is parsed once at startup; a parse failure is fatal
//! before the listener binds.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::types::ExportedSignals;

const CATALOG_JSON: &str = include_str!("catalog/destination-types.json");

/// UI component used to render one destination field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldComponent {
    Input,
    Password,
    Dropdown,
    Multiline,
}

/// Schema for one connection/auth field of a destination type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub display_name: String,
    pub component: FieldComponent,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub secret: bool,
    /// Choices for dropdown fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// One supported destination type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DestinationTypeSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    pub display_name: String,
    /// "managed" or "self_hosted".
    pub category: String,
    pub supported_signals: ExportedSignals,
    pub fields: Vec<FieldSpec>,
}

/// Parsed catalog, in file order.
#[derive(Debug, Clone)]
pub struct DestinationCatalog {
    items: Vec<DestinationTypeSpec>,
}

impl DestinationCatalog {
    /// Load the embedded catalog.
    pub fn load() -> StoreResult<Self> {
        Self::from_json(CATALOG_JSON)
    }

    /// Parse a catalog document.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let items: Vec<DestinationTypeSpec> =
            serde_json::from_str(json).map_err(|e| StoreError::Serialize(e.to_string()))?;
        Ok(Self { items })
    }

    pub fn list(&self) -> &[DestinationTypeSpec] {
        &self.items
    }

    pub fn get(&self, type_name: &str) -> Option<&DestinationTypeSpec> {
        self.items.iter().find(|t| t.type_name == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        let catalog = DestinationCatalog::load().unwrap();
        assert!(!catalog.list().is_empty());
    }

    #[test]
    fn lookup_by_type_name() {
        let catalog = DestinationCatalog::load().unwrap();
        let jaeger = catalog.get("jaeger").unwrap();
        assert_eq!(jaeger.display_name, "Jaeger");
        assert!(jaeger.supported_signals.traces);
        assert!(catalog.get("no-such-sink").is_none());
    }

    #[test]
    fn secret_fields_are_marked() {
        let catalog = DestinationCatalog::load().unwrap();
        let datadog = catalog.get("datadog").unwrap();
        assert!(
            datadog
                .fields
                .iter()
                .any(|f| f.secret && f.component == FieldComponent::Password)
        );
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = DestinationCatalog::from_json("{not json").unwrap_err();
        assert!(matches!(err, StoreError::Serialize(_)));
    }
}
