//! vantage-store — system of record for the Vantage console.
//!
//! Defines the domain model (sources, destinations, actions, namespace
//! selection), the [`ResourceStore`] contract the API gateway programs
//! against, and two implementations: [`KubeStore`] over a cluster's API
//! server and [`MemoryStore`] for tests and local development. Also
//! hosts the embedded destination-type catalog.

pub mod catalog;
pub mod error;
pub mod kubernetes;
pub mod memory;
pub mod store;
pub mod types;

pub use catalog::DestinationCatalog;
pub use error::{StoreError, StoreResult};
pub use kubernetes::KubeStore;
pub use memory::MemoryStore;
pub use store::ResourceStore;
pub use types::*;
