use super::config::ConfigError;
use crate::core::io::snapshot::SnapshotError;
use crate::core::models::element::ElementError;
use crate::core::models::system::TopologyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Topology error: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("Element error: {0}")]
    Element(#[from] ElementError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Capacity exceeded: at most {limit} {what} allowed")]
    CapacityExceeded { what: &'static str, limit: usize },
}
