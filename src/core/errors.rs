use thiserror::Error;

use super::types::{Bandwidth, Cycle, ModuleId, SequenceId};

/// Wiring and sequencing violations.
///
/// Every variant is fatal: it points at a static modeling mistake, so callers
/// are expected to abort the run rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("channel '{key}' already has a writer")]
    DuplicateWriter { key: String },

    #[error("channel '{key}' already has a reader")]
    DuplicateReader { key: String },

    #[error("unmatched channels: {}", .keys.join(", "))]
    UnmatchedChannel { keys: Vec<String> },

    #[error("channel '{key}': write #{attempted} at cycle {cycle} exceeds bandwidth {bandwidth}")]
    BandwidthExceeded {
        key: String,
        cycle: Cycle,
        bandwidth: Bandwidth,
        attempted: Bandwidth,
    },

    #[error("channel '{key}': no token ready at cycle {cycle}")]
    NotReady { key: String, cycle: Cycle },

    #[error("sequence {seq_id}: unknown stage '{stage}'")]
    UnknownStage { seq_id: SequenceId, stage: String },

    #[error("module {module} cannot reach a root module")]
    OrphanModule { module: ModuleId },

    #[error("channel '{key}': payload type {found} does not match {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("channel '{key}': write port bandwidth must be at least 1")]
    ZeroBandwidth { key: String },

    #[error("channel registry is already finalized")]
    AlreadyFinalized,

    #[error("channel '{key}' used before the registry was finalized")]
    NotFinalized { key: String },

    #[error("channel '{key}': cycle {cycle} is earlier than previously seen cycle {last}")]
    NonMonotonicCycle { key: String, cycle: Cycle, last: Cycle },

    #[error("logging selector names unknown modules: {}", .names.join(", "))]
    UnknownModuleName { names: Vec<String> },
}

/// Failures while writing run artifacts or reading configuration files
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
