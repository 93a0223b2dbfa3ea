pub mod core;
pub mod macros;

// Re-export commonly used types
pub use crate::core::config::SimulationConfig;
pub use crate::core::errors::{ExportError, SimulationError};
pub use crate::core::modules::tree::ModuleTree;
pub use crate::core::ports::{ReadPort, WritePort};
pub use crate::core::trace::{EventTraceRecorder, Stage};
pub use crate::core::types::{Bandwidth, Cycle, Latency, ModuleId, SequenceId};
