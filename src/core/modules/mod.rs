pub mod logging;
pub mod topology;
pub mod tree;

pub use logging::LogSelector;
pub use topology::{ModuleSnapshot, Topology};
pub use tree::{ModuleTree, ReadPortInfo, WritePortInfo};
