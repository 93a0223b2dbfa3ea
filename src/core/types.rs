/// Simulation time in whole cycles, supplied by the external driver
pub type Cycle = u64;

/// Minimum age (in cycles) a token must reach before its reader may consume it
pub type Latency = u64;

/// Maximum number of writes a write port accepts within one cycle
pub type Bandwidth = u32;

/// Identifier of one dynamic unit of work (e.g. one instruction instance)
pub type SequenceId = u64;

/// Index of a module inside its [`ModuleTree`](crate::core::modules::tree::ModuleTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    /// The root module is always the first node of a tree
    pub const ROOT: ModuleId = ModuleId(0);

    /// Get the raw arena index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
