use log::info;

use crate::core::config::SimulationConfig;
use crate::core::errors::ExportError;
use crate::core::modules::tree::ModuleTree;
use crate::core::trace::recorder::EventTraceRecorder;

/// Write the end-of-run artifacts requested by `config`.
///
/// Each dump is skipped when its destination is empty.
pub fn export_run(
    tree: &ModuleTree,
    recorder: &EventTraceRecorder,
    config: &SimulationConfig,
) -> Result<(), ExportError> {
    tree.dump_topology(&config.topology_dump)?;
    recorder.write_file(&config.trace_dump)?;
    if config.topology_dump.is_empty() && config.trace_dump.is_empty() {
        info!("No run artifacts requested");
    }
    Ok(())
}
