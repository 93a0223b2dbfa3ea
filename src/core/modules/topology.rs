use std::fs::File;
use std::io::BufWriter;

use log::info;
use serde::Serialize;

use super::tree::{ModuleTree, ReadPortInfo, WritePortInfo};
use crate::core::errors::ExportError;
use crate::core::ports::registry::ChannelSummary;
use crate::core::types::ModuleId;

/// One module of the structural snapshot, children expanded recursively
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSnapshot {
    pub name: String,
    pub children: Vec<ModuleSnapshot>,
    pub write_ports: Vec<WritePortInfo>,
    pub read_ports: Vec<ReadPortInfo>,
}

/// Read-only picture of the module hierarchy and the channel table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub modules: ModuleSnapshot,
    pub channels: Vec<ChannelSummary>,
}

impl ModuleTree {
    /// Snapshot of every module, from the root down, with its ports, plus the
    /// registry's channel table in key order
    pub fn topology_dumping(&self) -> Topology {
        Topology {
            modules: self.module_dumping(ModuleId::ROOT),
            channels: self.registry().summaries(),
        }
    }

    fn module_dumping(&self, id: ModuleId) -> ModuleSnapshot {
        let node = &self.nodes[id.0];
        ModuleSnapshot {
            name: node.name.clone(),
            children: node
                .children
                .iter()
                .map(|&child| self.module_dumping(child))
                .collect(),
            write_ports: node.write_ports.clone(),
            read_ports: node.read_ports.clone(),
        }
    }

    /// Write the snapshot as JSON to `destination`; an empty destination
    /// means no dump is wanted.
    pub fn dump_topology(&self, destination: &str) -> Result<(), ExportError> {
        if destination.is_empty() {
            return Ok(());
        }
        let writer = BufWriter::new(File::create(destination)?);
        serde_json::to_writer_pretty(writer, &self.topology_dumping())?;
        info!("Topology written to {}", destination);
        Ok(())
    }
}
