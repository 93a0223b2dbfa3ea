use log::debug;
use serde::Serialize;

use crate::core::errors::SimulationError;
use crate::core::ports::port::{ReadPort, WritePort};
use crate::core::ports::registry::ChannelRegistry;
use crate::core::types::{Bandwidth, Latency, ModuleId};

/// Write port as recorded on its owning module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WritePortInfo {
    pub key: String,
    pub bandwidth: Bandwidth,
}

/// Read port as recorded on its owning module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadPortInfo {
    pub key: String,
    pub latency: Latency,
}

/// How a module reaches the channel registry: the root owns it, every other
/// module defers to its parent.
enum ModuleLink {
    Root(ChannelRegistry),
    Interior(ModuleId),
}

pub(crate) struct ModuleNode {
    pub(crate) name: String,
    link: ModuleLink,
    pub(crate) children: Vec<ModuleId>,
    pub(crate) write_ports: Vec<WritePortInfo>,
    pub(crate) read_ports: Vec<ReadPortInfo>,
    pub(crate) logging_enabled: bool,
}

impl ModuleNode {
    fn new(name: String, link: ModuleLink) -> Self {
        Self {
            name,
            link,
            children: Vec::new(),
            write_ports: Vec::new(),
            read_ports: Vec::new(),
            logging_enabled: false,
        }
    }
}

/// Arena holding the whole module hierarchy of one simulation run.
///
/// Modules are only ever added, never reparented or removed, so a
/// [`ModuleId`] stays valid for the lifetime of the tree.
pub struct ModuleTree {
    pub(crate) nodes: Vec<ModuleNode>,
}

impl ModuleTree {
    /// Create a tree holding only the root module and a fresh registry
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![ModuleNode::new(
                root_name.to_string(),
                ModuleLink::Root(ChannelRegistry::new()),
            )],
        }
    }

    /// Id of the root module, the owner of the channel registry
    pub fn root(&self) -> ModuleId {
        ModuleId::ROOT
    }

    /// Add a module under `parent`.
    ///
    /// # Arguments
    /// * `parent` - Existing module that will hold the new one
    /// * `name` - Module name, used for logging selection and topology dumps
    ///
    /// # Returns
    /// The new module's id, or `OrphanModule` if `parent` is not in the tree.
    /// Children are kept in construction order.
    pub fn add_module(&mut self, parent: ModuleId, name: &str) -> Result<ModuleId, SimulationError> {
        let id = ModuleId(self.nodes.len());
        let parent_node = self
            .nodes
            .get_mut(parent.0)
            .ok_or(SimulationError::OrphanModule { module: id })?;
        parent_node.children.push(id);
        self.nodes
            .push(ModuleNode::new(name.to_string(), ModuleLink::Interior(parent)));
        debug!("Added module '{}' {} under {}", name, id, parent);
        Ok(id)
    }

    fn node(&self, id: ModuleId) -> Result<&ModuleNode, SimulationError> {
        self.nodes.get(id.0).ok_or(SimulationError::OrphanModule { module: id })
    }

    fn node_mut(&mut self, id: ModuleId) -> Result<&mut ModuleNode, SimulationError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(SimulationError::OrphanModule { module: id })
    }

    // Recursive, but finite: parents always precede their children in the arena.
    fn registry_owner(&self, id: ModuleId) -> Result<ModuleId, SimulationError> {
        match self.node(id)?.link {
            ModuleLink::Root(_) => Ok(id),
            ModuleLink::Interior(parent) if parent.0 < id.0 => self.registry_owner(parent),
            ModuleLink::Interior(_) => Err(SimulationError::OrphanModule { module: id }),
        }
    }

    fn registry_of(&mut self, id: ModuleId) -> Result<&mut ChannelRegistry, SimulationError> {
        let owner = self.registry_owner(id)?;
        match &mut self.node_mut(owner)?.link {
            ModuleLink::Root(registry) => Ok(registry),
            ModuleLink::Interior(_) => Err(SimulationError::OrphanModule { module: id }),
        }
    }

    /// The registry shared by every module of this tree
    pub fn registry(&self) -> &ChannelRegistry {
        match &self.nodes[ModuleId::ROOT.0].link {
            ModuleLink::Root(registry) => registry,
            ModuleLink::Interior(_) => unreachable!("first node is always the root"),
        }
    }

    /// Create the producer end of `key`, owned by `module`.
    ///
    /// The request is forwarded up to the root's registry and the port is
    /// recorded on `module` for topology dumps only once registration
    /// succeeds.
    pub fn make_write_port<T: 'static>(
        &mut self,
        module: ModuleId,
        key: &str,
        bandwidth: Bandwidth,
    ) -> Result<WritePort<T>, SimulationError> {
        let owner = self.node(module)?.name.clone();
        let port = self.registry_of(module)?.register_writer::<T>(key, bandwidth, &owner)?;
        self.node_mut(module)?.write_ports.push(WritePortInfo {
            key: key.to_string(),
            bandwidth,
        });
        Ok(port)
    }

    /// Create the consumer end of `key`, owned by `module`
    pub fn make_read_port<T: 'static>(
        &mut self,
        module: ModuleId,
        key: &str,
        latency: Latency,
    ) -> Result<ReadPort<T>, SimulationError> {
        let owner = self.node(module)?.name.clone();
        let port = self.registry_of(module)?.register_reader::<T>(key, latency, &owner)?;
        self.node_mut(module)?.read_ports.push(ReadPortInfo {
            key: key.to_string(),
            latency,
        });
        Ok(port)
    }

    /// Validate the wiring of the complete tree. Call once, after every
    /// module and port exists.
    pub fn init_portmap(&mut self) -> Result<(), SimulationError> {
        self.registry_of(ModuleId::ROOT)?.finalize()
    }

    /// Name of `id`, `None` for ids outside the tree
    pub fn name(&self, id: ModuleId) -> Option<&str> {
        self.nodes.get(id.0).map(|node| node.name.as_str())
    }

    /// Parent of `id`; `None` for the root and for unknown ids
    pub fn parent(&self, id: ModuleId) -> Option<ModuleId> {
        match self.nodes.get(id.0)?.link {
            ModuleLink::Root(_) => None,
            ModuleLink::Interior(parent) => Some(parent),
        }
    }

    /// Direct children of `id` in construction order, empty for unknown ids
    pub fn children(&self, id: ModuleId) -> &[ModuleId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// First module with exactly this name, in construction order.
    ///
    /// Names are not required to be unique; a later module with the same
    /// name is only reachable through its id.
    pub fn find(&self, name: &str) -> Option<ModuleId> {
        self.nodes.iter().position(|node| node.name == name).map(ModuleId)
    }

    /// Write ports created for `id`, in creation order
    pub fn write_ports(&self, id: ModuleId) -> &[WritePortInfo] {
        self.nodes
            .get(id.0)
            .map(|node| node.write_ports.as_slice())
            .unwrap_or(&[])
    }

    /// Read ports created for `id`, in creation order
    pub fn read_ports(&self, id: ModuleId) -> &[ReadPortInfo] {
        self.nodes
            .get(id.0)
            .map(|node| node.read_ports.as_slice())
            .unwrap_or(&[])
    }

    /// Number of modules, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_recorded_in_construction_order() {
        let mut tree = ModuleTree::new("core");
        let fetch = tree.add_module(tree.root(), "fetch").unwrap();
        let decode = tree.add_module(tree.root(), "decode").unwrap();
        let bpu = tree.add_module(fetch, "bpu").unwrap();

        assert_eq!(tree.children(tree.root()), &[fetch, decode]);
        assert_eq!(tree.children(fetch), &[bpu]);
        assert_eq!(tree.parent(bpu), Some(fetch));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.name(bpu), Some("bpu"));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_unknown_parent_is_orphan() {
        let mut tree = ModuleTree::new("core");
        assert_eq!(
            tree.add_module(ModuleId(42), "lost").unwrap_err(),
            SimulationError::OrphanModule { module: ModuleId(1) }
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_deep_module_resolves_root_registry() {
        let mut tree = ModuleTree::new("core");
        let a = tree.add_module(tree.root(), "a").unwrap();
        let b = tree.add_module(a, "b").unwrap();
        let c = tree.add_module(b, "c").unwrap();

        let _w = tree.make_write_port::<u64>(c, "deep", 1).unwrap();
        let _r = tree.make_read_port::<u64>(tree.root(), "deep", 1).unwrap();
        assert_eq!(tree.registry().len(), 1);
        assert!(tree.init_portmap().is_ok());
        assert!(tree.registry().is_finalized());
    }

    #[test]
    fn test_port_on_unknown_module_is_orphan() {
        let mut tree = ModuleTree::new("core");
        assert!(matches!(
            tree.make_write_port::<u8>(ModuleId(9), "x", 1),
            Err(SimulationError::OrphanModule { .. })
        ));
    }

    #[test]
    fn test_ports_recorded_on_owner() {
        let mut tree = ModuleTree::new("core");
        let fetch = tree.add_module(tree.root(), "fetch").unwrap();
        let _w = tree.make_write_port::<u32>(fetch, "fetch_2_decode", 2).unwrap();
        let _r = tree.make_read_port::<bool>(fetch, "flush", 1).unwrap();

        assert_eq!(
            tree.write_ports(fetch),
            &[WritePortInfo { key: "fetch_2_decode".to_string(), bandwidth: 2 }]
        );
        assert_eq!(
            tree.read_ports(fetch),
            &[ReadPortInfo { key: "flush".to_string(), latency: 1 }]
        );
        assert!(tree.write_ports(tree.root()).is_empty());
    }

    #[test]
    fn test_failed_registration_not_recorded() {
        let mut tree = ModuleTree::new("core");
        let a = tree.add_module(tree.root(), "a").unwrap();
        let _w = tree.make_write_port::<u32>(a, "k", 1).unwrap();
        assert!(tree.make_write_port::<u32>(a, "k", 1).is_err());
        assert_eq!(tree.write_ports(a).len(), 1);
    }
}
