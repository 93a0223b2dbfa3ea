//! Selective per-module logging.
//!
//! The root receives a textual selector such as `"fetch,decode"` or
//! `"all !writeback"` and sets the logging flag of every module from an
//! exact match of its name. Each call replaces the previous selection, and
//! selection never spills over from a module to its descendants: each module
//! is judged on its own name.

use std::collections::HashSet;
use std::fmt;

use log::{debug, info};

use super::tree::ModuleTree;
use crate::core::errors::SimulationError;
use crate::core::types::ModuleId;

const WILDCARD: &str = "all";
const NOTHING: &str = "nothing";
const EXCLUDE_PREFIX: char = '!';

/// Parsed logging selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSelector {
    all: bool,
    names: HashSet<String>,
    excluded: HashSet<String>,
}

impl LogSelector {
    /// Parse a comma, semicolon or whitespace separated list of names.
    ///
    /// `all` selects every module, `!name` removes one, `nothing` (or an
    /// empty string) selects none.
    pub fn parse(selector: &str) -> Self {
        let mut parsed = Self::default();
        let tokens = selector
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty());

        for token in tokens {
            if let Some(name) = token.strip_prefix(EXCLUDE_PREFIX) {
                parsed.excluded.insert(name.to_string());
            } else if token == WILDCARD {
                parsed.all = true;
            } else if token != NOTHING {
                parsed.names.insert(token.to_string());
            }
        }
        parsed
    }

    /// Whether a module named `name` logs under this selector
    pub fn selects(&self, name: &str) -> bool {
        !self.excluded.contains(name) && (self.all || self.names.contains(name))
    }

    /// True when nothing can be selected (`nothing`, or no names at all)
    pub fn is_empty(&self) -> bool {
        !self.all && self.names.is_empty()
    }

    fn named(&self) -> impl Iterator<Item = &String> {
        self.names.iter().chain(self.excluded.iter())
    }
}

impl ModuleTree {
    /// Recompute the logging flag of every module from `selector`.
    ///
    /// After the call exactly the modules selected by name (or by `all`,
    /// minus `!name` exclusions) log; every other module is switched off.
    /// Names that match no module are rejected before any flag changes.
    ///
    /// # Arguments
    /// * `selector` - Comma, semicolon or whitespace separated module names
    ///
    /// # Returns
    /// `UnknownModuleName` listing every selector name absent from the tree
    pub fn enable_logging(&mut self, selector: &str) -> Result<(), SimulationError> {
        let selector = LogSelector::parse(selector);

        let known: HashSet<&str> = self.nodes.iter().map(|node| node.name.as_str()).collect();
        let mut unknown: Vec<String> = selector
            .named()
            .filter(|name| !known.contains(name.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            unknown.dedup();
            return Err(SimulationError::UnknownModuleName { names: unknown });
        }

        if selector.is_empty() {
            debug!("Logging selector selects no modules");
        }
        self.enable_logging_impl(ModuleId::ROOT, &selector);
        Ok(())
    }

    fn enable_logging_impl(&mut self, id: ModuleId, selector: &LogSelector) {
        let node = &mut self.nodes[id.0];
        let enabled = selector.selects(&node.name);
        if enabled != node.logging_enabled {
            debug!(
                "Logging {} for module '{}'",
                if enabled { "enabled" } else { "disabled" },
                node.name
            );
        }
        node.logging_enabled = enabled;
        for child in node.children.clone() {
            self.enable_logging_impl(child, selector);
        }
    }

    /// Whether `id` currently emits log lines; false for unknown ids
    pub fn is_logging_enabled(&self, id: ModuleId) -> bool {
        self.nodes.get(id.0).map_or(false, |node| node.logging_enabled)
    }

    /// Emit a log line attributed to `id`, only if its logging is enabled
    pub fn log(&self, id: ModuleId, args: fmt::Arguments<'_>) {
        if let Some(node) = self.nodes.get(id.0) {
            if node.logging_enabled {
                info!(target: node.name.as_str(), "{}", args);
            }
        }
    }
}
