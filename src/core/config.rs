//! Configuration for diagnostics of a simulation run
//!
//! Controls which modules log, where the topology and the instruction trace
//! are dumped at the end of the run, and the default log filter.

use std::path::Path;

use serde::Deserialize;

use crate::core::errors::ExportError;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Selector handed to `ModuleTree::enable_logging`
    #[serde(default)]
    pub log_selector: String,
    /// Topology JSON destination, empty to skip
    #[serde(default)]
    pub topology_dump: String,
    /// Trace JSON destination, empty to skip
    #[serde(default)]
    pub trace_dump: String,
    /// Default env_logger filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl SimulationConfig {
    /// Default configuration: no module logging and no dumps
    pub fn new() -> Self {
        Self {
            log_selector: String::new(),
            topology_dump: String::new(),
            trace_dump: String::new(),
            log_level: default_log_level(),
        }
    }

    pub fn with_log_selector(mut self, selector: &str) -> Self {
        self.log_selector = selector.to_string();
        self
    }

    pub fn with_topology_dump(mut self, destination: &str) -> Self {
        self.topology_dump = destination.to_string();
        self
    }

    pub fn with_trace_dump(mut self, destination: &str) -> Self {
        self.trace_dump = destination.to_string();
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    /// Parse a JSON object; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Install env_logger with this configuration's default filter.
    ///
    /// Returns false if a logger was already installed.
    pub fn init_logger(&self) -> bool {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&self.log_level))
            .try_init()
            .is_ok()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.log_selector.is_empty());
        assert!(config.topology_dump.is_empty());
        assert!(config.trace_dump.is_empty());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::new()
            .with_log_selector("fetch,decode")
            .with_topology_dump("topology.json")
            .with_trace_dump("trace.json")
            .with_log_level("debug");

        assert_eq!(config.log_selector, "fetch,decode");
        assert_eq!(config.topology_dump, "topology.json");
        assert_eq!(config.trace_dump, "trace.json");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json_str(r#"{ "log_selector": "all" }"#).unwrap();
        assert_eq!(config, SimulationConfig::new().with_log_selector("all"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            SimulationConfig::from_json_str("{ log_selector"),
            Err(ExportError::Json(_))
        ));
    }
}
