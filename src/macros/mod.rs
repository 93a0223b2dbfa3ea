//! Logging helpers for module logic.

/// Emit a log line on behalf of a module, honoring its logging flag.
///
/// # Example
/// ```rust
/// use portsim::module_log;
/// use portsim::core::modules::tree::ModuleTree;
///
/// let mut tree = ModuleTree::new("core");
/// let fetch = tree.add_module(tree.root(), "fetch").unwrap();
/// tree.enable_logging("fetch").unwrap();
/// module_log!(tree, fetch, "fetched pc={:#x}", 0x400u64);
/// ```
#[macro_export]
macro_rules! module_log {
    ($tree:expr, $module:expr, $($arg:tt)+) => {
        $tree.log($module, format_args!($($arg)+))
    };
}
