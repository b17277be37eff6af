//! System variable overlay
//!
//! Sources of host-level variables consulted during lookup when
//! `include_system_variables` is enabled.

use std::collections::HashMap;

use indexmap::IndexMap;

/// A read-only source of system variables
pub trait VariableSource: Send + Sync {
    /// Look up a variable by name
    fn variable(&self, name: &str) -> Option<String>;
}

/// The host process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl VariableSource for ProcessEnvironment {
    fn variable(&self, name: &str) -> Option<String> {
        // Unset and non-UTF-8 values are both treated as absent
        std::env::var(name).ok()
    }
}

impl VariableSource for HashMap<String, String> {
    fn variable(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VariableSource for IndexMap<String, String> {
    fn variable(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
