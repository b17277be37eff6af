//! Resolution path tracking
//!
//! A [`ResolutionPath`] is the ordered chain of property names currently
//! being expanded. The engine pushes a name when it descends into a value
//! and pops it when that value is finished, so sibling placeholders in the
//! same value never see each other's entries and nothing outlives the
//! top-level lookup.

use std::fmt;

use indexmap::IndexSet;

const DELIMITER: &str = " -> ";

/// Ordered chain of names under expansion, root first
#[derive(Debug, Clone, Default)]
pub struct ResolutionPath {
    // A name appears at most once; a repeat is a cycle and never pushed
    names: IndexSet<String>,
}

impl ResolutionPath {
    /// The empty path a top-level lookup starts from
    pub fn root() -> Self {
        Self::default()
    }

    /// A copy of this path with `name` appended
    pub fn child(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.push(name);
        child
    }

    /// Append `name`
    pub fn push(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Remove and return the most recent name
    pub fn pop(&mut self) -> Option<String> {
        self.names.pop()
    }

    /// Whether `name` is already being expanded
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names from the root to the most recent
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Render as `a -> b -> c`
    pub fn render(&self) -> String {
        self.names().collect::<Vec<_>>().join(DELIMITER)
    }

    /// Render with `name` appended, as for the name that closes a cycle or
    /// cannot be found
    pub fn render_with(&self, name: &str) -> String {
        self.names()
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(DELIMITER)
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
