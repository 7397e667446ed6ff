//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a thread's
//! registration index where a plan node index is expected, and make function
//! signatures more expressive.

use std::fmt;

/// Thread registration index (0-indexed)
///
/// Dense index assigned to a thread when it first obtains its event container
/// within a measurement window. This is NOT the OS thread id: it is stable,
/// small, and restarts from zero after every window reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadIndex(pub u32);

impl ThreadIndex {
    /// Index into per-thread storage.
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ThreadIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plan node index
///
/// Identifies the operator (execution-plan DAG node) that produced an event.
/// Doubles as the event payload in the export stream and as the event tag:
/// operator events are tagged with the decimal form of their node index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorIndex(pub usize);

impl OperatorIndex {
    /// The event tag under which this operator's timeline is recorded.
    #[must_use]
    pub fn as_tag(self) -> String {
        self.0.to_string()
    }

    /// Parse a tag back into a node index. Returns `None` for tags that do
    /// not encode one (non-operator timelines).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.parse().ok().map(Self)
    }
}

impl fmt::Display for OperatorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
