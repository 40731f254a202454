//! Variable types produced by a socket exchange.
//!
//! This module provides the values that flow out of the client:
//! - [`VariableEntry`]: one parsed key/value pair, in the order it was received
//! - [`VariableSink`]: the seam through which a host binds entries into its
//!   own variable namespace
//! - [`VariableBindings`]: an in-memory sink that keeps every binding
//! - [`bind_entries`]: binds a sequence of entries plus the element count

use serde::{Deserialize, Serialize};

/// Name of the bookkeeping variable holding the number of bound entries.
pub const DEFAULT_COUNT_VARIABLE: &str = "ARRAYELEMENTS";

/// A single key/value pair parsed from a response body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableEntry {
    /// Variable name.
    pub key: String,
    /// Variable value (may be empty).
    pub value: String,
}

impl VariableEntry {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<(&str, &str)> for VariableEntry {
    fn from((key, value): (&str, &str)) -> Self {
        Self::new(key, value)
    }
}

/// Destination for parsed variables.
///
/// Implemented by whatever owns the variable namespace: a dialplan channel,
/// an environment map, or [`VariableBindings`].
pub trait VariableSink {
    /// Sets `key` to `value`.
    fn set_variable(&mut self, key: &str, value: &str);
}

impl VariableSink for Vec<VariableEntry> {
    fn set_variable(&mut self, key: &str, value: &str) {
        self.push(VariableEntry::new(key, value));
    }
}

/// Binds each entry into `sink`, in order, then records the number of entries
/// bound under `count_variable`.
///
/// Duplicate keys are set once per occurrence. Returns the number of entries
/// bound (the count variable itself is not included).
pub fn bind_entries<S>(sink: &mut S, entries: &[VariableEntry], count_variable: &str) -> usize
where
    S: VariableSink + ?Sized,
{
    for entry in entries {
        sink.set_variable(&entry.key, &entry.value);
    }
    sink.set_variable(count_variable, &entries.len().to_string());
    entries.len()
}

/// Ordered record of every variable binding made during one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBindings {
    bindings: Vec<VariableEntry>,
}

impl VariableBindings {
    /// Creates an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of `key`.
    ///
    /// When a key was bound more than once the most recent value wins, the
    /// same way repeated assignments to a host variable behave.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.key == key)
            .map(|b| b.value.as_str())
    }

    /// Returns every binding in the order it was made.
    pub fn iter(&self) -> impl Iterator<Item = &VariableEntry> {
        self.bindings.iter()
    }

    /// Returns the number of bindings made, including duplicates.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing has been bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Consumes the bindings, returning the underlying entries.
    pub fn into_entries(self) -> Vec<VariableEntry> {
        self.bindings
    }
}

impl VariableSink for VariableBindings {
    fn set_variable(&mut self, key: &str, value: &str) {
        self.bindings.push(VariableEntry::new(key, value));
    }
}
