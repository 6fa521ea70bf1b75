//! Backend-agnostic equality queries and set/unset updates
//!
//! Field names here are always logical names; translation to physical names
//! happens in [`crate::translate`].

use serde_json::Value;

/// Conjunction of `field == value` predicates. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogicalQuery {
    predicates: Vec<(String, Value)>,
}

impl LogicalQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate. Re-adding a field replaces its value
    /// without moving it.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.predicates.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.predicates.push((field, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn predicates(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.predicates.iter().map(|(f, v)| (f.as_str(), v))
    }
}

/// A single field instruction within a [`LogicalUpdate`]
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Set(Value),
    Unset,
}

/// Ordered field mutations. The last instruction for a field wins and keeps
/// the position of the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogicalUpdate {
    assignments: Vec<(String, UpdateValue)>,
}

impl LogicalUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field.into(), UpdateValue::Set(value.into()))
    }

    pub fn unset(self, field: impl Into<String>) -> Self {
        self.push(field.into(), UpdateValue::Unset)
    }

    fn push(mut self, field: String, value: UpdateValue) -> Self {
        match self.assignments.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((field, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn assignments(&self) -> impl Iterator<Item = (&str, &UpdateValue)> {
        self.assignments.iter().map(|(f, v)| (f.as_str(), v))
    }

    pub fn get(&self, field: &str) -> Option<&UpdateValue> {
        self.assignments
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v)
    }
}
