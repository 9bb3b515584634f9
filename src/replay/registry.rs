//! Read/write access to the host's declared inputs

use std::collections::BTreeMap;

use crate::bookmark::{InputSnapshot, InputValue};

/// The host's input registry, as seen by the replay layer.
///
/// The reactive engine behind it is not owned here: the trigger only reads
/// current values for capture and seeds initial values on restore.
pub trait InputRegistry {
    /// Identifiers of every declared input.
    fn declared_ids(&self) -> Vec<String>;

    fn value(&self, id: &str) -> Option<InputValue>;

    /// Replace the initial value of a declared input before the first
    /// computation. Returns `false` for undeclared identifiers.
    fn seed(&mut self, id: &str, value: InputValue) -> bool;

    /// Update a live value. Returns `false` for undeclared identifiers.
    fn set(&mut self, id: &str, value: InputValue) -> bool;

    fn is_declared(&self, id: &str) -> bool {
        self.value(id).is_some()
    }

    /// Current values of every declared input
    fn snapshot(&self) -> InputSnapshot {
        self.declared_ids()
            .into_iter()
            .filter_map(|id| self.value(&id).map(|value| (id, value)))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct InputSlot {
    default: InputValue,
    value: InputValue,
}

/// Registry holding declared inputs and their defaults in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    inputs: BTreeMap<String, InputSlot>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an input with its default value.
    pub fn declare(&mut self, id: impl Into<String>, default: impl Into<InputValue>) {
        let default = default.into();
        self.inputs.insert(
            id.into(),
            InputSlot {
                value: default.clone(),
                default,
            },
        );
    }

    pub fn with_input(mut self, id: impl Into<String>, default: impl Into<InputValue>) -> Self {
        self.declare(id, default);
        self
    }

    pub fn default_of(&self, id: &str) -> Option<&InputValue> {
        self.inputs.get(id).map(|slot| &slot.default)
    }

    /// Put every input back to its declared default.
    pub fn reset(&mut self) {
        for slot in self.inputs.values_mut() {
            slot.value = slot.default.clone();
        }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl FromIterator<(String, InputValue)> for MemoryRegistry {
    fn from_iter<I: IntoIterator<Item = (String, InputValue)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (id, default) in iter {
            registry.declare(id, default);
        }
        registry
    }
}

impl InputRegistry for MemoryRegistry {
    fn declared_ids(&self) -> Vec<String> {
        self.inputs.keys().cloned().collect()
    }

    fn value(&self, id: &str) -> Option<InputValue> {
        self.inputs.get(id).map(|slot| slot.value.clone())
    }

    fn seed(&mut self, id: &str, value: InputValue) -> bool {
        self.set(id, value)
    }

    fn set(&mut self, id: &str, value: InputValue) -> bool {
        match self.inputs.get_mut(id) {
            Some(slot) => {
                slot.value = value;
                true
            }
            None => false,
        }
    }

    fn is_declared(&self, id: &str) -> bool {
        self.inputs.contains_key(id)
    }
}
