//! Input snapshots and exclusion sets

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::value::InputValue;

/// Identifier of the built-in bookmark button. Never captured.
pub const BOOKMARK_BUTTON_ID: &str = "._bookmark_";

/// Values contributed by manual-state hooks, keyed by name.
pub type StateValues = BTreeMap<String, InputValue>;

/// Input values at a point in time, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSnapshot {
    inputs: BTreeMap<String, InputValue>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<InputValue>) {
        self.inputs.insert(id.into(), value.into());
    }

    pub fn with(mut self, id: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn get(&self, id: &str) -> Option<&InputValue> {
        self.inputs.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<InputValue> {
        self.inputs.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inputs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InputValue)> {
        self.inputs.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    /// Copy of this snapshot without the excluded identifiers
    pub fn without(&self, exclusions: &Exclusions) -> Self {
        self.inputs
            .iter()
            .filter(|(id, _)| !exclusions.contains(id))
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect()
    }
}

impl FromIterator<(String, InputValue)> for InputSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, InputValue)>>(iter: I) -> Self {
        Self {
            inputs: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for InputSnapshot {
    type Item = (String, InputValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, InputValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inputs.into_iter()
    }
}

/// Input identifiers that are never captured.
///
/// The bookmark button is always part of the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusions {
    ids: BTreeSet<String>,
}

impl Default for Exclusions {
    fn default() -> Self {
        Self {
            ids: BTreeSet::from([BOOKMARK_BUTTON_ID.to_string()]),
        }
    }
}

impl Exclusions {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut exclusions = Self::default();
        exclusions.extend(ids);
        exclusions
    }

    pub fn extend<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_orders_ids() {
        let snapshot = InputSnapshot::new()
            .with("omega", 1)
            .with("delta", 1)
            .with("length", 100);
        let ids: Vec<&str> = snapshot.ids().collect();
        assert_eq!(ids, vec!["delta", "length", "omega"]);
    }

    #[test]
    fn test_without_drops_excluded() {
        let snapshot = InputSnapshot::new()
            .with("a", 1)
            .with("secret", "pw")
            .with(BOOKMARK_BUTTON_ID, 3);
        let filtered = snapshot.without(&Exclusions::new(["secret"]));
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains("a"));
    }

    #[test]
    fn test_bookmark_button_always_excluded() {
        let exclusions = Exclusions::new(Vec::<String>::new());
        assert!(exclusions.contains(BOOKMARK_BUTTON_ID));
    }
}
