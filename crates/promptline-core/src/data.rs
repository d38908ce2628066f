//! Shared workflow data store.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Returns the data store key under which a task publishes its output.
pub fn task_output_key(position: usize) -> String {
    format!("task_{position}_output")
}

/// Returns the text substituted for a value.
///
/// Strings are used verbatim; any other value is rendered as compact JSON.
pub fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}

/// Insertion-ordered mapping from placeholder keys to values.
///
/// Writes overwrite in place (last write wins) and keep the key's original
/// position. A single store is shared by every task in a run; it carries no
/// locking and must have a single writer at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowData {
    entries: Map<String, Value>,
}

impl WorkflowData {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the substitution text for `key`.
    pub fn get_text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.entries.get(key).map(stringify)
    }

    /// Returns true if `key` has a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.entries.retain(|key, value| keep(key, value));
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a projection of this store with `overrides` applied.
    ///
    /// The shared store itself is left untouched.
    pub fn merge(&self, overrides: &WorkflowData) -> WorkflowData {
        let mut merged = self.clone();
        merged.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.clone())));
        merged
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for WorkflowData {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for WorkflowData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        data.extend(iter);
        data
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn last_write_wins_and_keeps_position() {
        let mut data = WorkflowData::new();
        data.set("b", "1");
        data.set("a", "2");
        assert_eq!(data.set("b", "3"), Some(json!("1")));

        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(data.get_text("b").as_deref(), Some("3"));
    }

    #[test]
    fn merge_does_not_mutate_shared_store() {
        let shared: WorkflowData = [("input_text", "hello"), ("task_prompt", "old")]
            .into_iter()
            .collect();
        let overrides: WorkflowData = [("task_prompt", "new"), ("current_date", "2024-01-01")]
            .into_iter()
            .collect();

        let view = shared.merge(&overrides);

        assert_eq!(view.get_text("task_prompt").as_deref(), Some("new"));
        assert_eq!(view.get_text("current_date").as_deref(), Some("2024-01-01"));
        assert_eq!(shared.get_text("task_prompt").as_deref(), Some("old"));
        assert!(!shared.contains("current_date"));
    }

    #[test]
    fn remove_preserves_order() {
        let mut data: WorkflowData = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        data.remove("a");
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn stringify_non_strings_as_json() {
        assert_eq!(stringify(&json!("plain")), "plain");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!({"a": [true]})), r#"{"a":[true]}"#);
    }

    #[test]
    fn serializes_as_ordered_object() {
        let data: WorkflowData = [("z", "last"), ("a", "first")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&data).unwrap(),
            r#"{"z":"last","a":"first"}"#
        );
    }

    #[test]
    fn task_output_keys_are_one_based_positions() {
        assert_eq!(task_output_key(1), "task_1_output");
        assert_eq!(task_output_key(12), "task_12_output");
    }
}
