//! Dependency paths used to filter notifications.

use std::fmt;

use serde_json::Value;
use smallvec::SmallVec;

/// A path into a store's state that a listener depends on.
///
/// A single segment names a top-level property. Longer paths address nested
/// values, which is how dependencies keep working after their store has been
/// folded into a combined store under its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency(SmallVec<[String; 2]>);

impl Dependency {
    /// A top-level property of the state.
    pub fn key(key: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(key.into());
        Self(segments)
    }

    /// A nested path, outermost segment first.
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Resolve this path against a state value.
    ///
    /// Array elements are addressed by their decimal index.
    pub fn lookup<'a>(&self, state: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(state, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Whether the addressed value differs between two states.
    pub fn changed(&self, old: &Value, new: &Value) -> bool {
        self.lookup(old) != self.lookup(new)
    }

    /// The same path nested under `namespace`.
    pub(crate) fn namespaced(&self, namespace: &str) -> Self {
        let mut segments = SmallVec::with_capacity(self.0.len() + 1);
        segments.push(namespace.to_string());
        segments.extend(self.0.iter().cloned());
        Self(segments)
    }
}

impl From<&str> for Dependency {
    fn from(key: &str) -> Self {
        Self::key(key)
    }
}

impl From<String> for Dependency {
    fn from(key: String) -> Self {
        Self::key(key)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_lookup() {
        let state = json!({"a": 1, "b": 2});
        assert_eq!(Dependency::key("a").lookup(&state), Some(&json!(1)));
        assert_eq!(Dependency::key("c").lookup(&state), None);
    }

    #[test]
    fn nested_and_indexed_lookup() {
        let state = json!({"todo": {"items": ["x", "y"]}});
        let dep = Dependency::path(["todo", "items", "1"]);
        assert_eq!(dep.lookup(&state), Some(&json!("y")));
        assert_eq!(dep.to_string(), "todo.items.1");
    }

    #[test]
    fn scalar_state_never_changes_a_property() {
        let dep = Dependency::key("a");
        assert!(!dep.changed(&json!(1), &json!(2)));
    }

    #[test]
    fn added_property_counts_as_change() {
        let dep = Dependency::key("a");
        assert!(dep.changed(&json!({}), &json!({"a": null})));
        assert!(!dep.changed(&json!({"a": [1]}), &json!({"a": [1]})));
    }

    #[test]
    fn namespacing_prefixes_the_path() {
        let dep = Dependency::key("a").namespaced("X");
        assert_eq!(dep.segments(), ["X".to_string(), "a".to_string()]);
        assert!(dep.changed(&json!({"X": {"a": 1}}), &json!({"X": {"a": 2}})));
    }
}
