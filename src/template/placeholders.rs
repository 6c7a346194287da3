//! Placeholder environment.
//!
//! A flat name → value store. Scoping is done by the engine: every render
//! call snapshots the store, overlays its parameters and puts the snapshot
//! back when it returns.

use std::collections::HashMap;

/// Scalar values substituted by `[[+name]]` and `[[*name]]` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: HashMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a placeholder.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Merge many values at once. Incoming values win on collision.
    pub fn extend<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in values {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of `name`, or `default` when it is not set.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Remove a placeholder. Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut env = Placeholders::new();
        env.set("site.name", "Docs");
        assert_eq!(env.get("site.name"), Some("Docs"));
    }

    #[test]
    fn overwrite() {
        let mut env = Placeholders::new();
        env.set("x", "old");
        env.set("x", "new");
        assert_eq!(env.get("x"), Some("new"));
    }

    #[test]
    fn get_or_falls_back_to_default() {
        let mut env = Placeholders::new();
        env.set("present", "yes");
        assert_eq!(env.get_or("present", "no"), "yes");
        assert_eq!(env.get_or("absent", "no"), "no");
    }

    #[test]
    fn extend_incoming_wins() {
        let mut env = Placeholders::new();
        env.set("a", "1");
        env.set("b", "2");
        env.extend([("b", "20"), ("c", "30")]);
        assert_eq!(env.get("a"), Some("1"));
        assert_eq!(env.get("b"), Some("20"));
        assert_eq!(env.get("c"), Some("30"));
    }

    #[test]
    fn unset() {
        let mut env = Placeholders::new();
        env.set("gone", "bye");
        assert!(env.unset("gone"));
        assert_eq!(env.get("gone"), None);
        assert!(!env.unset("gone"));
    }

    #[test]
    fn snapshot_is_independent() {
        let mut env = Placeholders::new();
        env.set("x", "b");
        let snapshot = env.clone();
        env.set("x", "a");
        assert_eq!(snapshot.get("x"), Some("b"));
        assert_eq!(env.get("x"), Some("a"));
    }
}
