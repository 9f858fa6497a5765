//! Property map types
//!
//! [`SourceMap`] holds the raw, merged input to resolution. [`Properties`]
//! is the immutable snapshot produced by a successful resolution. Both keep
//! keys in first-seen order.

use indexmap::IndexMap;
use serde::Serialize;
use std::ops::Index;

use crate::error::{Error, Result};

/// Raw key/value pairs whose values may contain placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: IndexMap<String, String>,
}

impl SourceMap {
    /// Build a source map from a single mapping
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::merged(std::iter::once(entries))
    }

    /// Merge several mappings, in priority order
    ///
    /// Later sources override earlier ones for duplicate keys. A key keeps
    /// the position at which it first appeared. The empty key is an ordinary
    /// key; no placeholder can name it.
    pub fn merged<I, S, K, V>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = IndexMap::new();

        for source in sources {
            for (key, value) in source {
                entries.insert(key.into(), value.into());
            }
        }

        Ok(Self { entries })
    }

    /// Get the raw value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over key/raw value pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fully resolved properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, String>);

impl Properties {
    pub(crate) fn from_map(map: IndexMap<String, String>) -> Self {
        Self(map)
    }

    /// Get the resolved value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over key/value pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the underlying ordered map
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }

    /// Export as a pretty-printed JSON object
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.0).map_err(|e| Error::export(e.to_string()))
    }

    /// Export as a YAML mapping
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.0).map_err(|e| Error::export(e.to_string()))
    }
}

impl<'a> Index<&'a str> for Properties {
    type Output = str;

    fn index(&self, key: &'a str) -> &str {
        self.0[key].as_str()
    }
}

impl IntoIterator for Properties {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_single_source() {
        let map = SourceMap::new([("a", "1"), ("b", "${a}")]).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some("1"));
        assert_eq!(map.get("b"), Some("${a}"));
        assert_eq!(map.get("c"), None);
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let map = SourceMap::merged([
            vec![("k", "1"), ("only_first", "x")],
            vec![("k", "2"), ("only_second", "y")],
        ])
        .unwrap();

        assert_eq!(map.get("k"), Some("2"));
        assert_eq!(map.get("only_first"), Some("x"));
        assert_eq!(map.get("only_second"), Some("y"));
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let map = SourceMap::merged([vec![("b", "1"), ("a", "1")], vec![("c", "2"), ("b", "2")]])
            .unwrap();

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(map.get("b"), Some("2"));
    }

    #[test]
    fn test_accepts_std_maps() {
        let mut env = HashMap::new();
        env.insert("env.HOME".to_string(), "/home/app".to_string());

        let map = SourceMap::merged([env]).unwrap();
        assert_eq!(map.get("env.HOME"), Some("/home/app"));
    }

    #[test]
    fn test_empty_key_is_an_ordinary_key() {
        let map = SourceMap::merged([vec![("ok", "1"), ("", "first")], vec![("", "second")]])
            .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(""), Some("second"));
        assert_eq!(map.get("ok"), Some("1"));
    }

    #[test]
    fn test_no_sources_is_empty() {
        let map = SourceMap::merged(Vec::<Vec<(String, String)>>::new()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_properties_export() {
        let mut inner = IndexMap::new();
        inner.insert("db.host".to_string(), "localhost".to_string());
        inner.insert("db.port".to_string(), "5432".to_string());
        let props = Properties::from_map(inner);

        let json = props.to_json().unwrap();
        assert!(json.contains("\"db.host\": \"localhost\""));

        let yaml = props.to_yaml().unwrap();
        assert!(yaml.contains("db.host: localhost"));
        assert!(yaml.contains("db.port: '5432'"));
    }

    #[test]
    fn test_properties_access() {
        let mut inner = IndexMap::new();
        inner.insert("a".to_string(), "1".to_string());
        let props = Properties::from_map(inner);

        assert_eq!(&props["a"], "1");
        assert!(props.contains_key("a"));
        assert_eq!(props.iter().collect::<Vec<_>>(), vec![("a", "1")]);
        assert_eq!(props.into_inner().len(), 1);
    }
}
