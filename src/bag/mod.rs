//! Keyed parameter container for server, cookie, query and form values.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

/// An insertion-ordered map from parameter names to string values.
///
/// Keys are compared exactly (unlike header names).
///
/// # Examples
///
/// ```
/// use snapshot_http::bag::ParameterBag;
///
/// let mut bag: ParameterBag = [("page", "1")].into_iter().collect();
/// bag.add([("page", "2"), ("sort", "asc")]);
///
/// assert_eq!(bag.get("page"), Some("2"));
/// assert_eq!(bag.keys().collect::<Vec<_>>(), ["page", "sort"]);
/// assert_eq!(bag.get_or("limit", "20"), "20");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBag {
    entries: Vec<(String, String)>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Parameter names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Merges `parameters` in; existing keys are overwritten in place.
    pub fn add<I, K, V>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in parameters {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].1.as_str())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        bag.add(iter);
        bag
    }
}

struct BagVisitor;

impl<'de> Visitor<'de> for BagVisitor {
    type Value = ParameterBag;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of string parameters")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut bag = ParameterBag::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            bag.set(key, value);
        }
        Ok(bag)
    }
}

/// Entries keep the order they appear in the input.
impl<'de> Deserialize<'de> for ParameterBag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BagVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_has_remove() {
        let mut bag = ParameterBag::new();
        assert!(bag.is_empty());
        assert_eq!(bag.get("a"), None);

        bag.set("a", "1");
        bag.set("b", "2");
        assert!(bag.has("a"));
        assert!(!bag.has("A"));
        assert_eq!(bag.get("b"), Some("2"));
        assert_eq!(bag.len(), 2);

        assert_eq!(bag.remove("a"), Some("1".to_owned()));
        assert_eq!(bag.remove("a"), None);
        assert_eq!(bag.keys().collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn add_replaces_and_appends() {
        let mut bag: ParameterBag = [("x", "1"), ("y", "2")].into_iter().collect();
        bag.add([("y", "20"), ("z", "30")]);
        assert_eq!(
            bag.iter().collect::<Vec<_>>(),
            [("x", "1"), ("y", "20"), ("z", "30")]
        );
    }

    #[test]
    fn get_or_falls_back() {
        let bag: ParameterBag = [("present", "yes")].into_iter().collect();
        assert_eq!(bag.get_or("present", "no"), "yes");
        assert_eq!(bag.get_or("absent", "no"), "no");
    }

    #[test]
    fn deserialize_from_json_object() {
        let bag: ParameterBag =
            serde_json::from_str(r#"{"session": "abc", "theme": "dark"}"#).unwrap();
        assert_eq!(bag.get("session"), Some("abc"));
        assert_eq!(bag.get("theme"), Some("dark"));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn deserialize_keeps_input_order() {
        let bag: ParameterBag =
            serde_json::from_str(r#"{"zeta": "1", "alpha": "2", "mid": "3"}"#).unwrap();
        assert_eq!(bag.keys().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);

        let bag: ParameterBag = serde_json::from_str(r#"{"k": "first", "k": "second"}"#).unwrap();
        assert_eq!(bag.iter().collect::<Vec<_>>(), [("k", "second")]);

        assert!(serde_json::from_str::<ParameterBag>(r#"["not", "a", "map"]"#).is_err());
    }
}
