//! Transport-neutral call metadata
//!
//! An ordered, multi-valued mapping with ASCII-lowercased keys. HTTP headers
//! and gRPC metadata are both projected into this shape before reaching an
//! [`AuthService`](crate::AuthService).

/// Metadata key carrying credentials in both directions
pub const AUTHORIZATION: &str = "authorization";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    entries: Vec<(String, String)>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata carrying a single `authorization` value
    pub fn with_authorization(value: impl Into<String>) -> Self {
        let mut metadata = Self::new();
        metadata.append(AUTHORIZATION, value);
        metadata
    }

    /// Add a value, keeping any existing values for the key
    pub fn append(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .push((key.as_ref().to_ascii_lowercase(), value.into()));
    }

    /// Replace all values for the key with a single value
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        let key = key.as_ref().to_ascii_lowercase();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, value.into()));
    }

    /// First value for the key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).next()
    }

    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// First `authorization` value
    pub fn authorization(&self) -> Option<&str> {
        self.get(AUTHORIZATION)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for CallMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, value) in iter {
            metadata.append(key, value);
        }
        metadata
    }
}
