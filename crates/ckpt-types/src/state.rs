//! Insertion-ordered state dictionaries.
//!
//! A [`StateDict`] is the in-memory form of a checkpoint: every parameter name
//! maps to exactly one tensor, and iteration follows the order in which
//! entries were inserted. That order is significant; it is the axis the diff
//! engine walks, so it is never re-sorted.

use std::collections::HashMap;

use crate::error::{TypeError, TypeResult};
use crate::shape::NamedShape;
use crate::tensor::Tensor;

/// Mapping from unique parameter names to tensors, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDict {
    entries: Vec<(String, Tensor)>,
    index: HashMap<String, usize>,
}

impl StateDict {
    /// Create an empty state dict.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state dict from `(key, tensor)` pairs, keeping their order.
    ///
    /// Fails on the first repeated key.
    pub fn from_entries<K, I>(entries: I) -> TypeResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tensor)>,
    {
        let mut dict = Self::new();
        for (key, tensor) in entries {
            dict.insert(key, tensor)?;
        }
        Ok(dict)
    }

    /// Append an entry. Keys are unique; inserting an existing key is an error
    /// and leaves the dict unchanged.
    pub fn insert(&mut self, key: impl Into<String>, tensor: Tensor) -> TypeResult<()> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(TypeError::DuplicateKey(key));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, tensor));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Tensor> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Project to the ordered `(key, shape)` collection the diff engine consumes.
    pub fn shapes(&self) -> Vec<NamedShape> {
        self.entries
            .iter()
            .map(|(k, t)| NamedShape::new(k.clone(), t.shape().clone()))
            .collect()
    }

    /// Return a copy holding only the keys that start with the literal
    /// `prefix`, with the prefix removed. Keys without it are dropped; an
    /// empty prefix keeps everything.
    pub fn strip_prefix(&self, prefix: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .filter_map(|(key, tensor)| Some((key.strip_prefix(prefix)?, tensor)));
        let mut out = Self::new();
        for (key, tensor) in entries {
            // Distinct keys sharing a prefix stay distinct once it is removed.
            out.index.insert(key.to_string(), out.entries.len());
            out.entries.push((key.to_string(), tensor.clone()));
        }
        out
    }
}

impl IntoIterator for StateDict {
    type Item = (String, Tensor);
    type IntoIter = std::vec::IntoIter<(String, Tensor)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
