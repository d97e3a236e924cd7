//! Ordered, presence-aware attribute bag.
//!
//! An attribute is either absent or set. There is no "set to nothing": a
//! value that should disappear from the file is removed with
//! [`AttributeStore::remove`]. Entries keep the position of their first
//! assignment so that re-rendering a document produces stable diffs.

use serde_json::{Map, Value};

use super::value::AttrValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name`, returning the previous value. An existing entry keeps its
    /// position; a new one is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) -> Option<AttrValue> {
        let name = name.into();
        match self.entries.iter_mut().find(|(entry, _)| *entry == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Makes `name` absent again.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let index = self.entries.iter().position(|(entry, _)| entry == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The export mapping: every set attribute, in assignment order.
    pub fn to_export_mapping(&self) -> Vec<(String, AttrValue)> {
        self.entries.clone()
    }

    /// The export mapping as a JSON object, keys in assignment order.
    pub fn to_json(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for AttributeStore {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        let mut store = AttributeStore::new();
        for (name, value) in iter {
            store.insert(name, value);
        }
        store
    }
}
