//! Insertion-ordered sprite name → [`SpriteMeta`] map

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

use super::SpriteMeta;

/// Sub-metas of an atlas, keyed by sprite name
///
/// Iteration follows insertion order so that serialized records and import
/// output are reproducible.
#[derive(Debug, Clone, Default)]
pub struct SubMetas {
    /// Entries in insertion order
    entries: Vec<(String, SpriteMeta)>,
    /// Name -> index into `entries`
    index: HashMap<String, usize>,
}

impl SubMetas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a meta under `name`
    ///
    /// Replacing an existing name keeps its position and returns the old meta.
    pub fn insert(&mut self, name: impl Into<String>, meta: SpriteMeta) -> Option<SpriteMeta> {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            return Some(std::mem::replace(&mut self.entries[i].1, meta));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, meta));
        None
    }

    pub fn get(&self, name: &str) -> Option<&SpriteMeta> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SpriteMeta> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Remove a meta by name
    pub fn remove(&mut self, name: &str) -> Option<SpriteMeta> {
        let i = self.index.remove(name)?;
        let (_, meta) = self.entries.remove(i);
        // Shift indices of everything after the removed entry
        for (n, _) in &self.entries[i..] {
            if let Some(slot) = self.index.get_mut(n) {
                *slot -= 1;
            }
        }
        Some(meta)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sprite names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpriteMeta)> {
        self.entries.iter().map(|(name, meta)| (name.as_str(), meta))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut SpriteMeta)> {
        self.entries
            .iter_mut()
            .map(|(name, meta)| (name.as_str(), meta))
    }
}

impl IntoIterator for SubMetas {
    type Item = (String, SpriteMeta);
    type IntoIter = std::vec::IntoIter<(String, SpriteMeta)>;

    /// Consume into `(name, meta)` pairs in insertion order
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for SubMetas {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, meta) in &self.entries {
            map.serialize_entry(name, meta)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order() {
        let mut metas = SubMetas::new();
        metas.insert("zebra", SpriteMeta::new());
        metas.insert("apple", SpriteMeta::new());
        metas.insert("mango", SpriteMeta::new());

        let names: Vec<_> = metas.names().collect();
        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut metas = SubMetas::new();
        let first = SpriteMeta::new();
        let first_uuid = first.uuid;
        metas.insert("a", first);
        metas.insert("b", SpriteMeta::new());

        let replacement = SpriteMeta::new();
        let replacement_uuid = replacement.uuid;
        let old = metas.insert("a", replacement).unwrap();

        assert_eq!(old.uuid, first_uuid);
        assert_eq!(metas.len(), 2);
        assert_eq!(metas.names().next(), Some("a"));
        assert_eq!(metas.get("a").unwrap().uuid, replacement_uuid);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut metas = SubMetas::new();
        metas.insert("a", SpriteMeta::new());
        metas.insert("b", SpriteMeta::new());
        let c_uuid = {
            let c = SpriteMeta::new();
            let uuid = c.uuid;
            metas.insert("c", c);
            uuid
        };

        assert!(metas.remove("a").is_some());
        assert!(metas.remove("a").is_none());
        assert!(!metas.contains("a"));
        assert_eq!(metas.get("c").unwrap().uuid, c_uuid);
        assert_eq!(metas.names().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_into_iter_in_order() {
        let mut metas = SubMetas::new();
        metas.insert("b", SpriteMeta::new());
        metas.insert("a", SpriteMeta::new());
        let names: Vec<_> = metas.into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_serialize_in_order() {
        let mut metas = SubMetas::new();
        metas.insert("second", SpriteMeta::new());
        metas.insert("first", SpriteMeta::new());

        let value = serde_json::to_value(&metas).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["second", "first"]);
    }
}
