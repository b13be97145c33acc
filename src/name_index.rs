//! Name index: the serialized name-to-offset dictionary of one factory.
//!
//! Built once at save time from the offsets recorded while the factory's
//! entries were written. Lookups that miss the index mean "not found",
//! never "scan the section".

use crate::error::Result;
use crate::store::BackingStore;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    entries: HashMap<String, u32>,
}

impl NameIndex {
    pub fn new() -> Self {
        NameIndex::default()
    }

    /// Last write wins for duplicate names, matching `add_entry`'s
    /// overwrite semantics.
    pub fn insert(&mut self, name: impl Into<String>, offset: u32) {
        self.entries.insert(name.into(), offset);
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Layout: u32 count, then (name, u32 offset) pairs sorted by name so
    /// identical contents serialize to identical bytes.
    pub fn serialize(&self, store: &mut BackingStore) -> Result<()> {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        store.append_u32(names.len() as u32)?;
        for name in names {
            store.append_string(name)?;
            store.append_u32(self.entries[name])?;
        }
        Ok(())
    }

    pub fn deserialize(store: &mut BackingStore) -> Result<Self> {
        let count = store.read_u32()? as usize;
        let mut entries = HashMap::with_capacity(count);
        for _ in 0..count {
            let name = store.read_string()?;
            let offset = store.read_u32()?;
            entries.insert(name, offset);
        }
        Ok(NameIndex { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut index = NameIndex::new();
        index.insert("text/plain", 10);
        index.insert("text/plain", 99);
        assert_eq!(index.lookup("text/plain"), Some(99));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_index_answers_not_found() {
        let mut store = BackingStore::memory();
        NameIndex::new().serialize(&mut store).unwrap();
        store.seek(0).unwrap();
        let index = NameIndex::deserialize(&mut store).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.lookup("anything"), None);
    }

    #[test]
    fn serialize_roundtrip() {
        let mut index = NameIndex::new();
        index.insert("image/png", 40);
        index.insert("text/plain", 12);

        let mut store = BackingStore::memory();
        index.serialize(&mut store).unwrap();
        store.seek(0).unwrap();

        let loaded = NameIndex::deserialize(&mut store).unwrap();
        assert_eq!(loaded.lookup("text/plain"), Some(12));
        assert_eq!(loaded.lookup("image/png"), Some(40));
        assert_eq!(loaded.lookup("text/xml"), None);
    }

    #[test]
    fn serialization_is_sorted_and_deterministic() {
        let bytes = |pairs: &[(&str, u32)]| {
            let mut index = NameIndex::new();
            for (n, o) in pairs {
                index.insert(*n, *o);
            }
            let mut store = BackingStore::memory();
            index.serialize(&mut store).unwrap();
            let len = store.len().unwrap() as usize;
            store.seek(0).unwrap();
            store.read_bytes(len).unwrap()
        };
        let a = bytes(&[("b", 2), ("a", 1), ("c", 3)]);
        let b = bytes(&[("c", 3), ("a", 1), ("b", 2)]);
        assert_eq!(a, b);
    }
}
