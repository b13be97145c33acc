//! Catalog factories: per-entry-type parsing, storage and indexing.
//!
//! The polymorphic part (how to turn a resource file into an `Entry`) lives
//! behind the `EntryFactory` trait, one implementation per entry type. The
//! shared part (the in-memory entry dict during a build, and the two-pass
//! section save) lives in `FactorySlot`, which owns a boxed factory.

use crate::entry::Entry;
use crate::error::Result;
use crate::name_index::NameIndex;
use crate::store::BackingStore;
use std::collections::HashMap;
use std::path::Path;

/// Per-factory header persisted in the catalog's header table.
///
/// `factory_id` values are unique and stable across rebuilds; client code
/// depends on the numeric id, never on table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryHeader {
    pub factory_id: u16,
    pub section_offset: u32,
    pub name_index_offset: u32,
}

impl FactoryHeader {
    pub fn write(&self, store: &mut BackingStore) -> Result<u32> {
        let offset = store.append_u16(self.factory_id)?;
        store.append_u32(self.section_offset)?;
        store.append_u32(self.name_index_offset)?;
        Ok(offset)
    }

    pub fn read(store: &mut BackingStore) -> Result<Self> {
        Ok(FactoryHeader {
            factory_id: store.read_u16()?,
            section_offset: store.read_u32()?,
            name_index_offset: store.read_u32()?,
        })
    }

    fn encode(&self) -> [u8; 10] {
        let mut buf = [0u8; 10];
        buf[0..2].copy_from_slice(&self.factory_id.to_le_bytes());
        buf[2..6].copy_from_slice(&self.section_offset.to_le_bytes());
        buf[6..10].copy_from_slice(&self.name_index_offset.to_le_bytes());
        buf
    }
}

/// One implementation per entry type. Implementations must be cheap to share
/// across the per-class build workers.
pub trait EntryFactory: Send + Sync {
    /// Stable numeric id of this factory.
    fn factory_id(&self) -> u16;

    /// The resource class this factory consumes (scan subtree name).
    fn resource_class(&self) -> &'static str;

    /// Derive the lookup name from a class-relative path.
    ///
    /// Deterministic by design: the builder uses it to carry unchanged
    /// entries forward from the previous catalog without re-parsing.
    fn entry_name(&self, rel_path: &str) -> String {
        let file = rel_path.rsplit('/').next().unwrap_or(rel_path);
        match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => file.to_string(),
        }
    }

    /// Construct an entry from a source resource file.
    fn create_entry(&self, path: &Path, rel_path: &str) -> Result<Entry>;

    /// Read an entry back from a byte offset in the catalog.
    fn read_entry(&self, store: &mut BackingStore, offset: u32) -> Result<Entry> {
        store.seek(offset)?;
        Entry::decode(store)
    }
}

/// Build-time state of one factory: its entry dict plus the save protocol.
pub struct FactorySlot {
    factory: Box<dyn EntryFactory>,
    entries: HashMap<String, Entry>,
}

impl FactorySlot {
    pub fn new(factory: Box<dyn EntryFactory>) -> Self {
        FactorySlot {
            factory,
            entries: HashMap::new(),
        }
    }

    pub fn factory(&self) -> &dyn EntryFactory {
        self.factory.as_ref()
    }

    pub fn factory_id(&self) -> u16 {
        self.factory.factory_id()
    }

    pub fn resource_class(&self) -> &'static str {
        self.factory.resource_class()
    }

    /// Add or replace by name. O(1) amortized, any prior entry with the
    /// same name is overwritten.
    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Remove all entries with the given name. O(n), rare maintenance path.
    pub fn remove_entry(&mut self, name: &str) {
        self.entries.retain(|k, _| k != name);
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn all_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize this factory's section at the store's current position.
    ///
    /// Entries are written sequentially (sorted by name for deterministic
    /// output), the name index is built from the offsets recorded while
    /// writing, then written after the entries. Finally the header reserved
    /// at `header_offset` is patched in place.
    pub fn save(&self, store: &mut BackingStore, header_offset: u32) -> Result<FactoryHeader> {
        let section_offset = store.position()?;
        let mut index = NameIndex::new();

        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        for name in names {
            let offset = self.entries[name].encode(store)?;
            index.insert(name.as_str(), offset);
        }

        let name_index_offset = store.position()?;
        index.serialize(store)?;

        let header = FactoryHeader {
            factory_id: self.factory.factory_id(),
            section_offset,
            name_index_offset,
        };
        self.save_header(store, header_offset, &header)?;
        Ok(header)
    }

    /// Patch the reserved header slot, leaving the stream at the section end.
    fn save_header(
        &self,
        store: &mut BackingStore,
        header_offset: u32,
        header: &FactoryHeader,
    ) -> Result<()> {
        store.patch_at(header_offset, &header.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    struct DummyFactory;

    impl EntryFactory for DummyFactory {
        fn factory_id(&self) -> u16 {
            42
        }

        fn resource_class(&self) -> &'static str {
            "dummy"
        }

        fn create_entry(&self, path: &Path, rel_path: &str) -> Result<Entry> {
            let _ = path;
            Ok(Entry::new(42, self.entry_name(rel_path)))
        }
    }

    #[test]
    fn default_entry_name_strips_dirs_and_extension() {
        let f = DummyFactory;
        assert_eq!(f.entry_name("kde/konsole.desktop"), "konsole");
        assert_eq!(f.entry_name("plain"), "plain");
        assert_eq!(f.entry_name(".hidden"), ".hidden");
    }

    #[test]
    fn add_entry_overwrites_by_name() {
        let mut slot = FactorySlot::new(Box::new(DummyFactory));
        let mut first = Entry::new(42, "konsole");
        first.fields.push(("Exec".into(), "old".into()));
        let mut second = Entry::new(42, "konsole");
        second.fields.push(("Exec".into(), "new".into()));

        slot.add_entry(first);
        slot.add_entry(second);
        assert_eq!(slot.len(), 1);
        assert_eq!(slot.get("konsole").unwrap().field("Exec"), Some("new"));
    }

    #[test]
    fn remove_entry_drops_all_matches() {
        let mut slot = FactorySlot::new(Box::new(DummyFactory));
        slot.add_entry(Entry::new(42, "a"));
        slot.add_entry(Entry::new(42, "b"));
        slot.remove_entry("a");
        assert_eq!(slot.len(), 1);
        assert!(slot.get("a").is_none());
    }

    #[test]
    fn save_patches_reserved_header_and_indexes_entries() {
        let mut slot = FactorySlot::new(Box::new(DummyFactory));
        slot.add_entry(Entry::new(42, "alpha"));
        slot.add_entry(Entry::new(42, "beta"));

        let mut store = BackingStore::memory();
        // Reserve a header slot, as the catalog writer does.
        let header_offset = FactoryHeader {
            factory_id: 42,
            section_offset: 0,
            name_index_offset: 0,
        }
        .write(&mut store)
        .unwrap();

        let header = slot.save(&mut store, header_offset).unwrap();
        assert_eq!(header.factory_id, 42);
        assert_eq!(header.section_offset, 10);
        assert!(header.name_index_offset > header.section_offset);

        // The patched header must match what save returned.
        store.seek(header_offset).unwrap();
        let on_disk = FactoryHeader::read(&mut store).unwrap();
        assert_eq!(on_disk, header);

        // And the index must resolve both entries.
        store.seek(header.name_index_offset).unwrap();
        let index = NameIndex::deserialize(&mut store).unwrap();
        let offset = index.lookup("alpha").unwrap();
        let entry = slot.factory().read_entry(&mut store, offset).unwrap();
        assert_eq!(entry.name, "alpha");
        assert!(index.lookup("gamma").is_none());
    }

    #[test]
    fn read_entry_at_bad_offset_is_corrupt() {
        let mut store = BackingStore::memory();
        store.append(&[1, 2, 3]).unwrap();
        let f = DummyFactory;
        assert!(matches!(
            f.read_entry(&mut store, 1),
            Err(CatalogError::Corrupt(_))
        ));
    }
}
