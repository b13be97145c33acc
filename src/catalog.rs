//! Read-mode catalog: open the backing store, read the header table, answer
//! lookups through the per-factory name indexes.
//!
//! A missing file, a zero-byte file or a version mismatch all degrade to an
//! empty in-memory catalog. A not-yet-built catalog and an empty one are
//! indistinguishable to callers, and opening never fails hard.
//!
//! Once a handle is open its view is immutable: a rebuild commits by
//! renaming a new file over the old path, so an open handle keeps reading
//! the old, self-consistent bytes until it is reopened.

use crate::constants::{CATALOG_VERSION, HEADER_BASE_LEN};
use crate::entry::Entry;
use crate::error::{CatalogError, Result};
use crate::factories::factory_id_for_class;
use crate::factory::FactoryHeader;
use crate::ledger::TimestampLedger;
use crate::name_index::NameIndex;
use crate::store::BackingStore;
use std::path::Path;
use std::sync::{Mutex, RwLock};

struct FactoryView {
    header: FactoryHeader,
    /// Deserialized lazily at first enquiry. GUI-bound processes query only
    /// a handful of factories, so indexes are not loaded at open time.
    index: RwLock<Option<NameIndex>>,
}

pub struct Catalog {
    store: Mutex<BackingStore>,
    version: u32,
    ledger_offset: u32,
    factories: Vec<FactoryView>,
}

impl Catalog {
    /// Open the catalog at `path` for lookups. Never fails: anything that
    /// means "no usable catalog" degrades to an empty one.
    pub fn open(path: &Path) -> Catalog {
        match BackingStore::open(path).and_then(Catalog::from_store) {
            Ok(catalog) => catalog,
            Err(e) if e.means_no_catalog() => {
                log::info!("no catalog at {}: {}; using empty catalog", path.display(), e);
                Catalog::empty()
            }
            Err(e) => {
                log::warn!(
                    "failed to open catalog at {}: {}; using empty catalog",
                    path.display(),
                    e
                );
                Catalog::empty()
            }
        }
    }

    /// An always-valid catalog with zero factories.
    pub fn empty() -> Catalog {
        Catalog {
            store: Mutex::new(BackingStore::empty_catalog()),
            version: CATALOG_VERSION,
            ledger_offset: HEADER_BASE_LEN,
            factories: Vec::new(),
        }
    }

    /// Parse the header table from an already-open store. Unlike `open`,
    /// errors propagate; the builder uses this to detect corruption.
    pub fn from_store(mut store: BackingStore) -> Result<Catalog> {
        store.seek(0)?;
        let version = store.read_u32()?;
        if version != CATALOG_VERSION {
            return Err(CatalogError::VersionMismatch {
                found: version,
                expected: CATALOG_VERSION,
            });
        }
        let factory_count = store.read_u16()?;
        let ledger_offset = store.read_u32()?;

        let mut factories = Vec::with_capacity(factory_count as usize);
        let mut previous_offset = 0u32;
        for _ in 0..factory_count {
            let header = FactoryHeader::read(&mut store)?;
            // Sections are non-overlapping byte ranges in id registration
            // order; a header table violating that is structural damage.
            if header.section_offset <= previous_offset
                || header.name_index_offset < header.section_offset
            {
                return Err(CatalogError::Corrupt(
                    "factory sections out of order".into(),
                ));
            }
            previous_offset = header.section_offset;
            factories.push(FactoryView {
                header,
                index: RwLock::new(None),
            });
        }

        Ok(Catalog {
            store: Mutex::new(store),
            version,
            ledger_offset,
            factories,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn factory_headers(&self) -> Vec<FactoryHeader> {
        self.factories.iter().map(|v| v.header).collect()
    }

    /// Look up an entry by resource class name ("services", "mimetypes",
    /// "applications") and entry name.
    pub fn lookup(&self, class: &str, name: &str) -> Result<Option<Entry>> {
        match factory_id_for_class(class) {
            Some(id) => self.lookup_id(id, name),
            None => Ok(None),
        }
    }

    /// Look up an entry by stable factory id and entry name.
    pub fn lookup_id(&self, factory_id: u16, name: &str) -> Result<Option<Entry>> {
        let Some(view) = self.view(factory_id) else {
            return Ok(None);
        };
        let Some(offset) = self.index_lookup(view, name)? else {
            return Ok(None);
        };
        let mut store = self.store.lock().unwrap();
        store.seek(offset)?;
        Ok(Some(Entry::decode(&mut store)?))
    }

    /// Number of entries a factory's index holds (0 for unknown factories).
    pub fn entry_count(&self, factory_id: u16) -> Result<usize> {
        let Some(view) = self.view(factory_id) else {
            return Ok(0);
        };
        self.with_index(view, |index| index.len())
    }

    /// Names in a factory's index, unordered.
    pub fn entry_names(&self, factory_id: u16) -> Result<Vec<String>> {
        let Some(view) = self.view(factory_id) else {
            return Ok(Vec::new());
        };
        self.with_index(view, |index| {
            index.names().map(|n| n.to_string()).collect()
        })
    }

    /// Lazily enumerate a factory's section. The iterator is finite and
    /// restartable by calling `all_entries` again.
    pub fn all_entries(&self, factory_id: u16) -> EntryIter<'_> {
        let (next, end) = match self.view(factory_id) {
            Some(view) => (view.header.section_offset, view.header.name_index_offset),
            None => (0, 0),
        };
        EntryIter {
            catalog: self,
            next,
            end,
        }
    }

    /// Read the timestamp ledger. Only the builder cares; normal lookups
    /// never touch it.
    pub fn load_ledger(&self) -> Result<TimestampLedger> {
        let mut store = self.store.lock().unwrap();
        store.seek(self.ledger_offset)?;
        TimestampLedger::load(&mut store)
    }

    fn view(&self, factory_id: u16) -> Option<&FactoryView> {
        self.factories
            .iter()
            .find(|v| v.header.factory_id == factory_id)
    }

    fn index_lookup(&self, view: &FactoryView, name: &str) -> Result<Option<u32>> {
        self.with_index(view, |index| index.lookup(name))
    }

    fn with_index<T>(&self, view: &FactoryView, f: impl FnOnce(&NameIndex) -> T) -> Result<T> {
        {
            let guard = view.index.read().unwrap();
            if let Some(index) = guard.as_ref() {
                return Ok(f(index));
            }
        }
        let index = {
            let mut store = self.store.lock().unwrap();
            store.seek(view.header.name_index_offset)?;
            NameIndex::deserialize(&mut store)?
        };
        let result = f(&index);
        *view.index.write().unwrap() = Some(index);
        Ok(result)
    }
}

/// Sequential decoder over one factory's entry section.
pub struct EntryIter<'a> {
    catalog: &'a Catalog,
    next: u32,
    end: u32,
}

impl Iterator for EntryIter<'_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let mut store = self.catalog.store.lock().unwrap();
        let result = store.seek(self.next).and_then(|_| Entry::decode(&mut store));
        match result {
            Ok(entry) => {
                match store.position() {
                    Ok(pos) => self.next = pos,
                    Err(e) => {
                        self.next = self.end;
                        return Some(Err(e));
                    }
                }
                Some(Ok(entry))
            }
            Err(e) => {
                // Stop after the first structural failure.
                self.next = self.end;
                Some(Err(e))
            }
        }
    }
}
