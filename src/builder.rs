//! Build-mode orchestration: scan results in, committed catalog out.
//!
//! The builder owns one `FactorySlot` per registered factory, consults the
//! previous catalog's timestamp ledger to skip unchanged files, parses the
//! rest (fanned out per resource class), and serializes everything into a
//! replacement store that atomically takes over on commit. A build that dies
//! midway leaves the committed catalog untouched.
//!
//! Mutual exclusion across builder invocations is the caller's job (advisory
//! lock); within one build each resource class is written by exactly one
//! worker.

use crate::catalog::Catalog;
use crate::constants::CATALOG_VERSION;
use crate::error::{CatalogError, Result};
use crate::factory::{EntryFactory, FactoryHeader, FactorySlot};
use crate::ledger::TimestampLedger;
use crate::scanner::ScanItem;
use crate::store::BackingStore;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What one build did. `parsed` counts parser invocations, `reused` entries
/// carried forward from the previous catalog, `skipped_bad` malformed files
/// that were logged and dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub parsed: usize,
    pub reused: usize,
    pub skipped_bad: usize,
    pub entries: usize,
    pub built_at: String,
}

#[derive(Default)]
struct ClassCounters {
    parsed: usize,
    reused: usize,
    skipped_bad: usize,
    records: Vec<(String, String, u32)>,
}

pub struct CatalogBuilder {
    db_path: PathBuf,
    slots: Vec<FactorySlot>,
    ledger: TimestampLedger,
}

impl CatalogBuilder {
    pub fn new(db_path: PathBuf, factories: Vec<Box<dyn EntryFactory>>) -> Self {
        CatalogBuilder {
            db_path,
            slots: factories.into_iter().map(FactorySlot::new).collect(),
            ledger: TimestampLedger::new(),
        }
    }

    pub fn slot(&self, factory_id: u16) -> Option<&FactorySlot> {
        self.slots.iter().find(|s| s.factory_id() == factory_id)
    }

    pub fn slot_mut(&mut self, factory_id: u16) -> Option<&mut FactorySlot> {
        self.slots.iter_mut().find(|s| s.factory_id() == factory_id)
    }

    pub fn ledger(&self) -> &TimestampLedger {
        &self.ledger
    }

    /// Run a full build pass over the scanned items and commit the result.
    pub fn build(&mut self, items: &[ScanItem]) -> Result<BuildReport> {
        self.build_with_progress(items, |_, _| {})
    }

    /// Like `build`, reporting `(done, total)` after each processed file.
    pub fn build_with_progress<F>(&mut self, items: &[ScanItem], progress: F) -> Result<BuildReport>
    where
        F: Fn(usize, usize) + Sync,
    {
        let previous = self.open_previous();
        let old_ledger = match &previous {
            Some(catalog) => catalog.load_ledger().unwrap_or_else(|e| {
                log::warn!("discarding unreadable ledger: {}; forcing full re-scan", e);
                TimestampLedger::new()
            }),
            None => TimestampLedger::new(),
        };

        // One worker per resource class, each writing into its own slot.
        let per_slot: Vec<Vec<&ScanItem>> = self
            .slots
            .iter()
            .map(|slot| {
                items
                    .iter()
                    .filter(|i| i.resource_class == slot.resource_class())
                    .collect()
            })
            .collect();

        let total = per_slot.iter().map(|v| v.len()).sum::<usize>();
        let done = AtomicUsize::new(0);
        let previous_ref = previous.as_ref();
        let old_ledger_ref = &old_ledger;
        let progress_ref = &progress;

        let counters: Vec<ClassCounters> = self
            .slots
            .par_iter_mut()
            .zip(per_slot.into_par_iter())
            .map(|(slot, class_items)| {
                let mut counters = ClassCounters::default();
                for item in class_items {
                    process_item(slot, item, old_ledger_ref, previous_ref, &mut counters)?;
                    progress_ref(done.fetch_add(1, Ordering::Relaxed) + 1, total);
                }
                Ok(counters)
            })
            .collect::<Result<Vec<_>>>()?;

        // The new ledger contains only paths seen by this scan; anything
        // that vanished from the filesystem vanishes from the ledger too.
        self.ledger = TimestampLedger::new();
        let mut report = BuildReport {
            built_at: chrono::Utc::now().to_rfc3339(),
            ..BuildReport::default()
        };
        for c in counters {
            report.parsed += c.parsed;
            report.reused += c.reused;
            report.skipped_bad += c.skipped_bad;
            for (class, path, mtime) in c.records {
                self.ledger.record_mtime(&class, &path, mtime);
            }
        }
        report.entries = self.slots.iter().map(|s| s.len()).sum();

        // Drop the read handle before replacing the file.
        drop(previous);
        self.commit()?;

        log::info!(
            "catalog changed: {} entries ({} parsed, {} reused, {} skipped)",
            report.entries,
            report.parsed,
            report.reused,
            report.skipped_bad
        );
        Ok(report)
    }

    /// Serialize header, factory sections and ledger into `store`.
    /// Offsets are patched back into the reserved header slots once the
    /// variable-length data has been written.
    pub fn write_to(&self, store: &mut BackingStore) -> Result<()> {
        store.append_u32(CATALOG_VERSION)?;
        let count = u16::try_from(self.slots.len())
            .map_err(|_| CatalogError::Corrupt("too many factories".into()))?;
        store.append_u16(count)?;
        let ledger_offset_slot = store.append_u32(0)?;

        // Reserve one header per factory; offsets are patched after the
        // sections are written.
        let mut header_slots = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let reserved = FactoryHeader {
                factory_id: slot.factory_id(),
                section_offset: 0,
                name_index_offset: 0,
            };
            header_slots.push(reserved.write(store)?);
        }

        for (slot, header_offset) in self.slots.iter().zip(header_slots) {
            slot.save(store, header_offset)?;
        }

        let ledger_offset = store.position()?;
        self.ledger.save(store)?;
        store.patch_at(ledger_offset_slot, &ledger_offset.to_le_bytes())?;
        Ok(())
    }

    fn open_previous(&self) -> Option<Catalog> {
        match BackingStore::open(&self.db_path).and_then(Catalog::from_store) {
            Ok(catalog) => Some(catalog),
            Err(CatalogError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("previous catalog unusable: {}; forcing full rebuild", e);
                None
            }
        }
    }

    fn commit(&self) -> Result<()> {
        let mut store = BackingStore::create(&self.db_path)?;
        self.write_to(&mut store)?;
        store.truncate_and_replace()
    }
}

fn process_item(
    slot: &mut FactorySlot,
    item: &ScanItem,
    old_ledger: &TimestampLedger,
    previous: Option<&Catalog>,
    counters: &mut ClassCounters,
) -> Result<()> {
    let path_key = item.path.to_string_lossy().into_owned();

    // Unchanged since the last build: carry the old entry forward without
    // invoking the parser. mtime 0 means "unknown", never a match.
    if item.mtime != 0 && old_ledger.mtime(&item.resource_class, &path_key) == item.mtime {
        let name = slot.factory().entry_name(&item.rel_path);
        let carried = previous.and_then(|catalog| {
            catalog
                .lookup_id(slot.factory_id(), &name)
                .unwrap_or_else(|e| {
                    log::warn!("re-parsing {}: old entry unreadable: {}", path_key, e);
                    None
                })
        });
        if let Some(entry) = carried {
            slot.add_entry(entry);
            counters.reused += 1;
            counters
                .records
                .push((item.resource_class.clone(), path_key, item.mtime));
            return Ok(());
        }
    }

    match slot.factory().create_entry(&item.path, &item.rel_path) {
        Ok(entry) => {
            slot.add_entry(entry);
            counters.parsed += 1;
            counters
                .records
                .push((item.resource_class.clone(), path_key, item.mtime));
        }
        Err(CatalogError::Parse { path, reason }) => {
            // One bad file never aborts the build.
            log::warn!("skipping {}: {}", path.display(), reason);
            counters.skipped_bad += 1;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::factories::default_factories;

    #[test]
    fn in_memory_write_read_roundtrip() {
        let mut builder = CatalogBuilder::new(PathBuf::from("/nonexistent"), default_factories());
        let slot = builder.slot_mut(2).unwrap();
        let mut entry = Entry::new(2, "text/plain");
        entry.fields.push(("Comment".into(), "Plain text".into()));
        slot.add_entry(entry);

        let mut store = BackingStore::memory();
        builder.write_to(&mut store).unwrap();

        let catalog = Catalog::from_store(store).unwrap();
        assert_eq!(catalog.factory_headers().len(), 3);
        let found = catalog.lookup("mimetypes", "text/plain").unwrap().unwrap();
        assert_eq!(found.field("Comment"), Some("Plain text"));
        assert!(catalog.lookup("mimetypes", "text/xml").unwrap().is_none());
    }

    #[test]
    fn section_offsets_strictly_increase() {
        let mut builder = CatalogBuilder::new(PathBuf::from("/nonexistent"), default_factories());
        for id in [1u16, 2, 3] {
            builder
                .slot_mut(id)
                .unwrap()
                .add_entry(Entry::new(id, format!("entry-{}", id)));
        }

        let mut store = BackingStore::memory();
        builder.write_to(&mut store).unwrap();
        let catalog = Catalog::from_store(store).unwrap();

        let headers = catalog.factory_headers();
        for pair in headers.windows(2) {
            assert!(pair[0].name_index_offset <= pair[1].section_offset);
            assert!(pair[0].section_offset < pair[1].section_offset);
        }
    }

    #[test]
    fn build_session_lookup_sees_last_write() {
        let mut builder = CatalogBuilder::new(PathBuf::from("/nonexistent"), default_factories());
        let slot = builder.slot_mut(1).unwrap();

        let mut first = Entry::new(1, "kio_file");
        first.fields.push(("Exec".into(), "old".into()));
        slot.add_entry(first);
        let mut second = Entry::new(1, "kio_file");
        second.fields.push(("Exec".into(), "new".into()));
        slot.add_entry(second);

        assert_eq!(slot.get("kio_file").unwrap().field("Exec"), Some("new"));

        // And the same holds after serialization.
        let mut store = BackingStore::memory();
        builder.write_to(&mut store).unwrap();
        let catalog = Catalog::from_store(store).unwrap();
        let found = catalog.lookup("services", "kio_file").unwrap().unwrap();
        assert_eq!(found.field("Exec"), Some("new"));
    }
}
