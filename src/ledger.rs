//! Timestamp ledger: last-seen modification times for source files.
//!
//! The builder compares each discovered file's mtime against the ledger to
//! decide whether it must be re-parsed. The ledger is rewritten from scratch
//! on every successful build, which is how deletions fall out of it.

use crate::error::Result;
use crate::store::BackingStore;
use std::collections::HashMap;
use std::collections::HashSet;

/// Key on disk is `"class|path"`, mirroring the in-memory map.
fn key(resource_class: &str, path: &str) -> String {
    format!("{}|{}", resource_class, path)
}

#[derive(Debug, Default, Clone)]
pub struct TimestampLedger {
    records: HashMap<String, u32>,
}

impl TimestampLedger {
    pub fn new() -> Self {
        TimestampLedger::default()
    }

    pub fn record_mtime(&mut self, resource_class: &str, path: &str, mtime: u32) {
        debug_assert!(!path.is_empty());
        self.records.insert(key(resource_class, path), mtime);
    }

    /// Last-seen mtime, 0 if the path is unknown or invalidated.
    pub fn mtime(&self, resource_class: &str, path: &str) -> u32 {
        self.records
            .get(&key(resource_class, path))
            .copied()
            .unwrap_or(0)
    }

    pub fn forget(&mut self, resource_class: &str, path: &str) {
        self.records.remove(&key(resource_class, path));
    }

    /// Resource classes that have at least one record.
    pub fn resources_seen(&self) -> HashSet<String> {
        self.records
            .keys()
            .filter_map(|k| k.split('|').next())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize as `(key, mtime)` pairs terminated by a sentinel pair with
    /// an empty key and mtime 0. Sentinel termination keeps the writer
    /// streaming-friendly: no record count needs to be known up front.
    /// Keys are written sorted so an unchanged rebuild is byte-identical.
    pub fn save(&self, store: &mut BackingStore) -> Result<()> {
        let mut keys: Vec<&String> = self.records.keys().collect();
        keys.sort();
        for k in keys {
            store.append_string(k)?;
            store.append_u32(self.records[k])?;
        }
        store.append_string("")?;
        store.append_u32(0)?;
        Ok(())
    }

    /// Read pairs from the store's current position until the sentinel.
    pub fn load(store: &mut BackingStore) -> Result<Self> {
        let mut records = HashMap::new();
        loop {
            let k = store.read_string()?;
            let mtime = store.read_u32()?;
            if k.is_empty() {
                break;
            }
            records.insert(k, mtime);
        }
        Ok(TimestampLedger { records })
    }
}
