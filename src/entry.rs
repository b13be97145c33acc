//! One decoded record of indexed configuration data.

use crate::error::Result;
use crate::store::BackingStore;

/// A named, typed record. `fields` carries the type-specific payload as
/// key/value pairs taken from the source resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub type_id: u16,
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl Entry {
    pub fn new(type_id: u16, name: impl Into<String>) -> Self {
        Entry {
            type_id,
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Encode at the store's current position, returning the entry's offset.
    ///
    /// Layout: u16 type id, name, u16 field count, then the pairs. All
    /// strings are u16-length-prefixed UTF-8, integers little-endian.
    pub fn encode(&self, store: &mut BackingStore) -> Result<u32> {
        let offset = store.append_u16(self.type_id)?;
        store.append_string(&self.name)?;
        let count = u16::try_from(self.fields.len()).map_err(|_| {
            crate::error::CatalogError::Corrupt("too many fields in entry".into())
        })?;
        store.append_u16(count)?;
        for (k, v) in &self.fields {
            store.append_string(k)?;
            store.append_string(v)?;
        }
        Ok(offset)
    }

    /// Decode from the store's current position. Structural damage surfaces
    /// as `CorruptCatalog` via the store's bounds-checked reads.
    pub fn decode(store: &mut BackingStore) -> Result<Self> {
        let type_id = store.read_u16()?;
        let name = store.read_string()?;
        let count = store.read_u16()? as usize;
        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            let k = store.read_string()?;
            let v = store.read_string()?;
            fields.push((k, v));
        }
        Ok(Entry {
            type_id,
            name,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    #[test]
    fn encode_decode_roundtrip() {
        let mut entry = Entry::new(2, "text/plain");
        entry.fields.push(("Comment".into(), "Plain text".into()));
        entry.fields.push(("Icon".into(), "text-x-generic".into()));

        let mut store = BackingStore::memory();
        let offset = entry.encode(&mut store).unwrap();
        assert_eq!(offset, 0);

        store.seek(0).unwrap();
        let decoded = Entry::decode(&mut store).unwrap();
        assert_eq!(decoded, entry);
        assert_eq!(decoded.field("Icon"), Some("text-x-generic"));
    }

    #[test]
    fn truncated_entry_is_corrupt() {
        let mut entry = Entry::new(1, "kioslave");
        entry.fields.push(("Exec".into(), "/usr/bin/kio".into()));

        let mut store = BackingStore::memory();
        entry.encode(&mut store).unwrap();
        let len = store.len().unwrap() as usize;
        store.seek(0).unwrap();
        let bytes = store.read_bytes(len - 3).unwrap();

        let mut short = BackingStore::memory();
        short.append(&bytes).unwrap();
        short.seek(0).unwrap();
        assert!(matches!(
            Entry::decode(&mut short),
            Err(CatalogError::Corrupt(_))
        ));
    }
}
