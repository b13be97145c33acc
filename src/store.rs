//! Backing store: the byte stream a catalog lives in.
//!
//! Two variants behind one type so the rest of the crate is storage-agnostic:
//! a file on disk (read mode opens it directly, build mode writes a `.tmp`
//! sibling and renames it over the target on commit) and an in-memory buffer
//! (used when no database exists yet, so readers get a valid-but-empty
//! catalog instead of an error). The memory variant never touches the
//! filesystem.

use crate::constants::{CATALOG_VERSION, TMP_SUFFIX};
use crate::error::{CatalogError, Result};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

enum Inner {
    /// Committed catalog opened for reading.
    File { file: File },
    /// Replacement file being written during a build.
    Replacement {
        file: File,
        tmp_path: PathBuf,
        final_path: PathBuf,
        committed: bool,
    },
    /// Growable buffer, readable and writable.
    Memory { buf: Vec<u8>, pos: usize },
}

pub struct BackingStore {
    inner: Inner,
}

impl BackingStore {
    /// Open an existing catalog file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        match File::open(path) {
            Ok(file) => Ok(BackingStore {
                inner: Inner::File { file },
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CatalogError::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Start a replacement catalog next to `path`. Nothing at `path` is
    /// touched until `truncate_and_replace` renames the temp file over it.
    pub fn create(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_string());
        let tmp_path = path.with_file_name(format!("{}.{}", file_name, TMP_SUFFIX));
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&tmp_path)?;
        Ok(BackingStore {
            inner: Inner::Replacement {
                file,
                tmp_path,
                final_path: path.to_path_buf(),
                committed: false,
            },
        })
    }

    /// An empty in-memory store.
    pub fn memory() -> Self {
        BackingStore {
            inner: Inner::Memory {
                buf: Vec::new(),
                pos: 0,
            },
        }
    }

    /// A memory-backed store pre-seeded with a valid empty catalog: version
    /// header, zero factories, and a ledger that is just the sentinel pair.
    pub fn empty_catalog() -> Self {
        let mut store = BackingStore::memory();
        // Header: version, factory count 0, ledger offset = end of header.
        store.append_u32(CATALOG_VERSION).unwrap();
        store.append_u16(0).unwrap();
        store.append_u32(10).unwrap();
        // Ledger sentinel: empty key, mtime 0.
        store.append_u16(0).unwrap();
        store.append_u32(0).unwrap();
        store.seek(0).unwrap();
        store
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.inner, Inner::Memory { .. })
    }

    pub fn position(&mut self) -> Result<u32> {
        let pos = match &mut self.inner {
            Inner::File { file } | Inner::Replacement { file, .. } => {
                file.stream_position()?
            }
            Inner::Memory { pos, .. } => *pos as u64,
        };
        u32::try_from(pos).map_err(|_| CatalogError::Corrupt("catalog exceeds u32 offsets".into()))
    }

    pub fn seek(&mut self, offset: u32) -> Result<()> {
        match &mut self.inner {
            Inner::File { file } | Inner::Replacement { file, .. } => {
                file.seek(SeekFrom::Start(offset as u64))?;
            }
            Inner::Memory { pos, .. } => *pos = offset as usize,
        }
        Ok(())
    }

    pub fn len(&mut self) -> Result<u32> {
        let len = match &mut self.inner {
            Inner::File { file } | Inner::Replacement { file, .. } => file.metadata()?.len(),
            Inner::Memory { buf, .. } => buf.len() as u64,
        };
        u32::try_from(len).map_err(|_| CatalogError::Corrupt("catalog exceeds u32 offsets".into()))
    }

    /// Write `bytes` at the current position and return the offset they
    /// landed at. The stream is left positioned after the written bytes.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u32> {
        let offset = self.position()?;
        match &mut self.inner {
            Inner::File { file } | Inner::Replacement { file, .. } => {
                file.write_all(bytes)?;
            }
            Inner::Memory { buf, pos } => {
                let end = *pos + bytes.len();
                if end > buf.len() {
                    buf.resize(end, 0);
                }
                buf[*pos..end].copy_from_slice(bytes);
                *pos = end;
            }
        }
        Ok(offset)
    }

    /// Seek back, overwrite, and restore the stream to its prior position.
    /// This is the primitive behind the two-pass header protocol.
    pub fn patch_at(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        let end = self.position()?;
        self.seek(offset)?;
        self.append(bytes)?;
        self.seek(end)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        match &mut self.inner {
            Inner::File { file } | Inner::Replacement { file, .. } => {
                let mut buf = vec![0u8; len];
                file.read_exact(&mut buf).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        CatalogError::Corrupt("unexpected end of catalog".into())
                    } else {
                        CatalogError::Io(e)
                    }
                })?;
                Ok(buf)
            }
            Inner::Memory { buf, pos } => {
                let end = *pos + len;
                if end > buf.len() {
                    return Err(CatalogError::Corrupt("unexpected end of catalog".into()));
                }
                let out = buf[*pos..end].to_vec();
                *pos = end;
                Ok(out)
            }
        }
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Length-prefixed UTF-8 string (u16 length).
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|_| CatalogError::Corrupt("invalid UTF-8 in catalog string".into()))
    }

    pub fn append_u16(&mut self, v: u16) -> Result<u32> {
        self.append(&v.to_le_bytes())
    }

    pub fn append_u32(&mut self, v: u32) -> Result<u32> {
        self.append(&v.to_le_bytes())
    }

    pub fn append_string(&mut self, s: &str) -> Result<u32> {
        let len = u16::try_from(s.len())
            .map_err(|_| CatalogError::Corrupt("string too long for catalog encoding".into()))?;
        let offset = self.append_u16(len)?;
        self.append(s.as_bytes())?;
        Ok(offset)
    }

    /// Atomically make the written bytes the committed catalog.
    ///
    /// File-backed: flush and rename the temp file over the target, the only
    /// point where readers' view of the catalog changes. Memory-backed: the
    /// buffer itself becomes the committed catalog (position reset to 0).
    pub fn truncate_and_replace(&mut self) -> Result<()> {
        match &mut self.inner {
            Inner::Replacement {
                file,
                tmp_path,
                final_path,
                committed,
            } => {
                file.flush()?;
                file.sync_all()?;
                fs::rename(&*tmp_path, &*final_path)?;
                *committed = true;
                log::debug!("replaced catalog at {}", final_path.display());
                Ok(())
            }
            Inner::Memory { pos, .. } => {
                *pos = 0;
                Ok(())
            }
            Inner::File { .. } => Err(CatalogError::Corrupt(
                "truncate_and_replace on a read-only store".into(),
            )),
        }
    }
}

impl Drop for BackingStore {
    fn drop(&mut self) {
        // A build that never committed must not leave its temp file around.
        if let Inner::Replacement {
            tmp_path,
            committed: false,
            ..
        } = &self.inner
        {
            let _ = fs::remove_file(tmp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_append_and_read_roundtrip() {
        let mut store = BackingStore::memory();
        let off = store.append_u32(0xDEADBEEF).unwrap();
        assert_eq!(off, 0);
        store.append_string("hello").unwrap();
        store.seek(0).unwrap();
        assert_eq!(store.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(store.read_string().unwrap(), "hello");
    }

    #[test]
    fn patch_restores_position() {
        let mut store = BackingStore::memory();
        store.append_u32(0).unwrap();
        store.append_string("body").unwrap();
        let end = store.position().unwrap();
        store.patch_at(0, &42u32.to_le_bytes()).unwrap();
        assert_eq!(store.position().unwrap(), end);
        store.seek(0).unwrap();
        assert_eq!(store.read_u32().unwrap(), 42);
    }

    #[test]
    fn empty_catalog_has_valid_header() {
        let mut store = BackingStore::empty_catalog();
        assert_eq!(store.read_u32().unwrap(), CATALOG_VERSION);
        assert_eq!(store.read_u16().unwrap(), 0);
    }

    #[test]
    fn read_past_end_is_corrupt() {
        let mut store = BackingStore::memory();
        store.append_u16(7).unwrap();
        store.seek(0).unwrap();
        store.read_u16().unwrap();
        assert!(matches!(
            store.read_u32(),
            Err(CatalogError::Corrupt(_))
        ));
    }

    #[test]
    fn replace_renames_over_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cat.db");
        std::fs::write(&target, b"old").unwrap();

        let mut store = BackingStore::create(&target).unwrap();
        store.append(b"new-bytes").unwrap();
        store.truncate_and_replace().unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new-bytes");
        assert!(!dir.path().join("cat.db.tmp").exists());
    }

    #[test]
    fn uncommitted_replacement_leaves_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cat.db");
        std::fs::write(&target, b"old").unwrap();

        {
            let mut store = BackingStore::create(&target).unwrap();
            store.append(b"partial").unwrap();
            // dropped without commit
        }

        assert_eq!(std::fs::read(&target).unwrap(), b"old");
        assert!(!dir.path().join("cat.db.tmp").exists());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.db");
        assert!(matches!(
            BackingStore::open(&missing),
            Err(CatalogError::NotFound(_))
        ));
    }
}
