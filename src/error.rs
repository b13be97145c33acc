use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the catalog core.
///
/// The variants drive control flow, not just messages: `Parse` is contained
/// inside the owning factory (log and skip the file), `NotFound` and
/// `VersionMismatch` degrade a read-mode open to an empty catalog, `Corrupt`
/// rejects the whole catalog, and `Io` aborts a build before the atomic
/// replace so the committed catalog stays untouched.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed resource file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("catalog is corrupt: {0}")]
    Corrupt(String),

    #[error("no catalog at {0}")]
    NotFound(PathBuf),

    #[error("catalog version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("catalog I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CatalogError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the conditions that read mode treats as "no catalog".
    pub fn means_no_catalog(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound(_)
                | CatalogError::VersionMismatch { .. }
                | CatalogError::Corrupt(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
