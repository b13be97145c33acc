//! confcache: a binary catalog of desktop-environment metadata.
//!
//! Thousands of small resource files (service descriptions, MIME type
//! definitions, application launch entries) are indexed into one compact
//! binary database. One builder process regenerates it incrementally, driven
//! by filesystem mtimes; any number of reader processes open it and answer
//! name lookups without re-parsing anything.

pub mod builder;
pub mod catalog;
pub mod constants;
pub mod desktop;
pub mod entry;
pub mod error;
pub mod factories;
pub mod factory;
pub mod ledger;
pub mod name_index;
pub mod scanner;
pub mod store;

pub use builder::{BuildReport, CatalogBuilder};
pub use catalog::Catalog;
pub use entry::Entry;
pub use error::CatalogError;
pub use factories::default_factories;
pub use factory::{EntryFactory, FactoryHeader, FactorySlot};
pub use ledger::TimestampLedger;
pub use name_index::NameIndex;
pub use scanner::{scan_resources, ScanItem};
pub use store::BackingStore;
