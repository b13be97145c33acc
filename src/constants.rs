// Catalog format constants shared across the crate.

/// On-disk catalog format version. Any mismatch is treated as "no catalog".
pub const CATALOG_VERSION: u32 = 1;

/// Fixed header: u32 version + u16 factory count + u32 ledger offset.
pub const HEADER_BASE_LEN: u32 = 10;

/// Serialized FactoryHeader: u16 id + u32 section offset + u32 index offset.
pub const FACTORY_HEADER_LEN: u32 = 10;

/// Default catalog file name inside a database directory.
pub const DB_FILE_NAME: &str = "confcache.db";

/// Suffix for the replacement file written during a build.
pub const TMP_SUFFIX: &str = "tmp";

/// Resource classes handled by the default factory registry.
pub const CLASS_SERVICES: &str = "services";
pub const CLASS_MIMETYPES: &str = "mimetypes";
pub const CLASS_APPLICATIONS: &str = "applications";

/// Stable factory ids. Client code persists these; never renumber.
pub const FACTORY_ID_SERVICES: u16 = 1;
pub const FACTORY_ID_MIMETYPES: u16 = 2;
pub const FACTORY_ID_APPLICATIONS: u16 = 3;
