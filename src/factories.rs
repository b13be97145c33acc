//! The concrete factories and the registry the catalog is built from.

use crate::constants::{
    CLASS_APPLICATIONS, CLASS_MIMETYPES, CLASS_SERVICES, FACTORY_ID_APPLICATIONS,
    FACTORY_ID_MIMETYPES, FACTORY_ID_SERVICES,
};
use crate::desktop::parse_desktop_file;
use crate::entry::Entry;
use crate::error::{CatalogError, Result};
use crate::factory::EntryFactory;
use std::path::Path;

/// Service descriptions (kioslave-style `.desktop` files).
pub struct ServiceFactory;

impl EntryFactory for ServiceFactory {
    fn factory_id(&self) -> u16 {
        FACTORY_ID_SERVICES
    }

    fn resource_class(&self) -> &'static str {
        CLASS_SERVICES
    }

    fn create_entry(&self, path: &Path, rel_path: &str) -> Result<Entry> {
        let fields = parse_desktop_file(path)?;
        let mut entry = Entry::new(self.factory_id(), self.entry_name(rel_path));
        entry.fields = fields;
        Ok(entry)
    }
}

/// MIME type descriptions. Files are laid out as `<media>/<subtype>.<ext>`,
/// so the lookup name keeps the directory part: `text/plain.xml` indexes
/// as `text/plain`.
pub struct MimeTypeFactory;

impl EntryFactory for MimeTypeFactory {
    fn factory_id(&self) -> u16 {
        FACTORY_ID_MIMETYPES
    }

    fn resource_class(&self) -> &'static str {
        CLASS_MIMETYPES
    }

    fn entry_name(&self, rel_path: &str) -> String {
        match rel_path.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => rel_path.to_string(),
        }
    }

    fn create_entry(&self, path: &Path, rel_path: &str) -> Result<Entry> {
        let fields = parse_desktop_file(path)?;
        let mut entry = Entry::new(self.factory_id(), self.entry_name(rel_path));
        entry.fields = fields;
        Ok(entry)
    }
}

/// Application launch entries. An application without an `Exec` line cannot
/// be launched, so it is rejected at parse time.
pub struct ApplicationFactory;

impl EntryFactory for ApplicationFactory {
    fn factory_id(&self) -> u16 {
        FACTORY_ID_APPLICATIONS
    }

    fn resource_class(&self) -> &'static str {
        CLASS_APPLICATIONS
    }

    fn create_entry(&self, path: &Path, rel_path: &str) -> Result<Entry> {
        let fields = parse_desktop_file(path)?;
        if !fields.iter().any(|(k, _)| k == "Exec") {
            return Err(CatalogError::parse(path, "application entry without Exec"));
        }
        let mut entry = Entry::new(self.factory_id(), self.entry_name(rel_path));
        entry.fields = fields;
        Ok(entry)
    }
}

/// The registry: every factory the default catalog carries, in section
/// order. Sections are written in this order, so offsets are strictly
/// increasing and never overlap.
pub fn default_factories() -> Vec<Box<dyn EntryFactory>> {
    vec![
        Box::new(ServiceFactory),
        Box::new(MimeTypeFactory),
        Box::new(ApplicationFactory),
    ]
}

pub fn factory_id_for_class(class: &str) -> Option<u16> {
    match class {
        CLASS_SERVICES => Some(FACTORY_ID_SERVICES),
        CLASS_MIMETYPES => Some(FACTORY_ID_MIMETYPES),
        CLASS_APPLICATIONS => Some(FACTORY_ID_APPLICATIONS),
        _ => None,
    }
}

pub fn class_for_factory_id(id: u16) -> Option<&'static str> {
    match id {
        FACTORY_ID_SERVICES => Some(CLASS_SERVICES),
        FACTORY_ID_MIMETYPES => Some(CLASS_MIMETYPES),
        FACTORY_ID_APPLICATIONS => Some(CLASS_APPLICATIONS),
        _ => None,
    }
}
