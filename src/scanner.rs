//! Resource scanner: enumerates the source files a build should consider.
//!
//! Walks `<root>/<class>/**` for each resource class and yields one item per
//! regular file, with the filesystem mtime the builder compares against the
//! ledger. Output is sorted so duplicate names resolve the same way on every
//! build.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScanItem {
    pub resource_class: String,
    /// Absolute path handed to the factory's parser.
    pub path: PathBuf,
    /// Path relative to the class root, '/'-separated. Drives entry naming.
    pub rel_path: String,
    /// Filesystem mtime as seconds, 0 when the metadata cannot be read.
    pub mtime: u32,
}

/// Scan `root` for the given resource classes (each a subdirectory).
/// Missing class directories are fine: they contribute nothing.
pub fn scan_resources(root: &Path, classes: &[&str]) -> Vec<ScanItem> {
    let mut items = Vec::new();
    for class in classes {
        let class_root = root.join(class);
        for entry in WalkDir::new(&class_root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&class_root) else {
                continue;
            };
            let rel_path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            items.push(ScanItem {
                resource_class: class.to_string(),
                path: entry.path().to_path_buf(),
                rel_path,
                mtime: file_mtime(entry.path()),
            });
        }
    }
    items.sort_by(|a, b| {
        (a.resource_class.as_str(), a.rel_path.as_str())
            .cmp(&(b.resource_class.as_str(), b.rel_path.as_str()))
    });
    items
}

pub fn file_mtime(path: &Path) -> u32 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scans_classes_recursively_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("services")).unwrap();
        fs::create_dir_all(root.join("mimetypes/text")).unwrap();
        fs::write(root.join("services/b.desktop"), "[Desktop Entry]\n").unwrap();
        fs::write(root.join("services/a.desktop"), "[Desktop Entry]\n").unwrap();
        fs::write(root.join("mimetypes/text/plain.xml"), "[Mime]\n").unwrap();
        fs::write(root.join("services/.hidden"), "x").unwrap();

        let items = scan_resources(root, &["services", "mimetypes"]);
        let seen: Vec<(&str, &str)> = items
            .iter()
            .map(|i| (i.resource_class.as_str(), i.rel_path.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("mimetypes", "text/plain.xml"),
                ("services", "a.desktop"),
                ("services", "b.desktop"),
            ]
        );
        assert!(items.iter().all(|i| i.mtime > 0));
    }

    #[test]
    fn missing_class_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_resources(dir.path(), &["services"]).is_empty());
    }
}
