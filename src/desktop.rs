//! Minimal parser for desktop-entry style resource files.
//!
//! Understands `[Group]` headers, `Key=Value` lines, `#` comments and blank
//! lines. Returns the key/value pairs of the `[Desktop Entry]` group, or of
//! the first group when no `[Desktop Entry]` is present. Anything else is a
//! parse error; the builder logs it and skips the file.

use crate::error::{CatalogError, Result};
use std::fs;
use std::path::Path;

pub const DESKTOP_ENTRY_GROUP: &str = "Desktop Entry";

pub fn parse_desktop_file(path: &Path) -> Result<Vec<(String, String)>> {
    let text = fs::read_to_string(path)
        .map_err(|e| CatalogError::parse(path, format!("unreadable: {}", e)))?;
    parse_desktop_text(path, &text)
}

fn parse_desktop_text(path: &Path, text: &str) -> Result<Vec<(String, String)>> {
    let mut current_group: Option<String> = None;
    let mut wanted_group: Option<String> = None;
    let mut fields: Vec<(String, String)> = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(group) = line.strip_prefix('[') {
            let group = group
                .strip_suffix(']')
                .ok_or_else(|| {
                    CatalogError::parse(path, format!("unterminated group at line {}", lineno + 1))
                })?
                .trim()
                .to_string();
            if group.is_empty() {
                return Err(CatalogError::parse(
                    path,
                    format!("empty group name at line {}", lineno + 1),
                ));
            }
            // First group is the fallback; [Desktop Entry] always wins.
            if wanted_group.is_none() || group == DESKTOP_ENTRY_GROUP {
                if wanted_group.as_deref() != Some(DESKTOP_ENTRY_GROUP) {
                    wanted_group = Some(group.clone());
                    fields.clear();
                }
            }
            current_group = Some(group);
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(CatalogError::parse(
                path,
                format!("not a key=value line at line {}", lineno + 1),
            ));
        };
        let group = current_group.as_ref().ok_or_else(|| {
            CatalogError::parse(path, format!("key before any group at line {}", lineno + 1))
        })?;
        if wanted_group.as_deref() == Some(group.as_str()) {
            fields.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    if wanted_group.is_none() {
        return Err(CatalogError::parse(path, "no group header found"));
    }
    Ok(fields)
}
