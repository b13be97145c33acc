use anyhow::Result;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use confcache::{default_factories, scan_resources, BuildReport, CatalogBuilder};

/// A scratch database path plus a resource tree root. `dir` keeps the
/// tempdir alive for the fixture's lifetime.
#[allow(dead_code)]
pub struct Fixture {
    pub dir: TempDir,
    pub db: PathBuf,
    pub root: PathBuf,
}

pub fn setup() -> Result<Fixture> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("confcache.db");
    let root = dir.path().join("resources");
    for class in ["services", "mimetypes", "applications"] {
        fs::create_dir_all(root.join(class))?;
    }
    Ok(Fixture { dir, db, root })
}

#[allow(dead_code)]
pub fn write_service(root: &Path, name: &str, exec: &str) -> Result<PathBuf> {
    let path = root.join("services").join(format!("{}.desktop", name));
    fs::write(
        &path,
        format!("[Desktop Entry]\nName={}\nExec={}\nType=Service\n", name, exec),
    )?;
    Ok(path)
}

#[allow(dead_code)]
pub fn write_mime(root: &Path, mime: &str, comment: &str) -> Result<PathBuf> {
    let path = root.join("mimetypes").join(format!("{}.xml", mime));
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(
        &path,
        format!("[Desktop Entry]\nMimeType={}\nComment={}\n", mime, comment),
    )?;
    Ok(path)
}

#[allow(dead_code)]
pub fn write_application(root: &Path, name: &str, exec: &str) -> Result<PathBuf> {
    let path = root.join("applications").join(format!("{}.desktop", name));
    fs::write(
        &path,
        format!(
            "[Desktop Entry]\nName={}\nExec={}\nType=Application\n",
            name, exec
        ),
    )?;
    Ok(path)
}

/// Pin a file's mtime to an exact second so incremental behavior is
/// deterministic regardless of test speed.
#[allow(dead_code)]
pub fn set_mtime(path: &Path, secs: u64) -> Result<()> {
    let file = File::options().write(true).open(path)?;
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))?;
    Ok(())
}

#[allow(dead_code)]
pub fn build(db: &Path, root: &Path) -> Result<BuildReport> {
    let factories = default_factories();
    let classes: Vec<&str> = factories.iter().map(|f| f.resource_class()).collect();
    let items = scan_resources(root, &classes);
    let mut builder = CatalogBuilder::new(db.to_path_buf(), factories);
    Ok(builder.build(&items)?)
}
