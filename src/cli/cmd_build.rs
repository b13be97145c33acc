use anyhow::{Context, Result};
use clap::Args;
use confcache::{default_factories, scan_resources, CatalogBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
#[command(
    about = "Rebuild the catalog from a resource tree",
    after_help = "Examples:\n  \
            # Rebuild from the default resource layout\n  \
            confcache build /usr/share/desktop\n\n  \
            # Rebuild a catalog kept elsewhere\n  \
            confcache -f /var/cache/confcache.db build /usr/share/desktop\n\n  \
            # JSON build report for scripting\n  \
            confcache build /usr/share/desktop --json"
)]
pub struct BuildCommand {
    /// Root of the resource tree (expects services/, mimetypes/,
    /// applications/ subdirectories)
    pub root: PathBuf,

    /// Print the build report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: BuildCommand, db: PathBuf, quiet: bool) -> Result<()> {
    let factories = default_factories();
    let classes: Vec<&str> = factories.iter().map(|f| f.resource_class()).collect();

    let items = scan_resources(&cmd.root, &classes);
    log::info!("scanned {} resource files under {}", items.len(), cmd.root.display());

    let bar = if quiet || items.is_empty() {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(items.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files")
                .unwrap()
                .progress_chars("█▓▒░ "),
        );
        bar
    };

    let mut builder = CatalogBuilder::new(db.clone(), factories);
    let report = builder
        .build_with_progress(&items, |done, _| bar.set_position(done as u64))
        .with_context(|| format!("failed to rebuild catalog at {}", db.display()))?;
    bar.finish_and_clear();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} entries committed to {} ({} parsed, {} reused, {} skipped)",
            report.entries, db.display(), report.parsed, report.reused, report.skipped_bad
        );
    }

    Ok(())
}
