use anyhow::Result;
use clap::Args;
use confcache::factories::class_for_factory_id;
use confcache::Catalog;
use std::path::PathBuf;

#[derive(Args)]
#[command(
    about = "Show catalog status",
    after_help = "Examples:\n  \
            # Human-readable overview\n  \
            confcache status\n\n  \
            # JSON output for monitoring\n  \
            confcache status --json"
)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: StatusCommand, db: PathBuf) -> Result<()> {
    let catalog = Catalog::open(&db);
    let headers = catalog.factory_headers();
    let ledger = catalog.load_ledger()?;
    let file_size = std::fs::metadata(&db).map(|m| m.len()).unwrap_or(0);

    if cmd.json {
        let factories: Vec<serde_json::Value> = headers
            .iter()
            .map(|h| {
                serde_json::json!({
                    "factory_id": h.factory_id,
                    "class": class_for_factory_id(h.factory_id),
                    "entries": catalog.entry_count(h.factory_id).unwrap_or(0),
                })
            })
            .collect();
        let out = serde_json::json!({
            "path": db,
            "exists": file_size > 0,
            "size_bytes": file_size,
            "version": catalog.version(),
            "factories": factories,
            "ledger_records": ledger.len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Catalog: {}", db.display());
    if headers.is_empty() {
        println!("  empty (not built yet, or unreadable)");
        return Ok(());
    }
    println!("  version:        {}", catalog.version());
    println!("  size:           {} bytes", file_size);
    println!("  ledger records: {}", ledger.len());
    println!("  factories:");
    for h in headers {
        println!(
            "    {:<14} id={} entries={}",
            class_for_factory_id(h.factory_id).unwrap_or("unknown"),
            h.factory_id,
            catalog.entry_count(h.factory_id)?
        );
    }

    Ok(())
}
