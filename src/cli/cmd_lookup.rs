use anyhow::Result;
use clap::Args;
use confcache::Catalog;
use std::path::PathBuf;

#[derive(Args)]
#[command(
    about = "Look up one entry by class and name",
    after_help = "Examples:\n  \
            # Find a MIME type\n  \
            confcache lookup mimetypes text/plain\n\n  \
            # Find an application, JSON output\n  \
            confcache lookup applications konsole --json"
)]
pub struct LookupCommand {
    /// Resource class: services, mimetypes or applications
    pub class: String,

    /// Entry name to look up
    pub name: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: LookupCommand, db: PathBuf) -> Result<()> {
    let catalog = Catalog::open(&db);

    let Some(entry) = catalog.lookup(&cmd.class, &cmd.name)? else {
        eprintln!("{}/{}: not found", cmd.class, cmd.name);
        std::process::exit(1);
    };

    if cmd.json {
        let fields: serde_json::Map<String, serde_json::Value> = entry
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        let out = serde_json::json!({
            "name": entry.name,
            "type_id": entry.type_id,
            "fields": fields,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("[{}]", entry.name);
        for (k, v) in &entry.fields {
            println!("{}={}", k, v);
        }
    }

    Ok(())
}
