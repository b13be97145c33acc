use anyhow::Result;
use clap::Args;
use confcache::factories::{class_for_factory_id, factory_id_for_class};
use confcache::Catalog;
use std::path::PathBuf;

#[derive(Args)]
#[command(
    about = "List catalog entries (machine-readable)",
    after_help = "Examples:\n  \
            # All entries, one 'class<TAB>name' per line\n  \
            confcache ls\n\n  \
            # Only MIME types\n  \
            confcache ls mimetypes\n\n  \
            # Scripting\n  \
            confcache ls | awk -F'\\t' '{print $2}'"
)]
pub struct LsCommand {
    /// Restrict to one resource class
    pub class: Option<String>,
}

pub fn run(cmd: LsCommand, db: PathBuf) -> Result<()> {
    let catalog = Catalog::open(&db);

    let headers = catalog.factory_headers();
    for header in headers {
        let class = class_for_factory_id(header.factory_id).unwrap_or("unknown");
        if let Some(wanted) = &cmd.class {
            if factory_id_for_class(wanted) != Some(header.factory_id) {
                continue;
            }
        }
        let mut names = catalog.entry_names(header.factory_id)?;
        names.sort();
        for name in names {
            println!("{}\t{}", class, name);
        }
    }

    Ok(())
}
