use anyhow::Result;
use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

mod cli;

use cli::{cmd_build, cmd_lookup, cmd_ls, cmd_status, logger};

#[derive(Parser)]
#[command(name = "confcache")]
#[command(version)]
#[command(about = "System configuration cache - binary catalog of desktop metadata")]
#[command(propagate_version = true)]
struct Cli {
    /// Catalog database file
    #[arg(
        short = 'f',
        long = "db",
        global = true,
        default_value = "confcache.db",
        value_hint = ValueHint::FilePath
    )]
    db: PathBuf,

    /// Suppress progress output
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Build(cmd_build::BuildCommand),
    Lookup(cmd_lookup::LookupCommand),
    Ls(cmd_ls::LsCommand),
    Status(cmd_status::StatusCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Build(cmd) => cmd_build::run(cmd, cli.db, cli.quiet)?,
        Commands::Lookup(cmd) => cmd_lookup::run(cmd, cli.db)?,
        Commands::Ls(cmd) => cmd_ls::run(cmd, cli.db)?,
        Commands::Status(cmd) => cmd_status::run(cmd, cli.db)?,
    }

    Ok(())
}
