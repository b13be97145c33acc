// CLI commands (cmd_ prefix) and shared helpers.

pub mod cmd_build;
pub mod cmd_lookup;
pub mod cmd_ls;
pub mod cmd_status;
pub mod logger;
