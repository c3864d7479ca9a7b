pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "varsity")]
#[command(about = "Course resource directories with visibility scoping and voting")]
pub struct Args {
    /// Daemon API URL (defaults to localhost on the configured api_port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the varsity config directory (defaults to ~/.varsity)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// User id sent as x-user-id on API calls
    #[arg(long, global = true, env = "VARSITY_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
