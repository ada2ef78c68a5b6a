pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-admin")]
#[command(about = "Browser-based administration for a directory-tree static site")]
pub struct Args {
    /// Base directory of the site (holds wmk_config.yaml, wmk_admin.yaml and the content roots)
    #[arg(long, global = true, default_value = ".")]
    pub base_dir: PathBuf,

    #[command(subcommand)]
    pub command: crate::Command,
}
