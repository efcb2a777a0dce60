use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "reportdb")]
#[command(about = "Import test execution reports into a SQLite database", version)]
pub struct Cli {
    /// Path to the input report file.
    #[arg(long)]
    pub file: PathBuf,

    /// Target SQLite database file.
    #[arg(long, default_value = "results.db")]
    pub db: PathBuf,
}
