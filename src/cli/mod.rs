//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "proxy-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the run configuration file
    #[arg(default_value = "config.json")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory the JSON report is written to
    #[arg(short, long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Print the report without saving it
    #[arg(long)]
    pub no_save: bool,

    /// Validate the configuration and exit without sending requests
    #[arg(long)]
    pub check: bool,

    /// Render a previously saved report instead of running
    #[arg(long, value_name = "REPORT", conflicts_with = "check")]
    pub show: Option<PathBuf>,
}
