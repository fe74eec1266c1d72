use std::path::PathBuf;

use clap::Parser;

fn build_version() -> &'static str {
    static VERSION: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION.get_or_init(|| env!("CARGO_PKG_VERSION").to_string())
}

/// A black-box concurrent test harness for Ataxx-playing programs.
#[derive(Parser)]
#[command(name = "ataxx-harness", version = build_version())]
#[command(about = "Runs Ataxx player test scripts against one or two subprocesses")]
pub struct Cli {
    /// Print each worker's full transcript to stderr on termination.
    #[arg(short, long)]
    pub verbose: bool,

    /// Test script files to run.
    #[arg(required = true)]
    pub scripts: Vec<PathBuf>,
}
