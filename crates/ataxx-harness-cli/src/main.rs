use clap::Parser;

mod cli;
mod driver;

use cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let all_ok = driver::run_all(&cli.scripts, cli.verbose).await;

    std::process::exit(if all_ok { 0 } else { 1 });
}
