use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fileconv::config::Config;
use fileconv::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Rotating diagnostic log; stays out of the functional contract.
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "fileconv.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    config.trace_loaded();

    let cli = Cli::parse();
    match run(cli, config).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("[ERROR] {e}");
            std::process::exit(1);
        }
    }
}
