use clap::Parser;
use tracing_subscriber::EnvFilter;

use spendcheck::api::{Cli, Command, run_analyze, run_http_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spendcheck=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => run_analyze(args)?,
        Command::Serve { port } => run_http_server(port).await?,
    }
    Ok(())
}
