use anyhow::Result;
use clap::Parser;
use tracing::error;
use versa_tools::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Translation credentials may live in a local .env.
    let _ = dotenvy::dotenv();

    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
