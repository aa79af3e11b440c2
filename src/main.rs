use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vcfidx::{
    Config,
    config::{Command, region_bounds},
    r#async as index,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing; stdout is reserved for results
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match config.command {
        Command::Build { path, bin_size } => {
            let summary = index::build(&path, bin_size).await?;
            tracing::info!(
                "indexed {} records on {} chromosomes",
                summary.records(),
                summary.chromosomes.len()
            );
        }
        Command::Query { path, region } => {
            let (chromosome, start, end) = region_bounds(&region);
            let handle = Arc::new(index::load(&path).await?);
            let result = index::search(&path, handle, chromosome, start, end).await?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Fetch { path, region } => {
            let (chromosome, start, end) = region_bounds(&region);
            let handle = Arc::new(index::load(&path).await?);
            let result = index::search(&path, handle, chromosome, start, end).await?;
            let records = index::fetch(&path, result).await?;
            std::io::stdout().lock().write_all(&records)?;
        }
        Command::Info { path } => {
            let handle = index::load(&path).await?;
            println!("{}", serde_json::to_string_pretty(&handle.summary())?);
        }
    }

    Ok(())
}
