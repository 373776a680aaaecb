//! Command-line interface for mongo-schema-sampler
//!
//! # Usage Examples
//!
//! ## Flat type report
//! ```bash
//! # Every collection of every user database
//! mongo-schema-sampler analyze \
//!   --connection-string mongodb://localhost:27017
//!
//! # Everything except one database, 200 documents per collection
//! mongo-schema-sampler analyze \
//!   --connection-string mongodb://localhost:27017 \
//!   --exclude-namespace '["archive.*"]' \
//!   --sample-size 200 -o report.json
//! ```
//!
//! ## mgodatagen config
//! ```bash
//! mongo-schema-sampler datagen \
//!   --connection-string mongodb://localhost:27017 \
//!   --include-namespace '["shop.*"]' \
//!   --min-int 1 --max-int 500 \
//!   --start-date 2020-01-01T00:00:00+00:00
//! ```
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=mongo_schema_sampler=debug`) for more detail.

use clap::{Parser, Subcommand};
use mongo_schema_sampler::{BoundsOpts, SampleOpts, SamplerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mongo-schema-sampler")]
#[command(about = "Sample MongoDB collections and report the field types they contain")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a flat {path, probability, fieldType} report per collection
    Analyze {
        #[command(flatten)]
        opts: SampleOpts,
    },

    /// Write an mgodatagen generator config per collection
    Datagen {
        #[command(flatten)]
        opts: SampleOpts,

        /// Generated value bounds
        #[command(flatten)]
        bounds: BoundsOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.command {
        Commands::Analyze { opts } => SamplerConfig::from_opts(&opts, None)?,
        Commands::Datagen { opts, bounds } => SamplerConfig::from_opts(&opts, Some(&bounds))?,
    };

    mongo_schema_sampler::run(&config).await
}
