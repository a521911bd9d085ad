use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_seed::catalog::{CatalogSeeder, ColumnLayout, CsvRowSource, PacingPolicy, SeedConfig};
use catalog_seed::database_ops::db::Db;
use catalog_seed::database_ops::stripe::StripeProvider;
use catalog_seed::logging::{init_tracing, DEFAULT_FILTER};
use catalog_seed::util::env;
use clap::Parser;

/// Seed the games catalog from a CSV export, minting a Stripe price per game.
///
/// Every flag falls back to its environment variable, then to the built-in default.
#[derive(Parser, Debug)]
#[command(name = "catalog_seed", version, about)]
struct Cli {
    /// Input file (CATALOG_CSV_PATH)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Three-letter currency code for every price (PRICE_CURRENCY)
    #[arg(long)]
    currency: Option<String>,
    /// Delay between rows in milliseconds (PACING_MS)
    #[arg(long)]
    pacing_ms: Option<u64>,
    /// persisted-only | after-remote-call (PACING_POLICY)
    #[arg(long)]
    pacing_policy: Option<PacingPolicy>,
    /// Leading columns before the title column (COLUMN_OFFSET)
    #[arg(long)]
    column_offset: Option<usize>,
}

impl Cli {
    fn apply(self, mut config: SeedConfig) -> Result<SeedConfig> {
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
        if let Some(ms) = self.pacing_ms {
            config.pacing = Duration::from_millis(ms);
        }
        if let Some(policy) = self.pacing_policy {
            config.pacing_policy = policy;
        }
        if let Some(offset) = self.column_offset {
            config.layout = ColumnLayout::with_offset(offset);
        }
        config.validated()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER)?;
    let cli = Cli::parse();

    let config = cli.apply(SeedConfig::from_env()?)?;
    env::preflight_check(
        "catalog_seed",
        &["STRIPE_SECRET_KEY"],
        &[
            "CATALOG_CSV_PATH",
            "PRICE_CURRENCY",
            "PACING_MS",
            "PACING_POLICY",
            "COLUMN_OFFSET",
            "STRIPE_API_BASE",
            "STRIPE_SECRET_KEY",
            "HTTP_TIMEOUT_SECS",
            "DATABASE_URL",
            "USE_PREPARED",
        ],
    )?;

    // Open the input before building any remote handle; a missing file ends the run here.
    let mut source = CsvRowSource::open(&config.input_path)?;

    let registrar = StripeProvider::new(
        env::env_opt("STRIPE_API_BASE").as_deref(),
        env::env_req("STRIPE_SECRET_KEY")?,
        &config.currency,
        Some(env::env_parse("HTTP_TIMEOUT_SECS", 30u64)),
    )?;

    let database_url = env::db_url()
        .context("Database URL not configured; set DATABASE_URL / DB_URL / DB_HOST")?;
    let db = Db::connect(&database_url)
        .await
        .context("Db::connect failed")?;

    let seeder = CatalogSeeder::new(config, registrar, db);
    seeder.run(&mut source).await?;
    Ok(())
}
