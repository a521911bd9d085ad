use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Fallback filter when `RUST_LOG` is unset; sqlx is capped at warn.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Install the seeder's global subscriber: fmt lines with target, file and
/// line, filtered by `RUST_LOG` or `default_filter`.
///
/// Skipped rows surface here as `warn` events carrying `row`, `category`
/// and `value`/`error` fields, so keep `warn` enabled for the
/// `catalog_seed::catalog` target when tightening the filter.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize catalog_seed logging: {e}"))
}
