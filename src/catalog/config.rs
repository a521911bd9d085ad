use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::record::ColumnLayout;
use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_INPUT_PATH: &str = "games.csv";
pub const DEFAULT_CURRENCY: &str = "pln";
pub const DEFAULT_PACING_MS: u64 = 500;

/// When the driver waits before pulling the next row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacingPolicy {
    /// Only after a row was persisted.
    #[default]
    PersistedOnly,
    /// After every row that reached the payment service, persisted or not.
    AfterRemoteCall,
}

impl FromStr for PacingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "persisted-only" | "persisted" => Ok(PacingPolicy::PersistedOnly),
            "after-remote-call" | "remote" => Ok(PacingPolicy::AfterRemoteCall),
            other => Err(anyhow!("unknown pacing policy {other:?}")),
        }
    }
}

/// Run-wide settings threaded through the driver.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub input_path: PathBuf,
    /// Lowercase ISO 4217 code, fixed for the whole run.
    pub currency: String,
    pub pacing: Duration,
    pub pacing_policy: PacingPolicy,
    pub layout: ColumnLayout,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            currency: DEFAULT_CURRENCY.to_string(),
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
            pacing_policy: PacingPolicy::default(),
            layout: ColumnLayout::default(),
        }
    }
}

impl SeedConfig {
    /// Read CATALOG_CSV_PATH, PRICE_CURRENCY, PACING_MS, PACING_POLICY and
    /// COLUMN_OFFSET, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let pacing_policy = match env_opt("PACING_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.pacing_policy,
        };
        Self {
            input_path: env_opt("CATALOG_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_path),
            currency: env_opt("PRICE_CURRENCY").unwrap_or(defaults.currency),
            pacing: Duration::from_millis(env_parse("PACING_MS", DEFAULT_PACING_MS)),
            pacing_policy,
            layout: ColumnLayout::with_offset(env_parse("COLUMN_OFFSET", 0usize)),
        }
        .validated()
    }

    /// Normalize the currency code and reject anything that is not three
    /// ASCII letters.
    pub fn validated(mut self) -> Result<Self> {
        let code = self.currency.trim().to_ascii_lowercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(anyhow!("invalid currency code {:?}", self.currency));
        }
        self.currency = code;
        Ok(self)
    }
}
