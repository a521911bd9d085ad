//! Pipeline driver: pulls rows one at a time and moves each through
//! parse -> price registration -> persistence, skipping any row that fails
//! at any stage.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::{PacingPolicy, SeedConfig};
use super::error::{FatalError, ParseError, ParseErrorKind, RowError};
use super::record::{parse, PricedGame, RawRow};
use super::source::{CsvRowSource, RowSource, SourceItem};
use crate::database_ops::db::CatalogWriter;
use crate::database_ops::stripe::PriceRegistrar;

/// Monotonic count of data rows attempted in this run. Labels diagnostics only.
#[derive(Debug, Default)]
pub struct RunCounter(u64);

impl RunCounter {
    /// Advance and return the 1-based index of the row about to be processed.
    pub fn next_index(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn current(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub attempted: u64,
    pub persisted: u64,
    /// Skipped rows keyed by diagnostic category.
    pub skipped: BTreeMap<&'static str, u64>,
}

impl RunSummary {
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, category: &str) -> u64 {
        self.skipped.get(category).copied().unwrap_or(0)
    }

    fn record_skip(&mut self, err: &RowError) {
        *self.skipped.entry(err.category()).or_insert(0) += 1;
    }
}

/// Owns the run configuration and the two remote handles for the duration of
/// a run.
pub struct CatalogSeeder<P, W> {
    config: SeedConfig,
    registrar: P,
    writer: W,
}

impl<P: PriceRegistrar, W: CatalogWriter> CatalogSeeder<P, W> {
    pub fn new(config: SeedConfig, registrar: P, writer: W) -> Self {
        Self {
            config,
            registrar,
            writer,
        }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub fn registrar(&self) -> &P {
        &self.registrar
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Open the configured input file and seed from it.
    pub async fn run_file(&self) -> Result<RunSummary, FatalError> {
        let mut source = CsvRowSource::open(&self.config.input_path)?;
        self.run(&mut source).await
    }

    /// Seed from `source`. The first item is always discarded as the header.
    /// Only source failures end the run early.
    pub async fn run<S: RowSource>(&self, source: &mut S) -> Result<RunSummary, FatalError> {
        info!(
            input = %self.config.input_path.display(),
            currency = %self.config.currency,
            pacing_ms = self.config.pacing.as_millis() as u64,
            pacing_policy = ?self.config.pacing_policy,
            column_offset = self.config.layout.offset,
            "catalog seed starting"
        );

        let mut counter = RunCounter::default();
        let mut summary = RunSummary::default();

        if source.next_item()?.is_some() {
            while let Some(item) = source.next_item()? {
                let row_index = counter.next_index();
                summary.attempted += 1;

                let outcome = match item {
                    SourceItem::Row(row) => self.process_row(&row, row_index).await,
                    SourceItem::Undecodable(msg) => Err(RowError::Parse(ParseError::new(
                        ParseErrorKind::MalformedRow,
                        row_index,
                        msg,
                    ))),
                };

                match outcome {
                    Ok(game) => {
                        summary.persisted += 1;
                        debug!(
                            row = row_index,
                            title = %game.record.title,
                            price_id = %game.price_id,
                            "row persisted"
                        );
                        self.pace().await;
                    }
                    Err(err) => {
                        log_skip(&err);
                        summary.record_skip(&err);
                        if self.config.pacing_policy == PacingPolicy::AfterRemoteCall
                            && err.reached_registrar()
                        {
                            self.pace().await;
                        }
                    }
                }
            }
        }

        info!(
            attempted = summary.attempted,
            persisted = summary.persisted,
            skipped = summary.skipped_total(),
            skipped_by_category = ?summary.skipped,
            "catalog seed finished"
        );
        Ok(summary)
    }

    /// Drive one row to completion. The writer is only reached once the
    /// record carries a price id.
    pub async fn process_row(&self, row: &RawRow, row_index: u64) -> Result<PricedGame, RowError> {
        let record = parse(row, row_index, self.config.layout)?;

        let price_id = self
            .registrar
            .register_price(&record)
            .await
            .map_err(|source| RowError::Register { row_index, source })?;

        let game = record.priced(price_id);
        self.writer
            .persist(&game)
            .await
            .map_err(|source| RowError::Write { row_index, source })?;
        Ok(game)
    }

    async fn pace(&self) {
        if !self.config.pacing.is_zero() {
            tokio::time::sleep(self.config.pacing).await;
        }
    }
}

fn log_skip(err: &RowError) {
    match err {
        RowError::Parse(e) => warn!(
            row = e.row_index,
            category = err.category(),
            value = %e.raw_value,
            "skipping row"
        ),
        RowError::Register { row_index, source } => warn!(
            row = *row_index,
            category = err.category(),
            error = %source,
            "skipping row"
        ),
        RowError::Write { row_index, source } => warn!(
            row = *row_index,
            category = err.category(),
            error = %source,
            "skipping row"
        ),
    }
}
