pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod source;

pub use config::{PacingPolicy, SeedConfig};
pub use error::{FatalError, ParseError, ParseErrorKind, RegistrarError, RowError, WriteError};
pub use pipeline::{CatalogSeeder, RunCounter, RunSummary};
pub use record::{parse, ColumnLayout, GameRecord, PriceId, PricedGame, RawRow};
pub use source::{CsvRowSource, RowSource, SourceItem};
