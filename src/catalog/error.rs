//! Error taxonomy for a seeding run.
//!
//! Row-scoped failures ([`RowError`]) skip the current row and never leave the
//! driver. [`FatalError`] is the only thing that ends a run early.

use std::fmt;
use std::path::PathBuf;

/// Which coercion rejected a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidPrice,
    InvalidDate,
    MalformedRow,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidPrice => "InvalidPrice",
            ParseErrorKind::InvalidDate => "InvalidDate",
            ParseErrorKind::MalformedRow => "MalformedRow",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {row_index}: {kind} ({raw_value:?})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub row_index: u64,
    pub raw_value: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, row_index: u64, raw_value: impl Into<String>) -> Self {
        Self {
            kind,
            row_index,
            raw_value: raw_value.into(),
        }
    }
}

/// Failure to mint a price on the payment service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("price service rejected request: {status} {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },

    /// The price has no representable minor-unit amount; nothing was sent.
    #[error("price {0} does not fit a minor-unit amount")]
    Amount(f64),

    /// Success status but no usable identifier in the body.
    #[error("unexpected price service response: {0}")]
    Response(String),
}

/// Failure to append a row to the catalog store.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("insert affected {0} rows, expected 1")]
    RowCount(u64),
}

/// A failure confined to one input row. The driver logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("row {row_index}: price registration failed: {source}")]
    Register {
        row_index: u64,
        #[source]
        source: RegistrarError,
    },

    #[error("row {row_index}: catalog insert failed: {source}")]
    Write {
        row_index: u64,
        #[source]
        source: WriteError,
    },
}

impl RowError {
    /// Diagnostic tag used in skip lines and the run summary.
    pub fn category(&self) -> &'static str {
        match self {
            RowError::Parse(e) => e.kind.as_str(),
            RowError::Register { .. } => "Registrar",
            RowError::Write { .. } => "Write",
        }
    }

    pub fn row_index(&self) -> u64 {
        match self {
            RowError::Parse(e) => e.row_index,
            RowError::Register { row_index, .. } | RowError::Write { row_index, .. } => *row_index,
        }
    }

    /// True when the payment service was called for this row.
    pub fn reached_registrar(&self) -> bool {
        !matches!(self, RowError::Parse(_))
    }
}

/// Aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("cannot open input {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot read input: {source}")]
    Read {
        #[source]
        source: csv::Error,
    },
}
