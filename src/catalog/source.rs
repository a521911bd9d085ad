use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};

use super::error::FatalError;
use super::record::RawRow;

/// One item pulled from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    Row(RawRow),
    /// A record the decoder could not turn into text fields. Carries the
    /// decoder's message.
    Undecodable(String),
}

/// Sequential supplier of input rows. `Ok(None)` signals end of data.
pub trait RowSource {
    fn next_item(&mut self) -> Result<Option<SourceItem>, FatalError>;
}

/// Comma-delimited file reader. Rows may have any width; the parser decides
/// whether a row is long enough.
pub struct CsvRowSource<R: Read> {
    reader: Reader<R>,
    record: StringRecord,
}

impl CsvRowSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FatalError> {
        let path = path.as_ref();
        let reader = builder()
            .from_path(path)
            .map_err(|source| FatalError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::with_reader(reader))
    }
}

impl<R: Read> CsvRowSource<R> {
    pub fn from_reader(rdr: R) -> Self {
        Self::with_reader(builder().from_reader(rdr))
    }

    fn with_reader(reader: Reader<R>) -> Self {
        Self {
            reader,
            record: StringRecord::new(),
        }
    }
}

fn builder() -> ReaderBuilder {
    let mut b = ReaderBuilder::new();
    // The header is discarded by the driver, not by the decoder.
    b.has_headers(false).flexible(true).trim(csv::Trim::None);
    b
}

impl<R: Read> RowSource for CsvRowSource<R> {
    fn next_item(&mut self) -> Result<Option<SourceItem>, FatalError> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => Ok(None),
            Ok(true) => Ok(Some(SourceItem::Row(self.record.iter().collect()))),
            Err(e) if e.is_io_error() => Err(FatalError::Read { source: e }),
            Err(e) => Ok(Some(SourceItem::Undecodable(e.to_string()))),
        }
    }
}
