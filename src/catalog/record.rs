//! Record parsing: one raw input row in, one typed game record out.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::{ParseError, ParseErrorKind};

/// Calendar format of the release-date column.
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Positions of the catalog columns, relative to the layout offset.
pub const TITLE_COL: usize = 0;
pub const GENRE_COL: usize = 1;
pub const DEVELOPER_COL: usize = 2;
pub const PUBLISHER_COL: usize = 3;
pub const COVER_COL: usize = 4;
/// Reserved for the price identifier in exported files; never read.
pub const UNUSED_COL: usize = 5;
pub const PRICE_COL: usize = 6;
pub const DATE_COL: usize = 7;
pub const DESCRIPTION_COL: usize = 8;

/// Number of columns a row must carry after the offset.
pub const REQUIRED_COLUMNS: usize = DESCRIPTION_COL + 1;

/// Unparsed input row as an ordered list of text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<String>,
}

impl RawRow {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RawRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Where the catalog columns start in a row.
///
/// Some exports carry a leading identifier column; `offset` skips it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub offset: usize,
}

impl ColumnLayout {
    pub const fn with_offset(offset: usize) -> Self {
        Self { offset }
    }

    pub fn required_len(&self) -> usize {
        self.offset + REQUIRED_COLUMNS
    }

    fn get<'a>(&self, row: &'a RawRow, col: usize) -> &'a str {
        row.field(self.offset + col).unwrap_or_default()
    }
}

/// A validated catalog item that has not been priced yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub title: String,
    pub genre: String,
    pub developer: String,
    pub publisher: String,
    pub cover_url: String,
    pub price: f64,
    pub release_date: NaiveDate,
    pub description: String,
}

impl GameRecord {
    /// Unit price in the currency's minor unit, rounded to the nearest unit.
    /// `None` when the amount does not fit an `i64`.
    pub fn unit_amount_minor(&self) -> Option<i64> {
        price_to_minor_units(self.price)
    }

    /// Attach the identifier returned by the payment service. Consumes the
    /// record so an identifier can only be set once.
    pub fn priced(self, price_id: PriceId) -> PricedGame {
        PricedGame {
            record: self,
            price_id,
        }
    }
}

/// Identifier of a price object on the payment service, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PriceId(String);

impl PriceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PriceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record enriched with its price identifier, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedGame {
    pub record: GameRecord,
    pub price_id: PriceId,
}

pub fn price_to_minor_units(price: f64) -> Option<i64> {
    let minor = (price * 100.0).round();
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    (minor.is_finite() && minor >= i64::MIN as f64 && minor < i64::MAX as f64)
        .then_some(minor as i64)
}

/// Parse one data row. Pure; `row_index` only labels errors.
pub fn parse(row: &RawRow, row_index: u64, layout: ColumnLayout) -> Result<GameRecord, ParseError> {
    if row.len() < layout.required_len() {
        return Err(ParseError::new(
            ParseErrorKind::MalformedRow,
            row_index,
            format!("{} of {} columns", row.len(), layout.required_len()),
        ));
    }

    let raw_price = layout.get(row, PRICE_COL);
    let price = parse_price(raw_price)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidPrice, row_index, raw_price))?;

    let raw_date = layout.get(row, DATE_COL);
    let release_date = parse_release_date(raw_date)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDate, row_index, raw_date))?;

    Ok(GameRecord {
        title: layout.get(row, TITLE_COL).to_string(),
        genre: layout.get(row, GENRE_COL).to_string(),
        developer: layout.get(row, DEVELOPER_COL).to_string(),
        publisher: layout.get(row, PUBLISHER_COL).to_string(),
        cover_url: layout.get(row, COVER_COL).to_string(),
        price,
        release_date,
        description: layout.get(row, DESCRIPTION_COL).to_string(),
    })
}

fn parse_price(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    let in_range = value.is_finite() && value >= 0.0 && price_to_minor_units(value).is_some();
    in_range.then_some(value)
}

fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let b = s.as_bytes();
    // chrono accepts unpadded and signed fields; the column is strictly YYYY-MM-DD.
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, RELEASE_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(price: &str, date: &str) -> RawRow {
        [
            "Game A", "RPG", "DevX", "PubY", "http://c", "unused", price, date, "desc",
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn parses_valid_row_verbatim() {
        let rec = parse(&row("19.99", "2021-05-01"), 1, ColumnLayout::default()).unwrap();
        assert_eq!(rec.title, "Game A");
        assert_eq!(rec.genre, "RPG");
        assert_eq!(rec.developer, "DevX");
        assert_eq!(rec.publisher, "PubY");
        assert_eq!(rec.cover_url, "http://c");
        assert_eq!(rec.price, 19.99);
        assert_eq!(rec.release_date, NaiveDate::from_ymd_opt(2021, 5, 1).unwrap());
        assert_eq!(rec.description, "desc");
        assert_eq!(rec.unit_amount_minor(), Some(1999));
    }

    #[test]
    fn empty_free_text_passes_through() {
        let r: RawRow = ["", "", "", "", "", "", "0", "2000-01-01", ""]
            .into_iter()
            .collect();
        let rec = parse(&r, 1, ColumnLayout::default()).unwrap();
        assert_eq!(rec.title, "");
        assert_eq!(rec.description, "");
        assert_eq!(rec.price, 0.0);
    }

    #[test]
    fn rejects_bad_prices() {
        for raw in ["free", "", "-1", "NaN", "inf", "12,50"] {
            let err = parse(&row(raw, "2021-05-01"), 3, ColumnLayout::default()).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::InvalidPrice, "{raw}");
            assert_eq!(err.row_index, 3);
            assert_eq!(err.raw_value, raw);
        }
    }

    #[test]
    fn rejects_bad_dates() {
        for raw in ["01/05/2021", "2021-5-1", "2021-02-30", "", "2021-05-01T00:00:00"] {
            let err = parse(&row("5", raw), 7, ColumnLayout::default()).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::InvalidDate, "{raw}");
            assert_eq!(err.raw_value, raw);
        }
    }

    #[test]
    fn price_is_checked_before_date() {
        let err = parse(&row("free", "nope"), 1, ColumnLayout::default()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPrice);
    }

    #[test]
    fn short_row_is_malformed() {
        let r: RawRow = ["Game A", "RPG", "DevX"].into_iter().collect();
        let err = parse(&r, 5, ColumnLayout::default()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedRow);
        assert_eq!(err.raw_value, "3 of 9 columns");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let mut fields: Vec<String> = [
            "Game A", "RPG", "DevX", "PubY", "http://c", "unused", "1", "2021-05-01", "desc",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        fields.push("trailing".into());
        let rec = parse(&RawRow::new(fields), 1, ColumnLayout::default()).unwrap();
        assert_eq!(rec.description, "desc");
    }

    #[test]
    fn offset_skips_leading_id_column() {
        let r: RawRow = [
            "42", "Game A", "RPG", "DevX", "PubY", "http://c", "", "9.5", "2020-12-31", "desc",
        ]
        .into_iter()
        .collect();
        let rec = parse(&r, 1, ColumnLayout::with_offset(1)).unwrap();
        assert_eq!(rec.title, "Game A");
        assert_eq!(rec.unit_amount_minor(), Some(950));

        let short = parse(&row("1", "2021-05-01"), 1, ColumnLayout::with_offset(1)).unwrap_err();
        assert_eq!(short.kind, ParseErrorKind::MalformedRow);
    }

    #[test]
    fn minor_units_round_instead_of_truncating() {
        assert_eq!(price_to_minor_units(19.99), Some(1999));
        assert_eq!(price_to_minor_units(0.29), Some(29));
        assert_eq!(price_to_minor_units(59.0), Some(5900));
    }

    #[test]
    fn minor_units_out_of_range_are_none() {
        assert_eq!(price_to_minor_units(1e16), Some(1_000_000_000_000_000_000));
        assert_eq!(price_to_minor_units(1e17), None);
        assert_eq!(price_to_minor_units(f64::MAX), None);
    }

    #[test]
    fn price_overflowing_minor_units_is_invalid() {
        for raw in ["1e17", "92233720368547758.08", "1e300"] {
            let err = parse(&row(raw, "2021-05-01"), 2, ColumnLayout::default()).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::InvalidPrice, "{raw}");
            assert_eq!(err.raw_value, raw);
        }
        let rec = parse(&row("1e16", "2021-05-01"), 2, ColumnLayout::default()).unwrap();
        assert_eq!(rec.unit_amount_minor(), Some(1_000_000_000_000_000_000));
    }
}
