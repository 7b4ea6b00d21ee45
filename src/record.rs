use std::fmt::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format shared by digest headers and the tabular `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats `date` with a strftime pattern, or `None` when the pattern has an
/// unknown specifier or one a plain date can't fill (`%H`, `%z`).
pub fn try_format_date(date: NaiveDate, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).ok()?;
    Some(out)
}

/// Formats `date` for display, falling back to `DATE_FORMAT` when `format`
/// can't be used.
pub fn format_date(date: NaiveDate, format: &str) -> String {
    try_format_date(date, format).unwrap_or_else(|| date.format(DATE_FORMAT).to_string())
}

/// An entry as it comes out of the digest text, before its date is parsed.
///
/// `date` is whatever the most recent date header said, or `None` when the
/// entry appeared before any header. Also the shape of a tabular row before
/// its `date` column is checked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    pub date: Option<String>,
    pub url: String,
    pub title: String,
    pub source: String,
}

/// A normalized entry. Field order is the column order of the tabular form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub url: String,
    pub title: String,
    pub source: String,
}

impl Record {
    pub fn new(
        date: NaiveDate,
        url: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            date,
            url: url.into(),
            title: title.into(),
            source: source.into(),
        }
    }
}

impl TryFrom<RawRecord> for Record {
    type Error = RawRecord;

    /// Fails (handing the raw record back) when the date is absent or not a
    /// calendar date.
    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let parsed = raw
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok());

        match parsed {
            Some(date) => Ok(Record {
                date,
                url: raw.url,
                title: raw.title,
                source: raw.source,
            }),
            None => Err(raw),
        }
    }
}
