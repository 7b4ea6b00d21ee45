//! The `date,url,title,source` CSV form of a record collection.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::record::{RawRecord, Record};
use crate::store;

pub const HEADER: [&str; 4] = ["date", "url", "title", "source"];

/// Writes a header row and up to `limit` records. Returns the number of rows
/// written.
pub fn write_records<W: Write>(writer: W, records: &[Record], limit: Option<usize>) -> Result<usize> {
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(HEADER)?;

    let count = limit.map_or(records.len(), |l| l.min(records.len()));
    if count < records.len() {
        warn!(
            "Export limit {} reached, {} records not written",
            count,
            records.len() - count
        );
    }

    for record in &records[..count] {
        out.serialize(record)?;
    }
    out.flush()?;

    Ok(count)
}

/// Reads records in file order. The header row is required and must name the
/// four columns in order.
///
/// Rows go through the same normalization as extracted entries: a row whose
/// date does not parse, or whose shape is wrong, is logged and skipped. Only a
/// bad header or an I/O failure fails the whole read.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rows = csv::Reader::from_reader(reader);

    let headers = rows.headers()?.clone();
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(Error::Format(format!(
            "expected header {:?}, found {:?}",
            HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut raw = Vec::new();
    for row in rows.deserialize::<RawRecord>() {
        match row {
            Ok(record) => raw.push(record),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => warn!("Skipping malformed row: {}", e),
        }
    }
    Ok(store::normalize(raw).into_records())
}

pub fn export<P: AsRef<Path>>(path: P, records: &[Record], limit: Option<usize>) -> Result<usize> {
    let file = File::create(path.as_ref())?;
    let written = write_records(file, records, limit)?;
    info!("Wrote {} records to {}", written, path.as_ref().display());
    Ok(written)
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let file = File::open(path.as_ref())?;
    let records = read_records(file)?;
    info!("Loaded {} records from {}", records.len(), path.as_ref().display());
    Ok(records)
}
