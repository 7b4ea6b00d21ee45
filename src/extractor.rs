//! Digest text → records.
//!
//! The digest is a run of logical lines joined by `<br>\n`. A date header line
//! (`YYYY-MM-DD...`) sets the date for the entries that follow it; an entry line
//! looks like `<a href="URL">TITLE</a>:SOURCE`. Both kinds are followed by one
//! separator line (dashes or dots) that carries no content. Anything else is
//! noise.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::record::RawRecord;

/// Joins logical lines in the digest text.
pub const LINE_BREAK: &str = "<br>\n";

/// Substring that marks a line as an entry block.
pub const ANCHOR_MARKER: &str = "<a href=";

static DATE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap());

static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a href="([^"]+)">(.+?)</a>:(.+)"#).unwrap());

/// What a single line contributes to the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// A well-formed entry. The separator after it is consumed.
    Emit(RawRecord),
    /// A date header or a malformed entry. The separator after it is consumed.
    AdvanceExtra,
    /// Noise.
    Skip,
}

/// Scan state threaded through the fold.
#[derive(Debug, Default)]
struct Scan {
    current_date: Option<String>,
    skip_next: bool,
    records: Vec<RawRecord>,
}

impl Scan {
    fn feed(mut self, line: &str) -> Self {
        if self.skip_next {
            self.skip_next = false;
            return self;
        }

        let (current_date, outcome) = step(self.current_date, line);
        self.current_date = current_date;

        match outcome {
            LineOutcome::Emit(record) => {
                self.records.push(record);
                self.skip_next = true;
            }
            LineOutcome::AdvanceExtra => self.skip_next = true,
            LineOutcome::Skip => {}
        }
        self
    }
}

/// Classifies one line given the date currently in effect, returning the date
/// in effect afterwards.
pub fn step(current_date: Option<String>, line: &str) -> (Option<String>, LineOutcome) {
    let line = line.trim();

    if let Some(m) = DATE_HEADER.find(line) {
        return (Some(m.as_str().to_string()), LineOutcome::AdvanceExtra);
    }

    if !line.contains(ANCHOR_MARKER) {
        return (current_date, LineOutcome::Skip);
    }

    match parse_entry(line, current_date.as_deref()) {
        Some(record) => (current_date, LineOutcome::Emit(record)),
        None => {
            debug!("Dropping malformed entry line: {}", line);
            (current_date, LineOutcome::AdvanceExtra)
        }
    }
}

/// Parses an anchor line into a record dated `date`. Character references in
/// the captured fields are decoded.
pub fn parse_entry(line: &str, date: Option<&str>) -> Option<RawRecord> {
    let caps = ENTRY.captures(line)?;

    Some(RawRecord {
        date: date.map(str::to_string),
        url: unescape_markup(&caps[1]),
        title: unescape_markup(&caps[2]),
        source: unescape_markup(caps[3].trim()),
    })
}

/// Escapes text for an entry line so that no field can contain a quote, a tag
/// or a line break marker.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_markup(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    // `&amp;` last, so `&amp;lt;` decodes to `&lt;`
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Extracts every entry from a digest in the order it appears.
///
/// Never fails: malformed entries are dropped, noise is ignored. Entries seen
/// before the first date header come back with `date: None`.
pub fn extract(text: &str) -> Vec<RawRecord> {
    let text = if text.contains('\r') {
        text.replace("\r\n", "\n")
    } else {
        text.to_string()
    };

    let scan = text
        .split(LINE_BREAK)
        .fold(Scan::default(), |scan, line| scan.feed(line));

    debug!("Extracted {} records", scan.records.len());
    scan.records
}
