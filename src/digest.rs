//! Builds the daily digest text from the configured feeds.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use feed_rs::parser;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::FeedConfig;
use crate::error::Result;
use crate::extractor::{escape_markup, LINE_BREAK};
use crate::record::DATE_FORMAT;

pub const DATE_SEPARATOR: &str = "--------------------------------";
pub const ENTRY_SEPARATOR: &str = "....................";

/// One feed entry headed for the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEntry {
    pub link: String,
    pub title: String,
    pub source: String,
    pub published: DateTime<Utc>,
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("BlogDigest/0.1 (RSS digest)")
            .build()?;

        Ok(Self { client })
    }

    /// Downloads and parses one feed.
    pub async fn fetch_feed(&self, feed: &FeedConfig) -> Result<Vec<DigestEntry>> {
        info!("Fetching feed: {} ({})", feed.name, feed.url);

        let response = self.client.get(&feed.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let parsed = parser::parse(&bytes[..])?;
        Ok(entries_from_feed(parsed, &feed.name))
    }

    /// Entries from every feed published on `day` in `tz`, in feed order then
    /// entry order. A feed that fails is logged and skipped.
    pub async fn collect<Tz: TimeZone>(
        &self,
        feeds: &[FeedConfig],
        day: NaiveDate,
        tz: &Tz,
    ) -> Vec<DigestEntry> {
        let mut collected = Vec::new();

        for feed in feeds {
            match self.fetch_feed(feed).await {
                Ok(entries) => {
                    let before = collected.len();
                    collected.extend(
                        entries
                            .into_iter()
                            .filter(|e| published_on(e.published, day, tz)),
                    );
                    info!(
                        "{} entries from '{}' published on {}",
                        collected.len() - before,
                        feed.name,
                        day
                    );
                }
                Err(e) => error!("Failed to fetch feed '{}': {}", feed.name, e),
            }
        }

        collected
    }
}

/// Converts a parsed feed into digest entries labelled with `source`.
///
/// Entries without a link or any timestamp cannot appear in a dated digest and
/// are skipped.
pub fn entries_from_feed(feed: feed_rs::model::Feed, source: &str) -> Vec<DigestEntry> {
    let mut entries = Vec::new();

    for entry in feed.entries {
        let title = entry
            .title
            .as_ref()
            .map(|t| single_line(&t.content))
            .unwrap_or_else(|| "Untitled".to_string());

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        if link.is_empty() {
            warn!("Skipping entry with no link: {}", title);
            continue;
        }

        let Some(published) = entry.published.or(entry.updated) else {
            warn!("Skipping entry with no date: {}", title);
            continue;
        };

        entries.push(DigestEntry {
            link,
            title,
            source: source.to_string(),
            published,
        });
    }

    entries
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `published`, seen from `tz`, falls on `day`.
pub fn published_on<Tz: TimeZone>(published: DateTime<Utc>, day: NaiveDate, tz: &Tz) -> bool {
    published.with_timezone(tz).date_naive() == day
}

/// The local calendar day before today.
pub fn yesterday() -> NaiveDate {
    Local::now().date_naive().pred_opt().unwrap_or(NaiveDate::MIN)
}

/// Renders a digest for `day`: a date header block followed by one entry
/// block per entry. Link, title and source are HTML-escaped.
pub fn render(day: NaiveDate, entries: &[DigestEntry]) -> String {
    let mut out = format!(
        "{}{}{}{}",
        day.format(DATE_FORMAT),
        LINE_BREAK,
        DATE_SEPARATOR,
        LINE_BREAK
    );

    for entry in entries {
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>:{}{}{}{}",
            escape_markup(&entry.link),
            escape_markup(&entry.title),
            escape_markup(&single_line(&entry.source)),
            LINE_BREAK,
            ENTRY_SEPARATOR,
            LINE_BREAK
        ));
    }

    out
}
