//! Filter → sort → paginate, packaged for display.

use crate::filter::FilterCriteria;
use crate::paginate::{clamp_page_index, paginate, sort_by_date, total_pages, PageRequest};
use crate::record::{self, Record, DATE_FORMAT};
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    pub date: String,
    pub url: String,
    pub title: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOption {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub records: Vec<RecordView>,
    /// Records left after filtering, across all pages.
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub sources: Vec<SourceOption>,
    /// Earliest and latest dates in the whole store, `YYYY-MM-DD`.
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

impl ViewModel {
    pub fn has_prev(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }

    /// Nothing survived filtering; distinct from failing to load data.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Runs the whole pipeline over `store`. The requested page is clamped into
/// range first.
pub fn render(
    store: &RecordStore,
    criteria: &FilterCriteria,
    request: PageRequest,
    date_format: &str,
) -> ViewModel {
    let mut visible = criteria.apply(store);
    sort_by_date(&mut visible, request.sort_direction);

    let pages = total_pages(visible.len(), request.page_size);
    let page_index = clamp_page_index(request.page_index, pages);
    let page = paginate(&visible, request.page_size, page_index);

    let records = page
        .items
        .iter()
        .map(|r| record_view(r, date_format))
        .collect();

    let sources = store
        .sources()
        .into_iter()
        .map(|name| SourceOption {
            name: name.to_string(),
            selected: criteria
                .allowed_sources
                .as_ref()
                .map_or(true, |set| set.contains(name)),
        })
        .collect();

    let bounds = store.date_bounds();

    ViewModel {
        records,
        total_count: page.total_count,
        page_index: page.page_index,
        page_size: page.page_size,
        total_pages: page.total_pages,
        sources,
        min_date: bounds.map(|(min, _)| min.format(DATE_FORMAT).to_string()),
        max_date: bounds.map(|(_, max)| max.format(DATE_FORMAT).to_string()),
    }
}

/// Display form of one record. An unusable `date_format` falls back to
/// `YYYY-MM-DD`.
pub fn record_view(record: &Record, date_format: &str) -> RecordView {
    RecordView {
        date: record::format_date(record.date, date_format),
        url: record.url.clone(),
        title: record.title.clone(),
        source: record.source.clone(),
    }
}
