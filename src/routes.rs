use std::path::Path;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{error, info};

use crate::db::{Database, Message};
use crate::error::Error;
use crate::filter::FilterCriteria;
use crate::paginate::{PageRequest, SortDirection};
use crate::record::{Record, DATE_FORMAT};
use crate::store::RecordStore;
use crate::tabular;
use crate::view::{self, RecordView, ViewModel};

const MESSAGES_SHOWN: i64 = 100;
const PREVIEW_ROWS: usize = 5;

pub struct AppState {
    pub store: RecordStore,
    /// Why the data file could not be read, if it couldn't.
    pub load_error: Option<String>,
    pub db: Arc<Database>,
    pub page_size: usize,
    pub date_format: String,
    pub loaded_at: String,
}

impl AppState {
    /// Loads the record file, falling back to the built-in sample data when it
    /// can't be read.
    pub fn load(data_path: &Path, db: Arc<Database>, page_size: usize, date_format: &str) -> Self {
        let (store, load_error) = match tabular::load(data_path) {
            Ok(records) => (RecordStore::new(records), None),
            Err(e) => {
                error!("Failed to load {}: {}", data_path.display(), e);
                (RecordStore::new(sample_records()), Some(e.to_string()))
            }
        };

        Self {
            store,
            load_error,
            db,
            page_size,
            date_format: date_format.to_string(),
            loaded_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Shown when the data file is missing or unreadable.
pub fn sample_records() -> Vec<Record> {
    let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap_or_default();
    let source = "ハムスター速報";
    vec![
        Record::new(date, "https://hamusoku.com/archives/10858699.html", "スタバのキラキラ女性店員さん　あまりにも勝ち組陽キャ感が凄い", source),
        Record::new(date, "https://hamusoku.com/archives/10857168.html", "東京に来たんやが臭くて草", source),
        Record::new(date, "https://hamusoku.com/archives/10858443.html", "アメリカのカードショップ　日本と同じく臭いことが判明", source),
        Record::new(date, "https://hamusoku.com/archives/10858392.html", "ワイ、福井県立大学恐竜学部に合格", source),
    ]
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/preview", post(preview))
        .route("/messages", get(messages).post(post_message))
        .route("/health", get(health))
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: ViewModel,
    pub start: String,
    pub end: String,
    pub keyword: String,
    pub newest_first: bool,
    pub page_links: Vec<PageLink>,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub load_error: Option<String>,
    pub loaded_at: String,
}

pub struct PageLink {
    pub number: usize,
    pub url: String,
    pub current: bool,
}

#[derive(Template)]
#[template(path = "messages.html")]
pub struct MessagesTemplate {
    pub messages: Vec<Message>,
}

#[derive(Template)]
#[template(path = "preview.html")]
pub struct PreviewTemplate {
    pub records: Vec<RecordView>,
    pub total: usize,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<Error>() {
            Some(Error::InvalidQuery(_)) | Some(Error::Format(_)) | Some(Error::Csv(_)) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("Error: {}", self.0)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

/// Browse page parameters.
///
/// `source` may repeat. Because a form with nothing ticked sends no `source`
/// at all, the form also sends `sources_set`; with it the `source` values are
/// a constraint (possibly empty), without it there is no source constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub sources: Option<Vec<String>>,
    pub keyword: Option<String>,
    pub sort: SortDirection,
    pub page: usize,
    pub page_size: Option<usize>,
}

impl BrowseQuery {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
            .map_err(|e| Error::InvalidQuery(e.to_string()))?;

        let mut query = BrowseQuery {
            page: 1,
            ..Default::default()
        };
        let mut sources = Vec::new();
        let mut sources_set = false;

        for (key, value) in pairs {
            // Source names match exactly and are never trimmed.
            if key == "source" {
                sources.push(value);
                continue;
            }

            let value = value.trim().to_string();
            match key.as_str() {
                "start" if !value.is_empty() => query.start = Some(value),
                "end" if !value.is_empty() => query.end = Some(value),
                "q" if !value.is_empty() => query.keyword = Some(value),
                "sources_set" => sources_set = true,
                "sort" => {
                    query.sort = match value.as_str() {
                        "newest" | "newest_first" | "" => SortDirection::Newest,
                        "oldest" | "oldest_first" => SortDirection::Oldest,
                        other => {
                            return Err(Error::InvalidQuery(format!("unknown sort '{}'", other)))
                        }
                    }
                }
                "page" if !value.is_empty() => {
                    query.page = value
                        .parse()
                        .map_err(|_| Error::InvalidQuery(format!("bad page '{}'", value)))?;
                }
                "page_size" if !value.is_empty() => {
                    let size: usize = value
                        .parse()
                        .map_err(|_| Error::InvalidQuery(format!("bad page_size '{}'", value)))?;
                    if size == 0 {
                        return Err(Error::InvalidQuery("page_size must be positive".to_string()));
                    }
                    query.page_size = Some(size);
                }
                _ => {}
            }
        }

        if sources_set || !sources.is_empty() {
            query.sources = Some(sources);
        }

        Ok(query)
    }

    /// Builds filter criteria. A date range applies when either bound is
    /// given; the other bound falls back to the store's extent.
    pub fn criteria(&self, store: &RecordStore) -> Result<FilterCriteria, Error> {
        let mut criteria = FilterCriteria::default();

        if self.start.is_some() || self.end.is_some() {
            let bounds = store.date_bounds();
            let start = match &self.start {
                Some(s) => parse_date(s)?,
                None => bounds.map_or(NaiveDate::MIN, |(min, _)| min),
            };
            let end = match &self.end {
                Some(s) => parse_date(s)?,
                None => bounds.map_or(NaiveDate::MAX, |(_, max)| max),
            };
            criteria = criteria.with_date_range(start, end);
        }

        if let Some(sources) = &self.sources {
            criteria = criteria.with_sources(sources.iter().cloned());
        }

        if let Some(keyword) = &self.keyword {
            criteria = criteria.with_keyword(keyword.clone());
        }

        Ok(criteria)
    }

    pub fn page_request(&self, default_page_size: usize) -> PageRequest {
        PageRequest::new(
            self.sort,
            self.page_size.unwrap_or(default_page_size),
            self.page,
        )
    }

    /// Query string reproducing this query at another page.
    pub fn to_query_string(&self, page: usize) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(start) = &self.start {
            pairs.push(("start", start.clone()));
        }
        if let Some(end) = &self.end {
            pairs.push(("end", end.clone()));
        }
        if let Some(sources) = &self.sources {
            pairs.push(("sources_set", "1".to_string()));
            for source in sources {
                pairs.push(("source", source.clone()));
            }
        }
        if let Some(keyword) = &self.keyword {
            pairs.push(("q", keyword.clone()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        if let Some(size) = self.page_size {
            pairs.push(("page_size", size.to_string()));
        }
        pairs.push(("page", page.to_string()));

        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| Error::InvalidQuery(format!("bad date '{}'", value)))
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let query = BrowseQuery::parse(raw.as_deref().unwrap_or(""))?;
    let criteria = query.criteria(&state.store)?;
    let request = query.page_request(state.page_size);

    let view = view::render(&state.store, &criteria, request, &state.date_format);
    info!(
        "Browse: {} matching records, page {}/{}",
        view.total_count, view.page_index, view.total_pages
    );

    let link = |n: usize| format!("/?{}", query.to_query_string(n));
    let page_links = (1..=view.total_pages)
        .map(|number| PageLink {
            number,
            url: link(number),
            current: number == view.page_index,
        })
        .collect();
    let prev_url = view.has_prev().then(|| link(view.page_index - 1));
    let next_url = view.has_next().then(|| link(view.page_index + 1));

    Ok(HtmlTemplate(IndexTemplate {
        start: query.start.clone().or_else(|| view.min_date.clone()).unwrap_or_default(),
        end: query.end.clone().or_else(|| view.max_date.clone()).unwrap_or_default(),
        keyword: query.keyword.clone().unwrap_or_default(),
        newest_first: query.sort == SortDirection::Newest,
        page_links,
        prev_url,
        next_url,
        load_error: state.load_error.clone(),
        loaded_at: state.loaded_at.clone(),
        view,
    }))
}

/// Parses an uploaded CSV body and shows its first rows.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let records = tabular::read_records(body.as_bytes())?;
    let total = records.len();

    let records = records
        .iter()
        .take(PREVIEW_ROWS)
        .map(|r| view::record_view(r, &state.date_format))
        .collect();

    Ok(HtmlTemplate(PreviewTemplate { records, total }))
}

#[derive(Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

pub async fn messages(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.db.get_messages(MESSAGES_SHOWN).await?;
    Ok(HtmlTemplate(MessagesTemplate { messages }))
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    let name = form.name.trim();
    let message = form.message.trim();

    if name.is_empty() || message.is_empty() {
        return Err(Error::InvalidQuery("name and message are required".to_string()).into());
    }

    state.db.add_message(name, message).await?;
    Ok(Redirect::to("/messages"))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
