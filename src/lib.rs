//! Blog Digest - yesterday's posts from a fixed set of feeds
//!
//! This crate turns RSS feeds into a dated digest, parses that digest back
//! into records, stores them as CSV and serves a filterable, paginated
//! browser over them alongside a small message board.

pub mod config;
pub mod db;
pub mod digest;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod paginate;
pub mod record;
pub mod routes;
pub mod store;
pub mod tabular;
pub mod view;

pub use error::{Error, Result};
