use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::record;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    /// CSV file the browser loads
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Records per page in the browser
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Maximum rows written on export; unlimited when absent
    #[serde(default)]
    pub export_limit: Option<usize>,
    /// chrono format string for displayed dates
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("blog_data.csv")
}

fn default_database_url() -> String {
    "sqlite:blog_digest.db?mode=rwc".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_page_size() -> usize {
    50
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

/// A feed to pull yesterday's entries from. `name` becomes each record's
/// source label.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            data_path: default_data_path(),
            database_url: default_database_url(),
            bind: default_bind(),
            page_size: default_page_size(),
            export_limit: None,
            date_format: default_date_format(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be positive".to_string()));
        }
        if record::try_format_date(NaiveDate::default(), &self.date_format).is_none() {
            return Err(Error::Config(format!(
                "date_format '{}' cannot format a date",
                self.date_format
            )));
        }
        Ok(())
    }
}
