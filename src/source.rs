use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use crate::article::{RawArticle, RawTimestamp};
use crate::error::{Error, Result};

/// Somewhere a full copy of the article dataset can be fetched from.
pub trait DatasetSource {
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<RawArticle>>;
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: RawArticle,
}

/// Largest `length` the `/rows` endpoint serves in one page.
pub const MAX_PAGE_SIZE: usize = 100;

/// Pages through a dataset hub's `/rows` endpoint.
#[derive(Debug, Clone)]
pub struct HubSource {
    endpoint: String,
    dataset: String,
    config: String,
    split: String,
    page_size: usize,
    client: reqwest::blocking::Client,
}

impl HubSource {
    pub fn new(
        endpoint: &str,
        dataset: &str,
        config: &str,
        split: &str,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "hub page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }
        // fail early on a malformed endpoint rather than on the first request
        Url::parse(endpoint)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HubSource {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            dataset: dataset.to_string(),
            config: config.to_string(),
            split: split.to_string(),
            page_size,
            client,
        })
    }

    pub fn page_url(&self, offset: usize) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rows", self.endpoint))?;
        url.query_pairs_mut()
            .append_pair("dataset", &self.dataset)
            .append_pair("config", &self.config)
            .append_pair("split", &self.split)
            .append_pair("offset", &offset.to_string())
            .append_pair("length", &self.page_size.to_string());
        Ok(url)
    }

    fn fetch_page(&self, offset: usize) -> Result<RowsPage> {
        let url = self.page_url(offset)?;
        debug!(action = "request", component = "hub_source", url = %url, "Fetching rows page");
        let page = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json::<RowsPage>()?;
        Ok(page)
    }
}

impl DatasetSource for HubSource {
    fn describe(&self) -> String {
        format!("{} ({}/{}) via {}", self.dataset, self.config, self.split, self.endpoint)
    }

    fn fetch(&self) -> Result<Vec<RawArticle>> {
        let start_time = Instant::now();
        info!(action = "start", component = "hub_source", dataset = %self.dataset, "Fetching dataset");

        let rows = collect_pages(|offset| self.fetch_page(offset))?;

        info!(
            action = "complete",
            component = "hub_source",
            row_count = rows.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Dataset fetched"
        );
        Ok(rows)
    }
}

/// Requests pages at increasing offsets until the reported total is reached
/// or a page comes back empty.
fn collect_pages<F>(mut fetch_page: F) -> Result<Vec<RawArticle>>
where
    F: FnMut(usize) -> Result<RowsPage>,
{
    let mut rows = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch_page(offset)?;
        let received = page.rows.len();
        rows.extend(page.rows.into_iter().map(|entry| entry.row));
        offset += received;

        if received == 0 || offset >= page.num_rows_total {
            break;
        }
    }
    Ok(rows)
}

/// Reads articles from a table in a local SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
    table: String,
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>, table: &str) -> Result<Self> {
        let valid = !table.is_empty()
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !table.starts_with(|c: char| c.is_ascii_digit());
        if !valid {
            return Err(Error::Config(format!("invalid table name '{}'", table)));
        }
        Ok(SqliteSource {
            path: path.into(),
            table: table.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for SqliteSource {
    fn describe(&self) -> String {
        format!("{} (table {})", self.path.display(), self.table)
    }

    fn fetch(&self) -> Result<Vec<RawArticle>> {
        let start_time = Instant::now();
        info!(action = "start", component = "sqlite_source", path = ?self.path, "Reading dataset");

        if !self.path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("dataset file not found at {:?}", self.path),
            )));
        }

        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let sql = format!(
            "SELECT agency, published_at, title, url FROM {} ORDER BY rowid",
            self.table
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let published_at = match row.get_ref(1)? {
                    ValueRef::Integer(ms) => RawTimestamp::Millis(ms),
                    ValueRef::Text(text) => {
                        RawTimestamp::Text(String::from_utf8_lossy(text).into_owned())
                    }
                    other => {
                        return Err(rusqlite::Error::InvalidColumnType(
                            1,
                            "published_at".to_string(),
                            other.data_type(),
                        ))
                    }
                };
                Ok(RawArticle {
                    agency: row.get(0)?,
                    published_at,
                    title: row.get(2)?,
                    url: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<RawArticle>>>()?;

        info!(
            action = "complete",
            component = "sqlite_source",
            row_count = rows.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Dataset read"
        );
        Ok(rows)
    }
}
