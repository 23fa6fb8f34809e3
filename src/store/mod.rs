//! SQLite persistence for search metadata and results.
//!
//! `Database` is a cheap handle holding the file path. Every operation opens
//! its own connection and drops it before returning, so nothing stays locked
//! between menu actions.

mod models;

pub use models::{NewSearch, SearchMetadata, SearchResult};

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::pubmed::Article;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    min_year INTEGER NOT NULL,
    max_year INTEGER NOT NULL,
    research_purpose TEXT NOT NULL,
    mesh_strategy TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS search_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    metadata_id INTEGER NOT NULL REFERENCES metadata(id) ON DELETE CASCADE,
    ref_id TEXT NOT NULL,
    pmid TEXT NOT NULL,
    title TEXT NOT NULL,
    authors TEXT NOT NULL,
    abstract TEXT NOT NULL,
    doi TEXT,
    link TEXT NOT NULL,
    year INTEGER,
    UNIQUE (metadata_id, ref_id)
);
CREATE INDEX IF NOT EXISTS idx_search_results_metadata ON search_results(metadata_id);
";

const METADATA_COLUMNS: &str = "m.id, m.min_year, m.max_year, m.research_purpose, m.mesh_strategy, m.created_at,
    (SELECT COUNT(*) FROM search_results r WHERE r.metadata_id = m.id)";

const NO_TITLE: &str = "No Title";
const NO_AUTHORS: &str = "No Authors";
const NO_ABSTRACT: &str = "No Abstract";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database file and ensure the schema exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Self { path };
        db.connect()?.execute_batch(SCHEMA)?;
        debug!(path = %db.path.display(), "database ready");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Store a search and all of its articles atomically; returns the metadata id.
    ///
    /// Articles get per-search reference ids `S00001`, `S00002`, ... in order.
    /// On any failure the transaction is dropped uncommitted, which rolls it back.
    pub fn save_search(
        &self,
        search: &NewSearch<'_>,
        articles: &[Article],
    ) -> Result<i64, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO metadata (min_year, max_year, research_purpose, mesh_strategy, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                search.range.min,
                search.range.max,
                search.research_purpose,
                search.mesh_strategy,
                Utc::now(),
            ],
        )?;
        let metadata_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO search_results
                    (metadata_id, ref_id, pmid, title, authors, abstract, doi, link, year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (idx, article) in articles.iter().enumerate() {
                stmt.execute(params![
                    metadata_id,
                    ref_id(idx + 1),
                    article.pmid,
                    or_placeholder(&article.title, NO_TITLE),
                    or_placeholder(&article.authors.join(", "), NO_AUTHORS),
                    or_placeholder(&article.abstract_text, NO_ABSTRACT),
                    article.doi,
                    article.link(),
                    article.year,
                ])?;
            }
        }

        tx.commit()?;
        debug!(metadata_id, results = articles.len(), "search stored");
        Ok(metadata_id)
    }

    /// All stored searches, newest first.
    pub fn list_searches(&self) -> Result<Vec<SearchMetadata>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {METADATA_COLUMNS} FROM metadata m ORDER BY m.created_at DESC, m.id DESC"
        ))?;
        let rows = stmt
            .query_map([], metadata_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_search(&self, id: i64) -> Result<Option<SearchMetadata>, StoreError> {
        let conn = self.connect()?;
        let found = conn
            .query_row(
                &format!("SELECT {METADATA_COLUMNS} FROM metadata m WHERE m.id = ?1"),
                [id],
                metadata_from_row,
            )
            .optional()?;
        Ok(found)
    }

    /// Results of one search in reference-id order.
    pub fn search_results(&self, metadata_id: i64) -> Result<Vec<SearchResult>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, metadata_id, ref_id, pmid, title, authors, abstract, doi, link, year
             FROM search_results WHERE metadata_id = ?1 ORDER BY ref_id",
        )?;
        let rows = stmt
            .query_map([metadata_id], |row| {
                Ok(SearchResult {
                    id: row.get(0)?,
                    metadata_id: row.get(1)?,
                    ref_id: row.get(2)?,
                    pmid: row.get(3)?,
                    title: row.get(4)?,
                    authors: row.get(5)?,
                    abstract_text: row.get(6)?,
                    doi: row.get(7)?,
                    link: row.get(8)?,
                    year: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn metadata_from_row(row: &Row<'_>) -> rusqlite::Result<SearchMetadata> {
    let count: i64 = row.get(6)?;
    Ok(SearchMetadata {
        id: row.get(0)?,
        min_year: row.get(1)?,
        max_year: row.get(2)?,
        research_purpose: row.get(3)?,
        mesh_strategy: row.get(4)?,
        created_at: row.get(5)?,
        result_count: count.max(0) as usize,
    })
}

fn ref_id(index: usize) -> String {
    format!("S{index:05}")
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() { placeholder } else { value }
}
