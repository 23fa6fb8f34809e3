use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::store::{Database, SearchResult, StoreError};

const HEADER: [&str; 8] = ["RefID", "PMID", "Title", "Authors", "Year", "DOI", "Link", "Abstract"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Search {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Serialize)]
struct Row<'a> {
    ref_id: &'a str,
    pmid: &'a str,
    title: &'a str,
    authors: &'a str,
    year: Option<i32>,
    doi: Option<&'a str>,
    link: &'a str,
    abstract_text: &'a str,
}

impl<'a> From<&'a SearchResult> for Row<'a> {
    fn from(r: &'a SearchResult) -> Self {
        Self {
            ref_id: &r.ref_id,
            pmid: &r.pmid,
            title: &r.title,
            authors: &r.authors,
            year: r.year,
            doi: r.doi.as_deref(),
            link: &r.link,
            abstract_text: &r.abstract_text,
        }
    }
}

pub fn export_path(dir: &Path, id: i64) -> PathBuf {
    dir.join(format!("search_{id}.csv"))
}

/// Write one stored search to `{dir}/search_{id}.csv`, replacing any earlier export.
pub fn export_search(db: &Database, id: i64, dir: &Path) -> Result<ExportSummary, ExportError> {
    if db.get_search(id)?.is_none() {
        return Err(ExportError::NotFound(id));
    }
    let results = db.search_results(id)?;

    std::fs::create_dir_all(dir)?;
    let path = export_path(dir, id);
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;

    // Written by hand so a search with no results still gets a header line.
    wtr.write_record(HEADER)?;
    for result in &results {
        wtr.serialize(Row::from(result))?;
    }
    wtr.flush()?;

    info!(id, rows = results.len(), path = %path.display(), "search exported");
    Ok(ExportSummary {
        path,
        rows: results.len(),
    })
}
