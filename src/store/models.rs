use chrono::{DateTime, Utc};

use crate::years::YearRange;

/// Summary row for one completed search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMetadata {
    pub id: i64,
    pub min_year: i32,
    pub max_year: i32,
    pub research_purpose: String,
    pub mesh_strategy: String,
    pub created_at: DateTime<Utc>,
    pub result_count: usize,
}

impl SearchMetadata {
    pub fn range(&self) -> YearRange {
        YearRange::new(self.min_year, self.max_year)
    }
}

/// One stored article belonging to a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub id: i64,
    pub metadata_id: i64,
    pub ref_id: String,
    pub pmid: String,
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub doi: Option<String>,
    pub link: String,
    pub year: Option<i32>,
}

/// Values for a metadata row about to be inserted.
#[derive(Debug, Clone, Copy)]
pub struct NewSearch<'a> {
    pub range: YearRange,
    pub research_purpose: &'a str,
    pub mesh_strategy: &'a str,
}
