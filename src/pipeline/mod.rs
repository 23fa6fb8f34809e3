//! One search from resolved query to articles: strategy, PubMed, retries.

pub mod retry;

use std::io::{self, Write};

use tracing::info;

use crate::llm::{Strategy, TextModel};
use crate::pubmed::{Article, ArticleSearch};
use crate::years::{RangeSource, ResolvedQuery, YearRange};

#[derive(Debug)]
pub struct SearchOutcome {
    pub range: YearRange,
    pub query: String,
    /// Purpose and strategy of the last attempt whose model calls succeeded.
    /// Both empty when none did.
    pub strategy: Strategy,
    pub articles: Vec<Article>,
    pub retries_used: usize,
}

/// Run the initial attempt and, if it finds nothing, the retry loop.
///
/// Progress goes to `out`. Model and search failures are reported there and
/// never abort the run; only writing to `out` can fail.
pub async fn run(
    model: &impl TextModel,
    search: &impl ArticleSearch,
    resolved: ResolvedQuery,
    reset_instruction: &str,
    out: &mut impl Write,
) -> io::Result<SearchOutcome> {
    let ResolvedQuery {
        range,
        query,
        source,
    } = resolved;
    report_range(range, source, out)?;
    info!(%query, %range, "running search");

    let first = retry::attempt(model, search, &query, range, out).await?;
    if !first.articles.is_empty() {
        writeln!(out, "Retrieved {} results", first.articles.len())?;
        return Ok(SearchOutcome {
            range,
            query,
            strategy: first.strategy.unwrap_or_default(),
            articles: first.articles,
            retries_used: 0,
        });
    }

    let retried = retry::retry(model, search, &query, range, reset_instruction, out).await?;
    Ok(SearchOutcome {
        range,
        query,
        strategy: retried.strategy.or(first.strategy).unwrap_or_default(),
        articles: retried.articles,
        retries_used: retried.retries_used,
    })
}

fn report_range(range: YearRange, source: RangeSource, out: &mut impl Write) -> io::Result<()> {
    let YearRange { min, max } = range;
    match source {
        RangeSource::Extracted => writeln!(out, "Extracted date range: {min} to {max}"),
        RangeSource::Default => {
            writeln!(out, "No date range found. Using defaults: {min} to {max}")
        }
        RangeSource::Flags => writeln!(out, "Using date range: {min} to {max}"),
    }
}
