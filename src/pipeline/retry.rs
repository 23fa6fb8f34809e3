use std::io::{self, Write};

use tracing::{info, warn};

use crate::llm::{Strategy, TextModel, generate_strategy};
use crate::pubmed::{Article, ArticleSearch};
use crate::years::YearRange;

/// Extra attempts made after an initial attempt comes back empty.
pub const MAX_RETRIES: usize = 3;

/// Result of one strategy-then-search round.
///
/// `strategy` is `None` when the model calls failed. A failed search leaves
/// `articles` empty; callers cannot tell it apart from a search with no hits.
#[derive(Debug, Default)]
pub(crate) struct Attempt {
    pub strategy: Option<Strategy>,
    pub articles: Vec<Article>,
}

#[derive(Debug, Default)]
pub struct RetryOutcome {
    pub strategy: Option<Strategy>,
    pub articles: Vec<Article>,
    pub retries_used: usize,
}

pub(crate) async fn attempt(
    model: &impl TextModel,
    search: &impl ArticleSearch,
    query: &str,
    range: YearRange,
    out: &mut impl Write,
) -> io::Result<Attempt> {
    let strategy = match generate_strategy(model, query).await {
        Ok(strategy) => strategy,
        Err(e) => {
            warn!(error = %e, "strategy generation failed");
            writeln!(out, "Model Error: {e}")?;
            return Ok(Attempt::default());
        }
    };
    writeln!(out, "Research Purpose: {}", strategy.research_purpose)?;
    writeln!(out, "MeSH Search Strategy: {}", strategy.mesh_strategy)?;

    let articles = match search.search(&strategy.mesh_strategy, range).await {
        Ok(articles) => articles,
        Err(e) => {
            warn!(error = %e, strategy = %strategy.mesh_strategy, "search failed");
            writeln!(out, "Search Error: {e}")?;
            Vec::new()
        }
    };

    Ok(Attempt {
        strategy: Some(strategy),
        articles,
    })
}

/// Prefix the query with the reset instruction. Blank instructions leave it unchanged.
pub fn with_reset(instruction: &str, query: &str) -> String {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        query.to_string()
    } else {
        format!("{instruction} {query}")
    }
}

/// Re-run strategy generation and search until one attempt returns articles
/// or `MAX_RETRIES` attempts are spent.
pub async fn retry(
    model: &impl TextModel,
    search: &impl ArticleSearch,
    query: &str,
    range: YearRange,
    reset_instruction: &str,
    out: &mut impl Write,
) -> io::Result<RetryOutcome> {
    let query = with_reset(reset_instruction, query);
    let mut strategy = None;

    for n in 1..=MAX_RETRIES {
        writeln!(out, "No results found. Retrying ({n}/{MAX_RETRIES})...")?;
        info!(attempt = n, "retrying with reset instruction");

        let current = attempt(model, search, &query, range, out).await?;
        if current.strategy.is_some() {
            strategy = current.strategy;
        }
        if !current.articles.is_empty() {
            writeln!(
                out,
                "Retrieved {} results after retry.",
                current.articles.len()
            )?;
            return Ok(RetryOutcome {
                strategy,
                articles: current.articles,
                retries_used: n,
            });
        }
    }

    writeln!(out, "No results found after retries.")?;
    Ok(RetryOutcome {
        strategy,
        articles: Vec::new(),
        retries_used: MAX_RETRIES,
    })
}
