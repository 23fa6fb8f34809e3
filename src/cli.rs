use clap::Parser;

/// Sentinel - PubMed research assistant
/// Turns a research question into a MeSH search and keeps a history of results
#[derive(Debug, Parser)]
#[command(name = "sentinel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run one search non-interactively instead of opening the menu
    #[arg(long)]
    pub query: Option<String>,

    /// Earliest publication year (overrides any range in the query)
    #[arg(long = "min_year", value_name = "YEAR")]
    pub min_year: Option<i32>,

    /// Latest publication year (overrides any range in the query)
    #[arg(long = "max_year", value_name = "YEAR")]
    pub max_year: Option<i32>,

    /// Export the stored search to CSV once it completes
    #[arg(long)]
    pub export: bool,
}

impl Cli {
    /// The `--query` text, or `None` when absent or blank.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
