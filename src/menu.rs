//! Interactive menu and the one-shot `--query` run.
//!
//! Everything is generic over the input and output streams so the whole loop
//! can be driven from a byte buffer in tests.

use std::io::{self, BufRead, Write};

use tracing::{error, warn};

use crate::config::Config;
use crate::export::export_search;
use crate::llm::TextModel;
use crate::markdown::single_line;
use crate::pipeline;
use crate::pubmed::ArticleSearch;
use crate::store::{Database, NewSearch};
use crate::years::resolve_range;

const WELCOME: &str = "[Sentinel]: Welcome to Sentinel, how can I assist you today?";
const MENU: &str = "Menu:\n1. Run new PubMed search\n2. View history and export results\n3. Quit";
const QUERY_PROMPT: &str = "[Sentinel]: Enter your search query or 'r' to return: ";
const EXPORT_PROMPT: &str = "[Sentinel]: Enter a number to export or 'r' to return: ";

/// Options for a single search, from the command line or the menu.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchOptions {
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub export: bool,
}

pub struct Menu<'a, M, S> {
    config: &'a Config,
    db: &'a Database,
    model: &'a M,
    search: &'a S,
}

impl<'a, M: TextModel, S: ArticleSearch> Menu<'a, M, S> {
    pub fn new(config: &'a Config, db: &'a Database, model: &'a M, search: &'a S) -> Self {
        Self {
            config,
            db,
            model,
            search,
        }
    }

    /// Main loop. Returns on Quit or end of input. `options` apply to every
    /// search started from the menu.
    pub async fn run(
        &self,
        options: SearchOptions,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> io::Result<()> {
        writeln!(out, "{WELCOME}")?;
        loop {
            writeln!(out, "\n{MENU}")?;
            write!(out, "Enter your choice: ")?;
            out.flush()?;

            let Some(choice) = read_line(input)? else {
                break;
            };
            match choice.as_str() {
                "1" => self.prompt_search(options, input, out).await?,
                "2" => self.view_history(input, out)?,
                "3" => break,
                _ => writeln!(out, "Invalid choice. Please try again.")?,
            }
        }
        writeln!(out, "\n[Sentinel]: Goodbye!")
    }

    async fn prompt_search(
        &self,
        options: SearchOptions,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> io::Result<()> {
        write!(out, "{QUERY_PROMPT}")?;
        out.flush()?;

        match read_line(input)? {
            Some(query) if !query.is_empty() && !query.eq_ignore_ascii_case("r") => {
                self.run_search(&query, options, out).await?;
                Ok(())
            }
            _ => writeln!(out, "[Sentinel]: Returning to menu."),
        }
    }

    /// Resolve the year range, run the pipeline, store the outcome and
    /// optionally export it. Returns the stored search id, or `None` when
    /// storing failed.
    pub async fn run_search(
        &self,
        query: &str,
        options: SearchOptions,
        out: &mut impl Write,
    ) -> io::Result<Option<i64>> {
        let resolved = resolve_range(
            options.min_year,
            options.max_year,
            query,
            self.config.default_years,
        );
        let outcome = pipeline::run(
            self.model,
            self.search,
            resolved,
            &self.config.reset_instruction,
            out,
        )
        .await?;

        let new_search = NewSearch {
            range: outcome.range,
            research_purpose: &outcome.strategy.research_purpose,
            mesh_strategy: &outcome.strategy.mesh_strategy,
        };
        let id = match self.db.save_search(&new_search, &outcome.articles) {
            Ok(id) => {
                writeln!(out, "Data stored successfully.")?;
                id
            }
            Err(e) => {
                error!(error = %e, "failed to store search");
                writeln!(out, "Database Error: {e}")?;
                return Ok(None);
            }
        };

        if options.export {
            self.export(id, out)?;
        }
        Ok(Some(id))
    }

    fn view_history(&self, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<()> {
        let history = match self.db.list_searches() {
            Ok(history) => history,
            Err(e) => {
                error!(error = %e, "failed to load history");
                return writeln!(out, "Database Error: {e}");
            }
        };
        if history.is_empty() {
            return writeln!(out, "No previous searches found.");
        }

        for (n, search) in history.iter().enumerate() {
            writeln!(
                out,
                "[{}] Research Purpose: {}, Date Range: {} ({} results)",
                n + 1,
                single_line(&search.research_purpose),
                search.range(),
                search.result_count,
            )?;
        }
        write!(out, "\n{EXPORT_PROMPT}")?;
        out.flush()?;

        let selection = read_line(input)?.unwrap_or_default();
        if selection.is_empty() || selection.eq_ignore_ascii_case("r") {
            return writeln!(out, "[Sentinel]: Returning to menu.");
        }

        let chosen = selection
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| history.get(idx));
        match chosen {
            Some(search) => self.export(search.id, out),
            None => writeln!(out, "Invalid selection."),
        }
    }

    fn export(&self, id: i64, out: &mut impl Write) -> io::Result<()> {
        match export_search(self.db, id, &self.config.export_dir) {
            Ok(summary) => writeln!(
                out,
                "Exported {} results to {}",
                summary.rows,
                summary.path.display()
            ),
            Err(e) => {
                warn!(error = %e, id, "export failed");
                writeln!(out, "Export Error: {e}")
            }
        }
    }
}

/// Next trimmed line, or `None` at end of input.
fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
