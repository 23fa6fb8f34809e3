mod cli;
mod config;
mod export;
mod llm;
mod markdown;
mod menu;
mod pipeline;
mod pubmed;
mod store;
mod years;

#[cfg(test)]
mod testing;

pub const USER_AGENT: &str = concat!("sentinel/", env!("CARGO_PKG_VERSION"));

use std::time::Duration;

use clap::Parser;
use cli::Cli;
use config::Config;
use llm::OllamaClient;
use menu::{Menu, SearchOptions};
use pubmed::PubMedClient;
use store::Database;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sentinel=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config =
        Config::from_env().inspect_err(|e| tracing::error!("invalid configuration: {e}"))?;

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()?;
    let model = OllamaClient::new(http.clone(), &config.model);
    let search = PubMedClient::new(http, &config.pubmed);
    let db = Database::open(&config.database_path)
        .inspect_err(|e| tracing::error!("failed to open database: {e}"))?;

    info!(model = model.model(), db = %db.path().display(), "starting sentinel");

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nProcess interrupted by user.");
            std::process::exit(130);
        }
    });

    let menu = Menu::new(&config, &db, &model, &search);
    let mut stdout = std::io::stdout();

    let options = SearchOptions {
        min_year: cli.min_year,
        max_year: cli.max_year,
        export: cli.export,
    };

    match cli.query() {
        Some(query) => {
            menu.run_search(query, options, &mut stdout).await?;
        }
        None => {
            let mut stdin = std::io::stdin().lock();
            menu.run(options, &mut stdin, &mut stdout).await?;
        }
    }

    info!("sentinel stopped");
    Ok(())
}
