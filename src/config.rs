use std::env;
use std::path::PathBuf;

use chrono::Datelike;

use crate::years::YearRange;

const DEFAULT_MODEL: &str = "phi3.5";
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_DB_PATH: &str = "search.db";
const DEFAULT_MAX_RESULTS: u32 = 100;
/// Width of the fallback publication window ending at the current year.
const DEFAULT_SPAN_YEARS: i32 = 10;

pub const DEFAULT_RESET_INSTRUCTION: &str = "/clear session. Forget everything. You will only follow the instructions and nothing else as concisely and correctly as possible.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub host: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct PubMedConfig {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub max_results: u32,
}

/// Runtime settings, read from the environment (and `.env` via `dotenvy`).
///
/// - `MODEL_ID`, `OLLAMA_HOST`: text-generation model
/// - `NCBI_API_KEY`, `NCBI_EMAIL`, `PUBMED_MAX_RESULTS`: PubMed E-utilities
/// - `SENTINEL_DB`, `SENTINEL_EXPORT_DIR`: local files
/// - `SENTINEL_MIN_YEAR`, `SENTINEL_MAX_YEAR`: bounds used when a query has none
/// - `SENTINEL_RESET_INSTRUCTION`: text prepended to the query before retries
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub pubmed: PubMedConfig,
    pub database_path: PathBuf,
    pub export_dir: PathBuf,
    pub default_years: YearRange,
    pub reset_instruction: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let current_year = chrono::Utc::now().year();
        Self::from_vars(|name| env::var(name).ok(), current_year)
    }

    /// Build from an arbitrary variable lookup; blank values count as unset.
    pub fn from_vars(
        lookup: impl Fn(&str) -> Option<String>,
        current_year: i32,
    ) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let min_year = parse_var(get("SENTINEL_MIN_YEAR"), "SENTINEL_MIN_YEAR", "a year")?
            .unwrap_or(current_year - DEFAULT_SPAN_YEARS);
        let max_year = parse_var(get("SENTINEL_MAX_YEAR"), "SENTINEL_MAX_YEAR", "a year")?
            .unwrap_or(current_year);
        let max_results = parse_var::<u32>(
            get("PUBMED_MAX_RESULTS"),
            "PUBMED_MAX_RESULTS",
            "a positive integer",
        )?
        .unwrap_or(DEFAULT_MAX_RESULTS);
        if max_results == 0 {
            return Err(ConfigError::Invalid {
                var: "PUBMED_MAX_RESULTS",
                value: "0".into(),
                expected: "a positive integer",
            });
        }

        Ok(Self {
            model: ModelConfig {
                host: get("OLLAMA_HOST")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: get("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            pubmed: PubMedConfig {
                api_key: get("NCBI_API_KEY"),
                email: get("NCBI_EMAIL"),
                max_results,
            },
            database_path: get("SENTINEL_DB")
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
                .into(),
            export_dir: get("SENTINEL_EXPORT_DIR")
                .unwrap_or_else(|| ".".to_string())
                .into(),
            default_years: YearRange::new(min_year, max_year),
            reset_instruction: get("SENTINEL_RESET_INSTRUCTION")
                .unwrap_or_else(|| DEFAULT_RESET_INSTRUCTION.to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    value: Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.parse::<T>().map_err(|_| ConfigError::Invalid {
                var,
                value: v,
                expected,
            })
        })
        .transpose()
}
