//! Publication-year range detection for free-text queries.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Inclusive publication-year bounds, always ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExtractedRange {
    pub range: YearRange,
    pub cleaned_query: String,
}

/// Where the bounds used for a search came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSource {
    Flags,
    Extracted,
    Default,
}

#[derive(Debug)]
pub struct ResolvedQuery {
    pub range: YearRange,
    pub query: String,
    pub source: RangeSource,
}

const YEAR: &str = r"((?:18|19|20|21)\d{2})";
const LEAD: &str = r"(?:\b(?:published|publications?)\s+)?";
const AND_OR_DASH: &str = r"(?:\s+and\s+|\s*[-–]\s*)";
const TO_OR_DASH: &str = r"(?:\s+(?:to|until|through|till)\s+|\s*[-–]\s*)";
const BARE_SEP: &str = r"\s*(?:-|–|\bto\b|\bthrough\b)\s*";

static RANGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i){LEAD}\bbetween\s+(?:the\s+years?\s+)?{YEAR}{AND_OR_DASH}{YEAR}\b"),
        format!(r"(?i){LEAD}\bfrom\s+(?:the\s+years?\s+)?{YEAR}{TO_OR_DASH}{YEAR}\b"),
        format!(r"(?i){LEAD}(?:\b(?:in|during)\s+)?\b{YEAR}{BARE_SEP}{YEAR}\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid year range pattern"))
    .collect()
});

/// Detect an explicit year range such as "between 2015 and 2020".
///
/// Returns the range and the query with the range phrase removed, or `None`
/// when the query carries no recognizable range. A query that is nothing but
/// the range phrase yields an empty `cleaned_query`.
pub fn extract_year_range(query: &str) -> Option<ExtractedRange> {
    for re in RANGE_PATTERNS.iter() {
        let Some(caps) = re.captures(query) else {
            continue;
        };
        let (Some(whole), Some(a), Some(b)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let (Ok(a), Ok(b)) = (a.as_str().parse::<i32>(), b.as_str().parse::<i32>()) else {
            continue;
        };

        let remainder = format!("{} {}", &query[..whole.start()], &query[whole.end()..]);
        return Some(ExtractedRange {
            range: YearRange::new(a, b),
            cleaned_query: clean_query(&remainder),
        });
    }
    None
}

fn clean_query(s: &str) -> String {
    let collapsed = s
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ,", ",")
        .replace(" .", ".");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '-'))
        .to_string()
}

/// Decide the bounds for a search.
///
/// Explicit flags win; a missing flag takes the matching default bound. With
/// no flags the range is extracted from the query, falling back to
/// `defaults`. A range-only query is sent downstream as typed.
pub fn resolve_range(
    min_flag: Option<i32>,
    max_flag: Option<i32>,
    query: &str,
    defaults: YearRange,
) -> ResolvedQuery {
    if min_flag.is_some() || max_flag.is_some() {
        return ResolvedQuery {
            range: YearRange::new(
                min_flag.unwrap_or(defaults.min),
                max_flag.unwrap_or(defaults.max),
            ),
            query: query.trim().to_string(),
            source: RangeSource::Flags,
        };
    }

    match extract_year_range(query) {
        Some(extracted) => ResolvedQuery {
            range: extracted.range,
            query: if extracted.cleaned_query.is_empty() {
                query.trim().to_string()
            } else {
                extracted.cleaned_query
            },
            source: RangeSource::Extracted,
        },
        None => ResolvedQuery {
            range: defaults,
            query: query.trim().to_string(),
            source: RangeSource::Default,
        },
    }
}
