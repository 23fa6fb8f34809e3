pub mod parse;
pub mod types;

pub use types::Article;

use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::PubMedConfig;
use crate::years::YearRange;
use parse::parse_article_set;
use types::ESearchResponse;

const API_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
/// Identifies this client to NCBI, as the E-utilities usage policy asks.
const TOOL_NAME: &str = "sentinel";

/// Errors returned by PubMed E-utilities operations.
#[derive(Debug, thiserror::Error)]
pub enum PubMedError {
    #[error("PubMed rate limit exceeded. Set NCBI_API_KEY for a higher limit.")]
    RateLimited,

    #[error("PubMed API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("PubMed rejected the query: {0}")]
    Query(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Could not parse PubMed response: {0}")]
    Parse(String),
}

/// Bibliographic search restricted to a publication-year window.
/// Implemented by `PubMedClient` for production; mock implementations used in tests.
pub trait ArticleSearch {
    async fn search(&self, strategy: &str, range: YearRange) -> Result<Vec<Article>, PubMedError>;
}

/// HTTP client for the NCBI E-utilities (`esearch` + `efetch`).
#[derive(Clone)]
pub struct PubMedClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    email: Option<String>,
    max_results: u32,
}

impl PubMedClient {
    pub fn new(http: Client, config: &PubMedConfig) -> Self {
        if config.api_key.is_none() {
            debug!("NCBI_API_KEY not set; PubMed allows 3 requests/second");
        }
        Self {
            http,
            base_url: API_BASE.to_string(),
            api_key: config.api_key.clone(),
            email: config.email.clone(),
            max_results: config.max_results,
        }
    }

    #[cfg(test)]
    fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key: None,
            email: None,
            max_results: 20,
        }
    }

    fn endpoint(&self, name: &str, params: &[(&str, &str)]) -> Result<Url, PubMedError> {
        let mut url = Url::parse(&format!("{}/{name}", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("db", "pubmed");
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("tool", TOOL_NAME);
            if let Some(ref email) = self.email {
                query.append_pair("email", email);
            }
            if let Some(ref key) = self.api_key {
                query.append_pair("api_key", key);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, PubMedError> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;
        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(response),
            429 => {
                warn!("PubMed rate limited");
                Err(PubMedError::RateLimited)
            }
            code => {
                let message = extract_error_message(
                    &response
                        .text()
                        .await
                        .unwrap_or_else(|_| format!("HTTP {status}")),
                );
                Err(PubMedError::Api { code, message })
            }
        }
    }

    /// PMIDs matching `term` published within `range`, in PubMed's order.
    pub async fn search_ids(
        &self,
        term: &str,
        range: YearRange,
    ) -> Result<Vec<String>, PubMedError> {
        let min = range.min.to_string();
        let max = range.max.to_string();
        let retmax = self.max_results.to_string();
        let url = self.endpoint(
            "esearch.fcgi",
            &[
                ("term", term),
                ("datetype", "pdat"),
                ("mindate", min.as_str()),
                ("maxdate", max.as_str()),
                ("retmax", retmax.as_str()),
                ("retmode", "json"),
            ],
        )?;

        let body: ESearchResponse = self.get(url).await?.json().await?;
        if let Some(message) = body.error {
            return Err(PubMedError::Api { code: 200, message });
        }
        let result = body
            .esearchresult
            .ok_or_else(|| PubMedError::Parse("esearch response without esearchresult".into()))?;
        if let Some(message) = result.error {
            return Err(PubMedError::Query(message));
        }

        debug!(
            count = result.count.as_deref().unwrap_or("?"),
            returned = result.idlist.len(),
            "esearch complete"
        );
        Ok(result.idlist)
    }

    pub async fn fetch_articles(&self, ids: &[String]) -> Result<Vec<Article>, PubMedError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        let url = self.endpoint(
            "efetch.fcgi",
            &[("id", joined.as_str()), ("rettype", "abstract"), ("retmode", "xml")],
        )?;
        let xml = self.get(url).await?.text().await?;
        parse_article_set(&xml)
    }
}

impl ArticleSearch for PubMedClient {
    async fn search(
        &self,
        strategy: &str,
        range: YearRange,
    ) -> Result<Vec<Article>, PubMedError> {
        let ids = self.search_ids(strategy, range).await?;
        let articles = self.fetch_articles(&ids).await?;
        info!(%range, ids = ids.len(), articles = articles.len(), "pubmed search complete");
        Ok(articles)
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_term_and_identity() {
        let mut client = PubMedClient::with_base_url(Client::new(), "https://example.org/eutils");
        client.api_key = Some("k3y".into());
        client.email = Some("me@example.org".into());

        let url = client
            .endpoint("esearch.fcgi", &[("term", "(knee OR hip) AND pain")])
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/eutils/esearch.fcgi");
        assert!(pairs.contains(&("db".into(), "pubmed".into())));
        assert!(pairs.contains(&("term".into(), "(knee OR hip) AND pain".into())));
        assert!(pairs.contains(&("tool".into(), "sentinel".into())));
        assert!(pairs.contains(&("email".into(), "me@example.org".into())));
        assert!(pairs.contains(&("api_key".into(), "k3y".into())));
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(
            extract_error_message(r#"{"error":"API rate limit exceeded","count":"11"}"#),
            "API rate limit exceeded"
        );
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EFETCH_XML: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation><PMID>111</PMID>
      <Article><Journal><JournalIssue><PubDate><Year>2019</Year></PubDate></JournalIssue></Journal>
        <ArticleTitle>Metformin and outcomes.</ArticleTitle>
        <Abstract><AbstractText>Metformin helped.</AbstractText></Abstract>
        <AuthorList><Author><LastName>Lee</LastName><Initials>K</Initials></Author></AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation><PMID>222</PMID>
      <Article><Journal><JournalIssue><PubDate><Year>2021</Year></PubDate></JournalIssue></Journal>
        <ArticleTitle>Insulin timing.</ArticleTitle>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[tokio::test]
    async fn search_runs_esearch_then_efetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("term", "metformin AND diabetes"))
            .and(query_param("datetype", "pdat"))
            .and(query_param("mindate", "2018"))
            .and(query_param("maxdate", "2022"))
            .and(query_param("retmode", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "header": {"type": "esearch", "version": "0.3"},
                "esearchresult": {"count": "2", "retmax": "2", "idlist": ["111", "222"]}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("id", "111,222"))
            .and(query_param("retmode", "xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EFETCH_XML))
            .expect(1)
            .mount(&server)
            .await;

        let client = PubMedClient::with_base_url(Client::new(), &server.uri());
        let articles = client
            .search("metformin AND diabetes", YearRange::new(2018, 2022))
            .await
            .unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].pmid, "111");
        assert_eq!(articles[0].authors, vec!["Lee K"]);
        assert_eq!(articles[1].title, "Insulin timing.");
        assert_eq!(articles[1].year, Some(2021));
    }

    #[tokio::test]
    async fn empty_idlist_skips_efetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": {"count": "0", "idlist": []}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = PubMedClient::with_base_url(Client::new(), &server.uri());
        let articles = client.search("nothing", YearRange::new(2000, 2001)).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn esearch_error_field_is_query_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": {"ERROR": "Invalid query syntax"}
            })))
            .mount(&server)
            .await;

        let client = PubMedClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("((", YearRange::new(2000, 2001)).await;
        assert!(matches!(result, Err(PubMedError::Query(ref m)) if m == "Invalid query syntax"));
    }

    #[tokio::test]
    async fn status_429_returns_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "API rate limit exceeded"
            })))
            .mount(&server)
            .await;

        let client = PubMedClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("x", YearRange::new(2000, 2001)).await;
        assert!(matches!(result, Err(PubMedError::RateLimited)));
    }

    #[tokio::test]
    async fn status_502_returns_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = PubMedClient::with_base_url(Client::new(), &server.uri());
        match client.search("x", YearRange::new(2000, 2001)).await {
            Err(PubMedError::Api { code: 502, message }) => assert_eq!(message, "Bad Gateway"),
            other => panic!("expected Api(502), got: {other:?}"),
        }
    }
}
