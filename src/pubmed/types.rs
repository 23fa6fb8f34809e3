use serde::Deserialize;

/// One PubMed record as returned by the search executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    /// "LastName Initials" per author, in listed order.
    pub authors: Vec<String>,
    pub abstract_text: String,
    pub doi: Option<String>,
    pub year: Option<i32>,
}

impl Article {
    pub fn link(&self) -> String {
        format!("https://pubmed.ncbi.nlm.nih.gov/{}/", self.pmid)
    }
}

/// Response from `esearch.fcgi?retmode=json`.
#[derive(Deserialize, Debug)]
pub struct ESearchResponse {
    pub esearchresult: Option<ESearchResult>,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ESearchResult {
    #[serde(default)]
    pub idlist: Vec<String>,
    pub count: Option<String>,
    #[serde(rename = "ERROR")]
    pub error: Option<String>,
}
