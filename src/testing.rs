//! Queue-backed fakes for the model and search seams.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::{LlmError, TextModel};
use crate::pubmed::{Article, ArticleSearch, PubMedError};
use crate::years::YearRange;

pub struct MockModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn with_replies(replies: Vec<&str>) -> Self {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(results: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(results.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self::with_results(vec![Err(error)])
    }

    pub fn captured_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextModel for MockModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

pub struct MockSearch {
    responses: Mutex<VecDeque<Result<Vec<Article>, PubMedError>>>,
    calls: Mutex<Vec<(String, YearRange)>>,
}

impl MockSearch {
    pub fn with_responses(responses: Vec<Result<Vec<Article>, PubMedError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_empty() -> Self {
        Self::with_responses(Vec::new())
    }

    pub fn captured_calls(&self) -> Vec<(String, YearRange)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ArticleSearch for MockSearch {
    async fn search(&self, strategy: &str, range: YearRange) -> Result<Vec<Article>, PubMedError> {
        self.calls
            .lock()
            .unwrap()
            .push((strategy.to_string(), range));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }
}

pub fn article(pmid: &str, title: &str) -> Article {
    Article {
        pmid: pmid.to_string(),
        title: title.to_string(),
        authors: vec!["Doe J".to_string(), "Roe R".to_string()],
        abstract_text: format!("Abstract of {title}"),
        doi: Some(format!("10.1000/{pmid}")),
        year: Some(2020),
    }
}

/// Two replies per attempt: a fenced purpose, then a fenced strategy.
pub fn strategy_replies(attempts: usize) -> Vec<&'static str> {
    (0..attempts)
        .flat_map(|_| ["```\nTo study it.\n```", "```\nterm AND other\n```"])
        .collect()
}
