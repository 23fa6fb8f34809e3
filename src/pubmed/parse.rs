//! Event-driven reader for `efetch` `PubmedArticleSet` XML.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use super::PubMedError;
use super::types::Article;

#[derive(Debug)]
enum Field {
    Pmid,
    Title,
    Abstract { label: Option<String> },
    LastName,
    ForeName,
    Initials,
    CollectiveName,
    Doi,
    Year,
    MedlineDate,
}

/// Text being collected for `field` until the element opened at `depth` closes.
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Default)]
struct AuthorParts {
    last: Option<String>,
    fore: Option<String>,
    initials: Option<String>,
    collective: Option<String>,
}

impl AuthorParts {
    fn display(self) -> Option<String> {
        match (self.last, self.initials.or(self.fore), self.collective) {
            (Some(last), Some(first), _) => Some(format!("{last} {first}")),
            (Some(last), None, _) => Some(last),
            (None, _, Some(collective)) => Some(collective),
            _ => None,
        }
    }
}

#[derive(Default)]
struct PartialArticle {
    pmid: Option<String>,
    title: String,
    abstract_sections: Vec<String>,
    authors: Vec<String>,
    author: AuthorParts,
    doi: Option<String>,
    year: Option<i32>,
}

impl PartialArticle {
    fn apply(&mut self, field: Field, text: String) {
        if text.is_empty() {
            return;
        }
        match field {
            Field::Pmid => {
                self.pmid.get_or_insert(text);
            }
            Field::Title => self.title = text,
            Field::Abstract { label: Some(label) } => {
                self.abstract_sections.push(format!("{label}: {text}"))
            }
            Field::Abstract { label: None } => self.abstract_sections.push(text),
            Field::LastName => self.author.last = Some(text),
            Field::ForeName => self.author.fore = Some(text),
            Field::Initials => self.author.initials = Some(text),
            Field::CollectiveName => self.author.collective = Some(text),
            Field::Doi => {
                self.doi.get_or_insert(text);
            }
            Field::Year => {
                if self.year.is_none() {
                    self.year = text.parse().ok();
                }
            }
            Field::MedlineDate => {
                if self.year.is_none() {
                    self.year = text.get(..4).and_then(|y| y.parse().ok());
                }
            }
        }
    }

    fn finish_author(&mut self) {
        if let Some(name) = std::mem::take(&mut self.author).display() {
            self.authors.push(name);
        }
    }

    fn build(self) -> Option<Article> {
        let pmid = self.pmid?;
        Some(Article {
            pmid,
            title: self.title,
            authors: self.authors,
            abstract_text: self.abstract_sections.join("\n\n"),
            doi: self.doi,
            year: self.year,
        })
    }
}

/// Parse every `PubmedArticle` in document order. Records without a PMID are skipped.
pub fn parse_article_set(xml: &str) -> Result<Vec<Article>, PubMedError> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut articles = Vec::new();
    let mut current: Option<PartialArticle> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "PubmedArticle" {
                    current = Some(PartialArticle::default());
                } else if name == "PubmedBookArticle" {
                    debug!(
                        position = reader.buffer_position(),
                        "skipping PubmedBookArticle record"
                    );
                } else if current.is_some()
                    && capture.is_none()
                    && let Some(field) = field_for(&name, &path, &e)
                {
                    capture = Some(Capture {
                        field,
                        depth: path.len() + 1,
                        text: String::new(),
                    });
                }
                path.push(name);
            }
            Ok(Event::Text(t)) => {
                if let Some(cap) = capture.as_mut() {
                    let text = t
                        .unescape()
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    cap.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(cap) = capture.as_mut() {
                    cap.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(_)) => {
                let depth = path.len();
                if let Some(cap) = capture.take_if(|c| c.depth == depth)
                    && let Some(article) = current.as_mut()
                {
                    article.apply(cap.field, normalize_whitespace(&cap.text));
                }
                match path.pop().as_deref() {
                    Some("Author") => {
                        if let Some(article) = current.as_mut() {
                            article.finish_author();
                        }
                    }
                    Some("PubmedArticle") => match current.take().and_then(PartialArticle::build) {
                        Some(article) => articles.push(article),
                        None => debug!("skipping PubmedArticle without PMID"),
                    },
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PubMedError::Parse(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    Ok(articles)
}

fn field_for(name: &str, path: &[String], e: &BytesStart<'_>) -> Option<Field> {
    let parent = path.last().map(String::as_str);
    let grandparent = path.iter().rev().nth(1).map(String::as_str);
    match (name, parent) {
        ("PMID", Some("MedlineCitation")) => Some(Field::Pmid),
        ("ArticleTitle", Some("Article")) => Some(Field::Title),
        ("AbstractText", Some("Abstract")) => Some(Field::Abstract {
            label: attribute(e, b"Label"),
        }),
        ("LastName", Some("Author")) => Some(Field::LastName),
        ("ForeName", Some("Author")) => Some(Field::ForeName),
        ("Initials", Some("Author")) => Some(Field::Initials),
        ("CollectiveName", Some("Author")) => Some(Field::CollectiveName),
        ("ELocationID", Some("Article")) if is_doi(attribute(e, b"EIdType")) => Some(Field::Doi),
        ("ArticleId", Some("ArticleIdList"))
            if grandparent == Some("PubmedData") && is_doi(attribute(e, b"IdType")) =>
        {
            Some(Field::Doi)
        }
        ("Year", Some("PubDate")) => Some(Field::Year),
        ("MedlineDate", Some("PubDate")) => Some(Field::MedlineDate),
        _ => None,
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn is_doi(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("doi"))
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
