//! Research-purpose and MeSH-strategy generation through a local text model.

pub(crate) mod client;
pub(crate) mod prompts;
pub(crate) mod strategy;
pub(crate) mod types;

pub use client::{LlmError, OllamaClient, TextModel};
pub use strategy::{Strategy, generate_strategy};
