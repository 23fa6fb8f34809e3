use tracing::debug;

use super::client::{LlmError, TextModel};
use super::prompts;
use crate::markdown::extract_fenced;

/// Model-derived research purpose and the boolean query built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Strategy {
    pub research_purpose: String,
    pub mesh_strategy: String,
}

/// Ask the model for a research purpose, then for a search strategy that
/// builds on it. Fence extraction never fails; model errors propagate.
pub async fn generate_strategy(
    model: &impl TextModel,
    query: &str,
) -> Result<Strategy, LlmError> {
    let raw = model.generate(&prompts::research_purpose(query)).await?;
    let research_purpose = extract_fenced(&raw);
    debug!(%research_purpose, "research purpose generated");

    let raw = model
        .generate(&prompts::mesh_strategy(query, &research_purpose))
        .await?;
    let mesh_strategy = extract_fenced(&raw);
    debug!(%mesh_strategy, "search strategy generated");

    Ok(Strategy {
        research_purpose,
        mesh_strategy,
    })
}
