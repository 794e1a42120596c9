pub mod cli_client;
pub mod drafter;
pub mod reviewer;

use async_trait::async_trait;
use serde_json::Value;

use crate::checklist::ChecklistEntry;
use crate::contract::GenerationContract;
use crate::error::CollaboratorError;
use crate::facts::FactContext;
use crate::prose::ProseBundle;
use crate::review::ReviewResult;

pub use drafter::DraftingAgent;
pub use reviewer::ReviewAgent;

/// External collaborator that turns a contract into narrative.
#[async_trait]
pub trait Drafter: Send + Sync {
    async fn draft(&self, contract: &GenerationContract) -> Result<ProseBundle, CollaboratorError>;
}

/// External collaborator giving a second opinion on a drafted bundle.
#[async_trait]
pub trait ComplianceReviewer: Send + Sync {
    async fn review(
        &self,
        bundle: &ProseBundle,
        facts: &FactContext,
        entry: &ChecklistEntry,
    ) -> Result<ReviewResult, CollaboratorError>;
}

/// Pulls the body out of the first fenced code block, or returns the whole
/// response trimmed when there is none.
pub fn clean_response(input: &str) -> String {
    if let Some(start) = input.find("```") {
        let after = &input[start + 3..];
        // Skip language identifier (e.g. "json", "yaml")
        let start_content = after.find('\n').map(|n| n + 1).unwrap_or(0);
        if let Some(end) = after[start_content..].find("```") {
            return after[start_content..start_content + end].trim().to_string();
        }
    }
    input.trim().to_string()
}

/// Parses a cleaned response as JSON first, then YAML.
pub fn parse_structured(role: &str, response: &str) -> Result<Value, CollaboratorError> {
    let cleaned = clean_response(response);

    if let Ok(val) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(val);
    }
    if let Ok(val) = serde_yaml::from_str::<Value>(&cleaned) {
        return Ok(val);
    }

    Err(CollaboratorError::malformed(
        role,
        format!(
            "failed to parse response as JSON or YAML: {}",
            cleaned.chars().take(200).collect::<String>()
        ),
    ))
}
