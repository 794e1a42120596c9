use async_trait::async_trait;
use serde_json::Value;

use super::cli_client::AiCliClient;
use super::{Drafter, parse_structured};
use crate::contract::GenerationContract;
use crate::error::CollaboratorError;
use crate::prose::ProseBundle;

const ROLE: &str = "drafter";

const SYSTEM_PROMPT: &str = "You are a legal and regulatory drafting assistant. You write narrative \
sections for a document whose figures, dates and parties are supplied to you and are never yours \
to change. Follow the contract below exactly.";

/// Drafting collaborator backed by an AI CLI.
pub struct DraftingAgent<C: AiCliClient> {
    client: C,
    system_prompt: String,
}

impl<C: AiCliClient> DraftingAgent<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    fn validate(schema: &Value, instance: &Value) -> Result<(), CollaboratorError> {
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            CollaboratorError::malformed(ROLE, format!("response schema does not compile: {}", e))
        })?;
        let violations: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CollaboratorError::SchemaViolation {
                role: ROLE.to_string(),
                violations: violations.join("; "),
            })
        }
    }
}

#[async_trait]
impl<C: AiCliClient> Drafter for DraftingAgent<C> {
    async fn draft(&self, contract: &GenerationContract) -> Result<ProseBundle, CollaboratorError> {
        let prompt = if self.system_prompt.is_empty() {
            contract.render()
        } else {
            format!("{}\n\n{}", self.system_prompt, contract.render())
        };

        let response = self
            .client
            .prompt(&prompt)
            .await
            .map_err(|e| CollaboratorError::call_failed(ROLE, e.to_string()))?;

        let value = parse_structured(ROLE, &response)?;
        Self::validate(&contract.response_schema(), &value)?;
        ProseBundle::from_json(contract.document_type, &value)
    }
}
