use async_trait::async_trait;

use super::cli_client::AiCliClient;
use super::{ComplianceReviewer, parse_structured};
use crate::catalog;
use crate::checklist::ChecklistEntry;
use crate::error::CollaboratorError;
use crate::facts::FactContext;
use crate::prose::ProseBundle;
use crate::review::ReviewResult;

const ROLE: &str = "reviewer";

const REVIEW_RULES: &str = "Rules:\n\
1. Return a verdict for EVERY checklist item, using the item text exactly as listed.\n\
2. Report each defect as a finding with severity \"critical\" or \"warning\", the affected field key, \
and a description naming the violated provision.\n\
3. To fix a field, return its COMPLETE replacement text under correctedFields. Never return partial edits.\n\
4. Never alter any amount, rate, date, ratio, count or party name. Every fact string that appears in \
a field you rewrite must appear verbatim in your replacement.\n\
5. Only use field keys that exist in the narrative below.\n";

const RESPONSE_SHAPE: &str = r#"```json
{
  "findings": [
    { "severity": "critical", "field": "<field key>", "description": "<violated provision>", "fix": "<what the correction changes>" }
  ],
  "correctedFields": { "<field key>": "<full replacement text, or a list of strings for list fields>" },
  "verdicts": [ { "item": "<checklist item>", "passed": true, "note": "<short reason>" } ]
}
```"#;

/// Compliance review collaborator backed by an AI CLI.
pub struct ReviewAgent<C: AiCliClient> {
    client: C,
}

impl<C: AiCliClient> ReviewAgent<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn render_prompt(bundle: &ProseBundle, facts: &FactContext, entry: &ChecklistEntry) -> String {
        let profile = catalog::profile(bundle.document_type());
        let mut out = format!(
            "You are a compliance reviewer for a {} ({}).\n\n",
            profile.title,
            bundle.document_type()
        );

        out.push_str("## Authoritative facts\n");
        out.push_str(&facts.render_narrative_safe());

        out.push_str("\n## Checklist\n");
        for item in entry.items() {
            let guaranteed = if profile.template_guaranteed.contains(&item.text.as_str()) {
                " (supplied by the document template; mark as passed)"
            } else {
                ""
            };
            out.push_str(&format!("- [{:?}] {}{}\n", item.category, item.text, guaranteed));
        }

        out.push_str("\n## Narrative under review\n```json\n");
        out.push_str(&serde_json::to_string_pretty(&bundle.to_json()).unwrap_or_default());
        out.push_str("\n```\n\n");
        out.push_str(REVIEW_RULES);
        out.push_str("\nRespond with a single JSON object shaped like this:\n");
        out.push_str(RESPONSE_SHAPE);
        out.push('\n');
        out
    }
}

#[async_trait]
impl<C: AiCliClient> ComplianceReviewer for ReviewAgent<C> {
    async fn review(
        &self,
        bundle: &ProseBundle,
        facts: &FactContext,
        entry: &ChecklistEntry,
    ) -> Result<ReviewResult, CollaboratorError> {
        let prompt = Self::render_prompt(bundle, facts, entry);
        let response = self
            .client
            .prompt(&prompt)
            .await
            .map_err(|e| CollaboratorError::call_failed(ROLE, e.to_string()))?;

        let value = parse_structured(ROLE, &response)?;
        if !value.is_object() {
            return Err(CollaboratorError::malformed(ROLE, "response is not a JSON object"));
        }
        serde_json::from_value(value).map_err(|e| CollaboratorError::malformed(ROLE, e.to_string()))
    }
}
