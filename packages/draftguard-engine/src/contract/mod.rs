pub mod excerpts;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::catalog::{self, FieldKind, FieldSpec};
use crate::checklist::{ChecklistEntry, ChecklistRegistry};
use crate::domain::{DocumentType, ProgramCode};
use crate::facts::FactContext;

/// One discrete defect a retry must fix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrectionDirective {
    pub field: String,
    pub reason: String,
}

impl CorrectionDirective {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Appends directives not already present, preserving first-seen order.
pub fn accumulate(feedback: &mut Vec<CorrectionDirective>, new: impl IntoIterator<Item = CorrectionDirective>) {
    for directive in new {
        if !feedback.contains(&directive) {
            feedback.push(directive);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Excerpt {
    pub reference: String,
    pub text: &'static str,
}

/// Everything the drafting collaborator is allowed to see for one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationContract {
    pub document_type: DocumentType,
    pub program: Option<ProgramCode>,
    pub title: &'static str,
    pub facts_block: String,
    pub mandatory_tokens: Vec<String>,
    pub parties: Vec<String>,
    pub entry: ChecklistEntry,
    pub excerpts: Vec<Excerpt>,
    pub schema: Vec<FieldSpec>,
    pub feedback: Vec<CorrectionDirective>,
    pub max_chars: usize,
}

const FACT_LOCK_INSTRUCTION: &str = "The facts below are authoritative and fixed. Every amount, rate, date, \
ratio and count must be reproduced character for character wherever it is used. Never invent, round, \
abbreviate, convert or omit a fact. A fact marked NOT PROVIDED must not be filled in or guessed.";

const OUTPUT_RULES: &str = "1. Return exactly one JSON object in a single ```json code block.\n\
2. Use exactly the keys listed in the output schema: no extra keys, none omitted.\n\
3. Text fields are JSON strings; list fields are JSON arrays of strings.\n\
4. Do NOT nest triple-backticks inside any JSON string value.\n";

impl GenerationContract {
    /// Renders the contract as prompt text, never longer than `max_chars`
    /// unless the non-droppable sections alone exceed it. Excerpts are
    /// dropped from the end first.
    pub fn render(&self) -> String {
        let head = self.render_head();
        let tail = self.render_tail();

        let mut excerpts = String::new();
        let fixed_len = head.len() + tail.len();
        for excerpt in &self.excerpts {
            let section = format!("### {}\n{}\n\n", excerpt.reference, excerpt.text);
            if fixed_len + excerpts.len() + section.len() + EXCERPT_HEADER.len() > self.max_chars {
                break;
            }
            excerpts.push_str(&section);
        }

        let mut out = head;
        if !excerpts.is_empty() {
            out.push_str(EXCERPT_HEADER);
            out.push_str(&excerpts);
        }
        out.push_str(&tail);
        out
    }

    fn render_head(&self) -> String {
        let mut out = format!(
            "# Drafting Contract: {} ({})\n",
            self.title, self.document_type
        );
        if let Some(program) = &self.program {
            out.push_str(&format!("Program: {}\n", program));
        }

        out.push_str("\n## Fixed Facts (NON-NEGOTIABLE)\n");
        out.push_str(FACT_LOCK_INSTRUCTION);
        out.push_str("\n\n");
        out.push_str(&self.facts_block);

        if !self.mandatory_tokens.is_empty() {
            out.push_str("\nThese exact strings MUST appear verbatim in the narrative:\n");
            for token in &self.mandatory_tokens {
                out.push_str(&format!("- \"{}\"\n", token));
            }
        }

        if !self.parties.is_empty() {
            out.push_str("\n## Parties to name\n");
            for party in &self.parties {
                out.push_str(&format!("- {}\n", party));
            }
        }

        out.push_str("\n## Provisions to cover\n");
        for provision in &self.entry.required_provisions {
            out.push_str(&format!("- [REQUIRED] {}\n", provision));
        }
        for provision in &self.entry.standard_provisions {
            out.push_str(&format!("- [STANDARD] {}\n", provision));
        }

        if !self.entry.regulatory_references.is_empty() {
            out.push_str("\n## Regulatory references to cite by name\n");
            for reference in &self.entry.regulatory_references {
                out.push_str(&format!("- {}\n", reference));
            }
        }
        out.push('\n');
        out
    }

    fn render_tail(&self) -> String {
        let mut out = String::from("## Output schema\n");
        for spec in &self.schema {
            out.push_str(&format!(
                "- `{}` ({}): {} Constraints: {}\n",
                spec.key,
                match spec.kind {
                    FieldKind::Text => "text",
                    FieldKind::List => "list of strings",
                },
                spec.purpose,
                spec.constraints
            ));
        }

        if !self.feedback.is_empty() {
            out.push_str("\n## Mandatory corrections from previous attempts\n");
            out.push_str("Each item below is a defect found in an earlier draft. You MUST fix every one.\n");
            for (idx, directive) in self.feedback.iter().enumerate() {
                out.push_str(&format!("{}. [{}] {}\n", idx + 1, directive.field, directive.reason));
            }
        }

        out.push_str("\n## Output rules\n");
        out.push_str(OUTPUT_RULES);
        out
    }

    /// JSON Schema the drafter's response object is validated against.
    /// Presence and emptiness are left to the shape check.
    pub fn response_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .schema
            .iter()
            .map(|spec| {
                let kind = match spec.kind {
                    FieldKind::Text => json!({ "type": ["string", "null"] }),
                    FieldKind::List => {
                        json!({ "type": ["array", "null"], "items": { "type": "string" } })
                    }
                };
                (spec.key.to_string(), kind)
            })
            .collect();
        json!({
            "type": "object",
            "properties": properties,
        })
    }
}

const EXCERPT_HEADER: &str = "## Statutory and regulatory excerpts\n";

/// Turns a fact context, the registry entry and prior feedback into a
/// [`GenerationContract`].
pub struct ContractBuilder<'a> {
    registry: &'a ChecklistRegistry,
    max_chars: usize,
}

impl<'a> ContractBuilder<'a> {
    pub fn new(registry: &'a ChecklistRegistry, max_chars: usize) -> Self {
        Self {
            registry,
            max_chars,
        }
    }

    pub fn build(
        &self,
        facts: &FactContext,
        program: Option<&ProgramCode>,
        feedback: &[CorrectionDirective],
    ) -> GenerationContract {
        let document_type = facts.document_type();
        let profile = catalog::profile(document_type);
        let entry = self.registry.entry(document_type, program);

        let excerpts = entry
            .regulatory_references
            .iter()
            .filter_map(|reference| {
                excerpts::excerpt(reference).map(|text| Excerpt {
                    reference: reference.clone(),
                    text,
                })
            })
            .collect();

        GenerationContract {
            document_type,
            program: program.cloned(),
            title: profile.title,
            facts_block: facts.render_narrative_safe(),
            mandatory_tokens: profile
                .mandatory_facts
                .iter()
                .filter_map(|k| facts.resolved(k).map(str::to_string))
                .collect(),
            parties: profile
                .primary_parties
                .iter()
                .filter_map(|k| facts.resolved(k).map(str::to_string))
                .collect(),
            entry,
            excerpts,
            schema: profile.fields.to_vec(),
            feedback: feedback.to_vec(),
            max_chars: self.max_chars,
        }
    }
}
