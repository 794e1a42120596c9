use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checklist::ChecklistItem;
use crate::domain::Severity;
use crate::prose::ProseValue;

pub const TEMPLATE_GUARANTEED_NOTE: &str = "Guaranteed by document template";
pub const NO_VERDICT_NOTE: &str = "No verdict returned by reviewer";

/// A reviewer observation about one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFinding {
    pub severity: Severity,
    /// Bundle key the finding applies to, without the `prose:` prefix.
    pub field: String,
    /// Names the violated provision.
    pub description: String,
    /// What the corrected text changes, when a correction was offered.
    #[serde(default, alias = "fix", skip_serializing_if = "Option::is_none")]
    pub fix_applied: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistVerdict {
    pub item: String,
    pub passed: bool,
    #[serde(default)]
    pub note: String,
}

impl ChecklistVerdict {
    pub fn new(item: impl Into<String>, passed: bool, note: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            passed,
            note: note.into(),
        }
    }
}

/// Output of one review pass. Corrections replace whole fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    #[serde(default)]
    pub findings: Vec<ReviewFinding>,
    #[serde(default, alias = "correctedFields")]
    pub corrected_fields: BTreeMap<String, ProseValue>,
    #[serde(default, alias = "checklistVerdicts")]
    pub verdicts: Vec<ChecklistVerdict>,
}

impl ReviewResult {
    /// Strips `prose:` prefixes a reviewer may echo back from verifier output.
    pub fn normalize_fields(mut self) -> Self {
        for finding in &mut self.findings {
            if let Some(stripped) = finding.field.strip_prefix("prose:") {
                finding.field = stripped.to_string();
            }
        }
        self.corrected_fields = std::mem::take(&mut self.corrected_fields)
            .into_iter()
            .map(|(k, v)| match k.strip_prefix("prose:") {
                Some(stripped) => (stripped.to_string(), v),
                None => (k, v),
            })
            .collect();
        self
    }

    pub fn critical_findings(&self) -> impl Iterator<Item = &ReviewFinding> {
        self.findings.iter().filter(|f| f.severity.is_critical())
    }
}

/// How the review stage ended for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    NotRun,
    Completed,
    /// The review collaborator failed; no verdicts were fabricated.
    SystemError,
}

/// Exactly one verdict per checklist item, in registry order.
///
/// Template-guaranteed items pass regardless of what the reviewer said.
/// Items the reviewer skipped fail with [`NO_VERDICT_NOTE`]. Verdicts for
/// items outside the checklist are dropped. Applying this twice is the same
/// as applying it once.
pub fn normalize_verdicts(
    items: &[ChecklistItem],
    template_guaranteed: &[&str],
    raw: &[ChecklistVerdict],
) -> Vec<ChecklistVerdict> {
    items
        .iter()
        .map(|item| {
            if template_guaranteed.contains(&item.text.as_str()) {
                return ChecklistVerdict::new(&item.text, true, TEMPLATE_GUARANTEED_NOTE);
            }
            raw.iter()
                .find(|v| v.item.trim().eq_ignore_ascii_case(item.text.trim()))
                .map(|v| ChecklistVerdict::new(&item.text, v.passed, v.note.clone()))
                .unwrap_or_else(|| ChecklistVerdict::new(&item.text, false, NO_VERDICT_NOTE))
        })
        .collect()
}
