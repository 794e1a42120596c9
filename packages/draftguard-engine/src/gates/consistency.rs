use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checklist::CrossDocumentRule;
use crate::domain::{DocumentType, Severity};
use crate::facts::FactContext;
use crate::prose::ProseBundle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossDocumentIssue {
    pub fact: String,
    pub severity: Severity,
    pub documents: Vec<DocumentType>,
    pub message: String,
}

/// One sibling document as seen by the package-level check.
pub struct Sibling<'a> {
    pub document_type: DocumentType,
    pub facts: &'a FactContext,
    /// Present only when the document was accepted.
    pub bundle: Option<&'a ProseBundle>,
}

/// Package-level checks for facts that must agree across sibling documents.
#[derive(Debug, Default)]
pub struct ConsistencyChecker;

impl ConsistencyChecker {
    /// Each rule's fact must be byte-identical in every sibling context that
    /// carries it, and must appear verbatim in every accepted sibling bundle.
    pub fn check(rules: &[CrossDocumentRule], siblings: &[Sibling<'_>]) -> Vec<CrossDocumentIssue> {
        let mut issues = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for rule in rules {
            if seen.contains(&rule.fact.as_str()) {
                continue;
            }
            seen.push(&rule.fact);

            let mut values: BTreeMap<&str, Vec<DocumentType>> = BTreeMap::new();
            for sibling in siblings {
                if let Some(value) = sibling.facts.resolved(&rule.fact) {
                    values.entry(value).or_default().push(sibling.document_type);
                }
            }

            if values.len() > 1 {
                let detail = values
                    .iter()
                    .map(|(value, docs)| {
                        let names: Vec<&str> = docs.iter().map(|d| d.as_str()).collect();
                        format!("\"{}\" in {}", value, names.join(", "))
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                issues.push(CrossDocumentIssue {
                    fact: rule.fact.clone(),
                    severity: Severity::Critical,
                    documents: values.values().flatten().copied().collect(),
                    message: format!("{} differs across documents: {}", rule.description, detail),
                });
                continue;
            }

            let Some(value) = values.keys().next().copied() else {
                continue;
            };
            let missing: Vec<DocumentType> = siblings
                .iter()
                .filter(|s| s.facts.resolved(&rule.fact).is_some())
                .filter(|s| s.bundle.is_some_and(|b| !b.concatenated_text().contains(value)))
                .map(|s| s.document_type)
                .collect();
            if !missing.is_empty() {
                issues.push(CrossDocumentIssue {
                    fact: rule.fact.clone(),
                    severity: Severity::Warning,
                    message: format!(
                        "\"{}\" ({}) is not stated in: {}",
                        value,
                        rule.description,
                        missing.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ")
                    ),
                    documents: missing,
                });
            }
        }
        issues
    }
}
