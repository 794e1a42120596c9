use serde::{Deserialize, Serialize};

use crate::catalog::DocumentProfile;
use crate::checklist::ChecklistEntry;
use crate::domain::Severity;
use crate::facts::FactContext;
use crate::prose::ProseBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Shape,
    FactLock,
    MissingFact,
    Entity,
    Numeric,
    Regulatory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationIssue {
    pub field: String,
    pub severity: Severity,
    pub message: String,
    pub check: CheckKind,
}

impl VerificationIssue {
    fn critical(check: CheckKind, field: String, message: String) -> Self {
        Self {
            field,
            severity: Severity::Critical,
            message,
            check,
        }
    }

    fn warning(check: CheckKind, field: String, message: String) -> Self {
        Self {
            field,
            severity: Severity::Warning,
            message,
            check,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub issues: Vec<VerificationIssue>,
    pub passed: bool,
    /// Regulatory references found, out of `checks_run` declared.
    pub checks_passed: usize,
    pub checks_run: usize,
}

impl VerificationReport {
    pub fn critical_issues(&self) -> impl Iterator<Item = &VerificationIssue> {
        self.issues.iter().filter(|i| i.severity.is_critical())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &VerificationIssue> {
        self.issues.iter().filter(|i| !i.severity.is_critical())
    }
}

/// Local, synchronous checks over a drafted bundle. Makes no external calls.
#[derive(Debug, Default)]
pub struct DeterministicVerifier;

impl DeterministicVerifier {
    pub fn verify(
        profile: &DocumentProfile,
        entry: &ChecklistEntry,
        facts: &FactContext,
        bundle: &ProseBundle,
    ) -> VerificationReport {
        let haystack = bundle.concatenated_text();
        let haystack_lower = haystack.to_lowercase();

        let mut issues = Self::check_shape(profile, bundle);
        issues.extend(Self::check_fact_lock(profile, facts, &haystack));
        issues.extend(Self::check_missing_facts(facts));
        issues.extend(Self::check_entities(profile, facts, &haystack_lower));
        issues.extend(Self::check_numeric(profile, facts, &haystack_lower));

        let (regulatory, checks_passed, checks_run) =
            Self::check_regulatory(entry, &haystack_lower);
        issues.extend(regulatory);

        let passed = !issues.iter().any(|i| i.severity.is_critical());
        VerificationReport {
            issues,
            passed,
            checks_passed,
            checks_run,
        }
    }

    /// Every schema key present and non-empty.
    pub fn check_shape(profile: &DocumentProfile, bundle: &ProseBundle) -> Vec<VerificationIssue> {
        profile
            .fields
            .iter()
            .filter(|spec| bundle.get(spec.key).is_none_or(|v| v.is_empty()))
            .map(|spec| {
                VerificationIssue::critical(
                    CheckKind::Shape,
                    format!("prose:{}", spec.key),
                    format!("Required field '{}' is missing or empty", spec.key),
                )
            })
            .collect()
    }

    /// Mandatory facts appear verbatim, byte for byte.
    pub fn check_fact_lock(
        profile: &DocumentProfile,
        facts: &FactContext,
        haystack: &str,
    ) -> Vec<VerificationIssue> {
        profile
            .mandatory_facts
            .iter()
            .filter_map(|key| facts.resolved(key).map(|value| (*key, value)))
            .filter(|(_, value)| !haystack.contains(value))
            .map(|(key, value)| {
                VerificationIssue::critical(
                    CheckKind::FactLock,
                    format!("fact:{}", key),
                    format!("Mandatory fact '{}' must appear verbatim as \"{}\"", key, value),
                )
            })
            .collect()
    }

    /// Deal state gaps surfaced by the fact builder as placeholders.
    pub fn check_missing_facts(facts: &FactContext) -> Vec<VerificationIssue> {
        facts
            .placeholders()
            .into_iter()
            .map(|key| {
                VerificationIssue::warning(
                    CheckKind::MissingFact,
                    format!("fact:{}", key),
                    format!("Deal state does not supply '{}'; a placeholder was used", key),
                )
            })
            .collect()
    }

    /// Case-insensitive search for each primary party. Synonyms can defeat
    /// this, so a miss is only a warning.
    pub fn check_entities(
        profile: &DocumentProfile,
        facts: &FactContext,
        haystack_lower: &str,
    ) -> Vec<VerificationIssue> {
        profile
            .primary_parties
            .iter()
            .filter_map(|key| facts.resolved(key).map(|name| (*key, name)))
            .filter(|(_, name)| !haystack_lower.contains(&name.to_lowercase()))
            .map(|(key, name)| {
                VerificationIssue::warning(
                    CheckKind::Entity,
                    format!("entity:{}", key),
                    format!("Party '{}' is not named in the narrative", name),
                )
            })
            .collect()
    }

    pub fn check_numeric(
        profile: &DocumentProfile,
        facts: &FactContext,
        haystack_lower: &str,
    ) -> Vec<VerificationIssue> {
        let Some(key) = profile.tracked_numeric else {
            return Vec::new();
        };
        let representations = facts.representations(key);
        if representations.is_empty()
            || representations
                .iter()
                .any(|r| haystack_lower.contains(&r.to_lowercase()))
        {
            return Vec::new();
        }
        vec![VerificationIssue::warning(
            CheckKind::Numeric,
            format!("numeric:{}", key),
            format!(
                "No accepted representation of '{}' found (expected one of: {})",
                key,
                representations.join(" | ")
            ),
        )]
    }

    /// Returns the issues plus `(checks_passed, checks_run)`.
    pub fn check_regulatory(
        entry: &ChecklistEntry,
        haystack_lower: &str,
    ) -> (Vec<VerificationIssue>, usize, usize) {
        let mut issues = Vec::new();
        let mut passed = 0;
        for reference in &entry.regulatory_references {
            if haystack_lower.contains(&reference.to_lowercase()) {
                passed += 1;
            } else {
                issues.push(VerificationIssue::warning(
                    CheckKind::Regulatory,
                    format!("regulatory:{}", reference),
                    format!("Regulatory reference '{}' is not cited", reference),
                ));
            }
        }
        (issues, passed, entry.regulatory_references.len())
    }
}
