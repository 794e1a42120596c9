pub mod format;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog;
use crate::domain::{DealState, DocumentType};
use format::Formatted;

/// Fact keys shared by the catalog, the builder and the checklist rules.
pub mod keys {
    pub const BORROWER_NAME: &str = "borrower_name";
    pub const LENDER_NAME: &str = "lender_name";
    pub const GUARANTOR_NAME: &str = "guarantor_name";
    pub const PRINCIPAL_AMOUNT: &str = "principal_amount";
    pub const INTEREST_RATE: &str = "interest_rate";
    pub const NOTE_DATE: &str = "note_date";
    pub const MATURITY_DATE: &str = "maturity_date";
    pub const TERM_MONTHS: &str = "term_months";
    pub const LTV_RATIO: &str = "ltv_ratio";
    pub const DSCR: &str = "dscr";
    pub const PROPERTY_ADDRESS: &str = "property_address";
    pub const GOVERNING_STATE: &str = "governing_state";
    pub const SPONSOR_NAME: &str = "sponsor_name";
    pub const PRINCIPAL_INVESTIGATOR: &str = "principal_investigator";
    pub const INVESTIGATIONAL_PRODUCT: &str = "investigational_product";
    pub const IND_NUMBER: &str = "ind_number";
    pub const PROTOCOL_NUMBER: &str = "protocol_number";
    pub const STUDY_PHASE: &str = "study_phase";
    pub const INDICATION: &str = "indication";
    pub const ENROLLMENT_TARGET: &str = "enrollment_target";
    pub const SUBMISSION_DATE: &str = "submission_date";
}

const PLACEHOLDER_PREFIX: &str = "[[MISSING:";

pub fn placeholder(key: &str) -> String {
    format!("{}{}]]", PLACEHOLDER_PREFIX, key)
}

pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

/// Authoritative, formatted facts for one (deal, document type) request.
///
/// There are no mutators: once built, a context is only read. Callers that
/// share it across tasks wrap it in an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactContext {
    deal_id: String,
    document_type: DocumentType,
    facts: BTreeMap<String, String>,
    #[serde(default)]
    alternates: BTreeMap<String, Vec<String>>,
}

impl FactContext {
    /// Builds a context from already formatted pairs. Mostly useful to
    /// collaborators and tests that do not start from a [`DealState`].
    pub fn from_pairs<K, V>(
        deal_id: impl Into<String>,
        document_type: DocumentType,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            deal_id: deal_id.into(),
            document_type,
            facts: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            alternates: BTreeMap::new(),
        }
    }

    pub fn deal_id(&self) -> &str {
        &self.deal_id
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.facts.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Value usable as a verbatim token: present and not a placeholder.
    pub fn resolved(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !is_placeholder(v))
    }

    /// Keys whose value is a missing-relationship placeholder.
    pub fn placeholders(&self) -> Vec<&str> {
        self.facts
            .iter()
            .filter(|(_, v)| is_placeholder(v))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Every resolved fact value, in key order.
    pub fn tokens(&self) -> Vec<&str> {
        self.facts
            .values()
            .map(String::as_str)
            .filter(|v| !is_placeholder(v))
            .collect()
    }

    /// The canonical value followed by every accepted alternate spelling.
    pub fn representations(&self, key: &str) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(value) = self.resolved(key) {
            out.push(value);
            if let Some(alts) = self.alternates.get(key) {
                out.extend(alts.iter().map(String::as_str));
            }
        }
        out
    }

    /// One `- Label: value` line per fact, with placeholders called out so a
    /// drafter never fills them in.
    pub fn render_narrative_safe(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.facts {
            if is_placeholder(value) {
                out.push_str(&format!(
                    "- {}: NOT PROVIDED (write the token {} exactly; do not invent a value)\n",
                    label(key),
                    value
                ));
            } else {
                out.push_str(&format!("- {}: {}\n", label(key), value));
            }
        }
        out
    }
}

/// `principal_amount` -> `Principal Amount`
pub fn label(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assembles a [`FactContext`] from raw deal state.
#[derive(Debug, Default)]
pub struct FactContextBuilder;

impl FactContextBuilder {
    /// Resolves every fact the document type's contract references. A fact
    /// the deal state cannot supply becomes an explicit placeholder.
    pub fn build(deal: &DealState, document_type: DocumentType) -> FactContext {
        let profile = catalog::profile(document_type);
        let mut facts = BTreeMap::new();
        let mut alternates = BTreeMap::new();

        for key in profile.facts {
            match resolve(deal, key) {
                Some(formatted) => {
                    if !formatted.alternates.is_empty() {
                        alternates.insert(key.to_string(), formatted.alternates);
                    }
                    facts.insert(key.to_string(), formatted.value);
                }
                None => {
                    facts.insert(key.to_string(), placeholder(key));
                }
            }
        }

        FactContext {
            deal_id: deal.deal_id.clone(),
            document_type,
            facts,
            alternates,
        }
    }
}

fn non_empty(value: &str) -> Option<Formatted> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(Formatted {
            value: trimmed.to_string(),
            alternates: Vec::new(),
        })
    }
}

fn resolve(deal: &DealState, key: &str) -> Option<Formatted> {
    let loan = deal.loan.as_ref();
    let study = deal.study.as_ref();
    match key {
        keys::BORROWER_NAME => deal.borrower.as_ref().and_then(|p| non_empty(&p.name)),
        keys::LENDER_NAME => deal.lender.as_ref().and_then(|p| non_empty(&p.name)),
        keys::GUARANTOR_NAME => deal.guarantor.as_ref().and_then(|p| non_empty(&p.name)),
        keys::SPONSOR_NAME => deal.sponsor.as_ref().and_then(|p| non_empty(&p.name)),
        keys::PRINCIPAL_INVESTIGATOR => {
            deal.investigator.as_ref().and_then(|p| non_empty(&p.name))
        }
        keys::PRINCIPAL_AMOUNT => loan
            .and_then(|l| format::to_cents(l.principal))
            .filter(|cents| *cents > 0)
            .map(format::currency),
        keys::INTEREST_RATE => loan
            .map(|l| l.interest_rate)
            .filter(|r| r.is_finite() && *r >= 0.0)
            .map(format::annual_rate),
        keys::NOTE_DATE => loan.and_then(|l| l.origination_date).map(format::long_date),
        keys::MATURITY_DATE => loan.and_then(|l| l.maturity_date).map(format::long_date),
        keys::TERM_MONTHS => loan
            .and_then(|l| l.term_months)
            .map(|m| format::count(u64::from(m), "months")),
        keys::LTV_RATIO => loan
            .and_then(|l| l.ltv_ratio)
            .filter(|r| r.is_finite())
            .map(format::ratio_percent),
        keys::DSCR => loan
            .and_then(|l| l.dscr)
            .filter(|r| r.is_finite())
            .map(format::coverage),
        keys::GOVERNING_STATE => loan
            .and_then(|l| l.governing_state.as_deref())
            .or_else(|| deal.property.as_ref().and_then(|p| p.state.as_deref()))
            .and_then(non_empty),
        keys::PROPERTY_ADDRESS => deal.property.as_ref().and_then(|p| {
            let mut address = p.address.trim().to_string();
            if address.is_empty() {
                return None;
            }
            if let Some(county) = p.county.as_deref().filter(|c| !c.trim().is_empty()) {
                address = format!("{}, {} County", address, county.trim());
            }
            non_empty(&address)
        }),
        keys::INVESTIGATIONAL_PRODUCT => study.and_then(|s| non_empty(&s.investigational_product)),
        keys::IND_NUMBER => study.and_then(|s| s.ind_number.as_deref()).and_then(non_empty),
        keys::PROTOCOL_NUMBER => study
            .and_then(|s| s.protocol_number.as_deref())
            .and_then(non_empty),
        keys::STUDY_PHASE => study.and_then(|s| s.phase.as_deref()).and_then(non_empty),
        keys::INDICATION => study.and_then(|s| s.indication.as_deref()).and_then(non_empty),
        keys::ENROLLMENT_TARGET => study
            .and_then(|s| s.enrollment_target)
            .map(|n| format::count(u64::from(n), "subjects")),
        keys::SUBMISSION_DATE => study.and_then(|s| s.submission_date).map(format::long_date),
        _ => None,
    }
}
