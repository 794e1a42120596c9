use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PipelineError;

/// Every document the pipeline knows how to draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    PromissoryNote,
    SecurityInstrument,
    Guaranty,
    LoanAgreement,
    CommitmentLetter,
    IndApplication,
    InformedConsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFamily {
    Loan,
    Clinical,
}

impl DocumentType {
    pub const ALL: [DocumentType; 7] = [
        DocumentType::PromissoryNote,
        DocumentType::SecurityInstrument,
        DocumentType::Guaranty,
        DocumentType::LoanAgreement,
        DocumentType::CommitmentLetter,
        DocumentType::IndApplication,
        DocumentType::InformedConsent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::PromissoryNote => "promissory_note",
            DocumentType::SecurityInstrument => "security_instrument",
            DocumentType::Guaranty => "guaranty",
            DocumentType::LoanAgreement => "loan_agreement",
            DocumentType::CommitmentLetter => "commitment_letter",
            DocumentType::IndApplication => "ind_application",
            DocumentType::InformedConsent => "informed_consent",
        }
    }

    pub fn family(&self) -> DocumentFamily {
        match self {
            DocumentType::IndApplication | DocumentType::InformedConsent => {
                DocumentFamily::Clinical
            }
            _ => DocumentFamily::Loan,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PipelineError::UnknownDocumentType(s.to_string()))
    }
}

/// Lending or regulatory program whose overlay extends the base checklist
/// (e.g. `sba_7a`, `fda_fast_track`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramCode(pub String);

impl ProgramCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProgramCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProgramCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProgramCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// Collaborators capitalise freely ("Critical", "WARNING"), so matching
/// ignores case and surrounding whitespace.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(serde::de::Error::unknown_variant(&raw, &["warning", "critical"])),
        }
    }
}

impl Severity {
    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}
