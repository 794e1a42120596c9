use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw upstream deal state. Supplied by the deal source and never written
/// back; the fact context builder is the only consumer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DealState {
    pub deal_id: String,
    #[serde(default)]
    pub borrower: Option<Party>,
    #[serde(default)]
    pub lender: Option<Party>,
    #[serde(default)]
    pub guarantor: Option<Party>,
    #[serde(default)]
    pub property: Option<Property>,
    #[serde(default)]
    pub loan: Option<LoanTerms>,
    #[serde(default)]
    pub sponsor: Option<Party>,
    #[serde(default)]
    pub investigator: Option<Party>,
    #[serde(default)]
    pub study: Option<StudyTerms>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Party {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_of_organization: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoanTerms {
    /// Principal in dollars; converted to whole cents before formatting.
    pub principal: f64,
    /// Annual rate in percent (6.25 means 6.25%).
    pub interest_rate: f64,
    #[serde(default)]
    pub origination_date: Option<NaiveDate>,
    #[serde(default)]
    pub maturity_date: Option<NaiveDate>,
    #[serde(default)]
    pub term_months: Option<u32>,
    /// Loan-to-value in percent.
    #[serde(default)]
    pub ltv_ratio: Option<f64>,
    #[serde(default)]
    pub dscr: Option<f64>,
    #[serde(default)]
    pub governing_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudyTerms {
    pub investigational_product: String,
    #[serde(default)]
    pub ind_number: Option<String>,
    #[serde(default)]
    pub protocol_number: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
    #[serde(default)]
    pub enrollment_target: Option<u32>,
    #[serde(default)]
    pub submission_date: Option<NaiveDate>,
}

impl DealState {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse deal state JSON")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read deal state from {}", path.display()))?;
        Self::from_json(&content)
    }
}
