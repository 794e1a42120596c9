use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::checklist::{ChecklistEntry, ChecklistRegistry};
use crate::domain::{DocumentType, ProgramCode};

const SCHEMA: &str = include_str!("../schema/pipeline.schema.json");

/// Extra program overlay declared in the config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub program: ProgramCode,
    pub document_type: DocumentType,
    pub entry: ChecklistEntry,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    /// Drafting attempts per document, first attempt included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_collaborator_timeout_secs")]
    pub collaborator_timeout_secs: u64,
    #[serde(default = "default_max_contract_chars")]
    pub max_contract_chars: usize,
    /// Run the deterministic checks again on the merged bundle.
    #[serde(default = "default_true")]
    pub reverify_after_merge: bool,
    #[serde(default)]
    pub reject_on_review_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlays: Vec<OverlayConfig>,
}

pub fn default_version() -> String {
    "1.0.0".to_string()
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_collaborator_timeout_secs() -> u64 {
    120
}

pub fn default_max_contract_chars() -> usize {
    24_000
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: None,
            version: default_version(),
            max_attempts: default_max_attempts(),
            collaborator_timeout_secs: default_collaborator_timeout_secs(),
            max_contract_chars: default_max_contract_chars(),
            reverify_after_merge: true,
            reject_on_review_error: false,
            log_dir: None,
            overlays: Vec::new(),
        }
    }
}

fn validate_value(instance: &Value) -> Result<()> {
    let schema_val: Value = serde_json::from_str(SCHEMA)?;
    let validator = jsonschema::validator_for(&schema_val)
        .map_err(|e| anyhow::anyhow!("Failed to compile schema: {}", e))?;

    let error_msgs: Vec<String> = validator.iter_errors(instance).map(|e| e.to_string()).collect();
    if !error_msgs.is_empty() {
        anyhow::bail!("Pipeline config validation failed: {}", error_msgs.join(", "));
    }
    Ok(())
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_value(&serde_json::to_value(self)?)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }

    /// Built-in registry plus every overlay declared here.
    pub fn registry(&self) -> ChecklistRegistry {
        let mut registry = ChecklistRegistry::builtin();
        for overlay in &self.overlays {
            registry.add_overlay(
                overlay.program.clone(),
                overlay.document_type,
                overlay.entry.clone(),
            );
        }
        registry
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content).context("Config is not valid JSON")?;
        validate_value(&raw)?;
        let config: Self = serde_json::from_value(raw)?;
        Ok(config)
    }
}

/// Loads and validates a config file. A missing file yields the defaults.
pub async fn load_pipeline_config(path: &Path) -> Result<PipelineConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        tracing::debug!(path = %path.display(), "no pipeline config, using defaults");
        return Ok(PipelineConfig::default());
    }
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    PipelineConfig::from_json(&content)
        .with_context(|| format!("Failed to validate {}", path.display()))
}
