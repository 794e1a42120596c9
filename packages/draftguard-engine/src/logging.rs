use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Structured log event types for full run traceability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LogEventType {
    RunStart,
    StateTransition,
    ContractBuilt,
    PromptSent,
    ResponseReceived,
    VerificationResult,
    ReviewResult,
    CorrectionApplied,
    CorrectionRejected,
    FallbackUsed,
    Verdict,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single structured log entry, serialized as one JSON line in the JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub event_type: LogEventType,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl LogEvent {
    pub fn new(
        event_type: LogEventType,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event_type,
            level,
            message: message.into(),
            details,
        }
    }

    pub fn info(event_type: LogEventType, message: impl Into<String>) -> Self {
        Self::new(event_type, LogLevel::Info, message, None)
    }

    pub fn info_with_details(
        event_type: LogEventType,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Info, message, Some(details))
    }

    pub fn debug_with_details(
        event_type: LogEventType,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Debug, message, Some(details))
    }

    pub fn warn_with_details(
        event_type: LogEventType,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Warn, message, Some(details))
    }

    pub fn error_with_details(message: impl Into<String>, details: Value) -> Self {
        Self::new(LogEventType::Error, LogLevel::Error, message, Some(details))
    }
}

/// Writes one JSONL file per document run at `<run_dir>/logs/pipeline.jsonl`.
#[derive(Debug, Clone)]
pub struct RunLogger {
    log_file_path: PathBuf,
}

impl RunLogger {
    /// Creates the `logs/` subdirectory if it doesn't exist.
    pub async fn new(run_dir: &Path) -> Result<Self> {
        let logs_dir = run_dir.join("logs");
        tokio::fs::create_dir_all(&logs_dir)
            .await
            .context("Failed to create logs directory")?;

        Ok(Self {
            log_file_path: logs_dir.join("pipeline.jsonl"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_file_path
    }

    /// Appends a log event as a JSON line.
    /// Each call opens/appends/flushes for crash safety.
    pub async fn log(&self, event: LogEvent) -> Result<()> {
        let mut line = serde_json::to_string(&event).context("Failed to serialize log event")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .context("Failed to open log file")?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    pub async fn log_run_start(&self, run_id: &str, deal_id: &str, document_type: &str) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::RunStart,
            format!("Started {} run for deal {}", document_type, deal_id),
            json!({
                "run_id": run_id,
                "deal_id": deal_id,
                "document_type": document_type,
            }),
        ))
        .await
    }

    pub async fn log_state_transition(&self, attempt: u32, from: &str, to: &str) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::StateTransition,
            format!("{} -> {}", from, to),
            json!({ "attempt": attempt, "from": from, "to": to }),
        ))
        .await
    }

    pub async fn log_prompt_sent(&self, role: &str, attempt: u32, prompt: &str) -> Result<()> {
        self.log(LogEvent::debug_with_details(
            LogEventType::PromptSent,
            format!("Prompt sent to {}", role),
            json!({
                "role": role,
                "attempt": attempt,
                "prompt": prompt,
                "prompt_length": prompt.len(),
            }),
        ))
        .await
    }

    pub async fn log_response_received(&self, role: &str, attempt: u32, response: &Value) -> Result<()> {
        self.log(LogEvent::debug_with_details(
            LogEventType::ResponseReceived,
            format!("Response received from {}", role),
            json!({ "role": role, "attempt": attempt, "response": response }),
        ))
        .await
    }

    pub async fn log_verdict(&self, accepted: bool, state: &str, attempts: u32, open_critical: usize) -> Result<()> {
        let level = if accepted { LogLevel::Info } else { LogLevel::Warn };
        self.log(LogEvent::new(
            LogEventType::Verdict,
            level,
            format!("Run finished {}", state),
            Some(json!({
                "accepted": accepted,
                "state": state,
                "attempts": attempts,
                "open_critical": open_critical,
            })),
        ))
        .await
    }
}

/// Reads every event back from a JSONL log file.
pub async fn read_events(path: &Path) -> Result<Vec<LogEvent>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).context("Malformed log line"))
        .collect()
}
