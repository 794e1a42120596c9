use thiserror::Error;

/// Failure of one of the two external text-generation collaborators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollaboratorError {
    #[error("{role} call failed: {message}")]
    CallFailed { role: String, message: String },
    #[error("{role} call timed out after {seconds}s")]
    TimedOut { role: String, seconds: u64 },
    #[error("{role} returned malformed output: {message}")]
    Malformed { role: String, message: String },
    #[error("{role} output violates the declared schema: {violations}")]
    SchemaViolation { role: String, violations: String },
}

impl CollaboratorError {
    pub fn call_failed(role: &str, message: impl Into<String>) -> Self {
        Self::CallFailed {
            role: role.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed(role: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            role: role.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown document type: {0}")]
    UnknownDocumentType(String),
    #[error("run for {0} was cancelled before reaching a verdict")]
    Cancelled(String),
    #[error("fact context was built for {built} but the request targets {requested}")]
    FactContextMismatch { built: String, requested: String },
    #[error("field {field} is not part of the {document_type} schema")]
    UnknownField {
        field: String,
        document_type: String,
    },
}
