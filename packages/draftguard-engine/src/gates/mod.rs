pub mod consistency;
pub mod verifier;

pub use consistency::{ConsistencyChecker, CrossDocumentIssue, Sibling};
pub use verifier::{CheckKind, DeterministicVerifier, VerificationIssue, VerificationReport};
