pub mod deal;
pub mod types;

pub use deal::{DealState, LoanTerms, Party, Property, StudyTerms};
pub use types::{DocumentFamily, DocumentType, ProgramCode, Severity};
