pub mod agents;
pub mod catalog;
pub mod checklist;
pub mod config;
pub mod contract;
pub mod domain;
pub mod error;
pub mod facts;
pub mod gates;
pub mod logging;
pub mod merge;
pub mod orchestrator;
pub mod package;
pub mod prose;
pub mod review;

pub use checklist::{ChecklistEntry, ChecklistRegistry};
pub use config::{PipelineConfig, load_pipeline_config};
pub use domain::{DealState, DocumentType, ProgramCode, Severity};
pub use error::{CollaboratorError, PipelineError};
pub use facts::{FactContext, FactContextBuilder};
pub use orchestrator::{DocumentRequest, PipelineController, PipelineResult, PipelineState};
pub use package::{PackageReport, PackageRunner};
pub use prose::{ProseBundle, ProseValue};
