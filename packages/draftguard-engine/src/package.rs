use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::{ComplianceReviewer, Drafter};
use crate::checklist::CrossDocumentRule;
use crate::domain::{DealState, DocumentType, ProgramCode};
use crate::error::PipelineError;
use crate::facts::{FactContext, FactContextBuilder};
use crate::gates::{ConsistencyChecker, CrossDocumentIssue, Sibling};
use crate::orchestrator::{DocumentRequest, PipelineController, PipelineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    pub deal_id: String,
    pub results: Vec<PipelineResult>,
    pub cross_document_issues: Vec<CrossDocumentIssue>,
}

impl PackageReport {
    /// Every document accepted and no critical cross-document mismatch.
    pub fn accepted(&self) -> bool {
        self.results.iter().all(|r| r.accepted)
            && !self
                .cross_document_issues
                .iter()
                .any(|i| i.severity.is_critical())
    }

    pub fn result(&self, document_type: DocumentType) -> Option<&PipelineResult> {
        self.results.iter().find(|r| r.document_type == document_type)
    }
}

/// Runs the sibling documents of one deal concurrently through a shared
/// controller, then checks the facts they must agree on.
pub struct PackageRunner<'a, D: Drafter, R: ComplianceReviewer> {
    controller: &'a PipelineController<D, R>,
}

impl<'a, D: Drafter, R: ComplianceReviewer> PackageRunner<'a, D, R> {
    pub fn new(controller: &'a PipelineController<D, R>) -> Self {
        Self { controller }
    }

    pub async fn run(
        &self,
        deal: &DealState,
        document_types: &[DocumentType],
        program: Option<&ProgramCode>,
    ) -> Result<PackageReport, PipelineError> {
        let mut unique: Vec<DocumentType> = Vec::new();
        for document_type in document_types {
            if !unique.contains(document_type) {
                unique.push(*document_type);
            }
        }
        let contexts: Vec<Arc<FactContext>> = unique
            .iter()
            .map(|dt| Arc::new(FactContextBuilder::build(deal, *dt)))
            .collect();
        self.run_contexts(&deal.deal_id, contexts, program).await
    }

    /// Same as [`PackageRunner::run`] for fact contexts built elsewhere.
    pub async fn run_contexts(
        &self,
        deal_id: &str,
        contexts: Vec<Arc<FactContext>>,
        program: Option<&ProgramCode>,
    ) -> Result<PackageReport, PipelineError> {
        tracing::info!(deal_id, documents = contexts.len(), "package run started");
        let requests: Vec<DocumentRequest> = contexts
            .iter()
            .map(|facts| DocumentRequest::new(Arc::clone(facts), program.cloned()))
            .collect();

        let results = join_all(requests.iter().map(|r| self.controller.run(r)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let registry = self.controller.registry();
        let rules: Vec<CrossDocumentRule> = contexts
            .iter()
            .flat_map(|facts| {
                registry
                    .entry(facts.document_type(), program)
                    .cross_document_rules
            })
            .collect();
        let siblings: Vec<Sibling<'_>> = contexts
            .iter()
            .zip(&results)
            .map(|(facts, result)| Sibling {
                document_type: facts.document_type(),
                facts: facts.as_ref(),
                bundle: result.accepted.then_some(&result.bundle),
            })
            .collect();
        let cross_document_issues = ConsistencyChecker::check(&rules, &siblings);

        for issue in &cross_document_issues {
            tracing::warn!(
                deal_id,
                fact = %issue.fact,
                severity = %issue.severity,
                "{}",
                issue.message
            );
        }

        let report = PackageReport {
            deal_id: deal_id.to_string(),
            results,
            cross_document_issues,
        };
        tracing::info!(deal_id, accepted = report.accepted(), "package run finished");
        Ok(report)
    }
}
