use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::agents::{ComplianceReviewer, Drafter};
use crate::catalog;
use crate::checklist::ChecklistRegistry;
use crate::config::PipelineConfig;
use crate::contract::{ContractBuilder, CorrectionDirective, accumulate};
use crate::domain::{DocumentType, ProgramCode, Severity};
use crate::error::{CollaboratorError, PipelineError};
use crate::facts::FactContext;
use crate::gates::{CheckKind, DeterministicVerifier, VerificationIssue, VerificationReport};
use crate::logging::{LogEvent, LogEventType, RunLogger};
use crate::merge::CorrectionMerger;
use crate::prose::ProseBundle;
use crate::review::{ChecklistVerdict, ReviewResult, ReviewStatus, normalize_verdicts};

const DRAFTER: &str = "drafter";
const REVIEWER: &str = "reviewer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Drafting,
    Verifying,
    Reviewing,
    Merging,
    Accepted,
    Retry,
    Rejected,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Drafting => "drafting",
            PipelineState::Verifying => "verifying",
            PipelineState::Reviewing => "reviewing",
            PipelineState::Merging => "merging",
            PipelineState::Accepted => "accepted",
            PipelineState::Retry => "retry",
            PipelineState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Accepted | PipelineState::Rejected)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueOrigin {
    Drafter,
    Verifier,
    Reviewer,
    Merger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    /// Resolved by an applied reviewer correction.
    Corrected,
    /// Raised against an earlier attempt that was redrafted.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub attempt: u32,
    pub origin: IssueOrigin,
    pub field: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckKind>,
    pub status: IssueStatus,
}

impl Issue {
    pub fn is_open_critical(&self) -> bool {
        self.status == IssueStatus::Open && self.severity.is_critical()
    }

    fn same_check(&self, other: &VerificationIssue) -> bool {
        self.origin == IssueOrigin::Verifier
            && self.field == other.field
            && self.message == other.message
            && self.check == Some(other.check)
    }
}

/// One (deal, document type) invocation.
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    pub document_type: DocumentType,
    pub program: Option<ProgramCode>,
    pub facts: Arc<FactContext>,
}

impl DocumentRequest {
    pub fn new(facts: Arc<FactContext>, program: Option<ProgramCode>) -> Self {
        Self {
            document_type: facts.document_type(),
            program,
            facts,
        }
    }
}

/// The only artifact handed on to template rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub deal_id: String,
    pub document_type: DocumentType,
    pub program: Option<ProgramCode>,
    pub accepted: bool,
    pub state: PipelineState,
    pub attempts: u32,
    pub used_fallback: bool,
    pub bundle: ProseBundle,
    pub issues: Vec<Issue>,
    pub verdicts: Vec<ChecklistVerdict>,
    pub review_status: ReviewStatus,
    /// Last deterministic report, post-merge when re-verification ran.
    pub verification: VerificationReport,
}

impl PipelineResult {
    pub fn open_critical(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_open_critical())
    }

    pub fn issues_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |i| i.field == field)
    }
}

/// Mutable bookkeeping for a single run.
struct Run {
    run_id: Uuid,
    logger: Option<RunLogger>,
    state: Option<PipelineState>,
    attempt: u32,
    issues: Vec<Issue>,
    used_fallback: bool,
}

fn quiet(result: anyhow::Result<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to write run log");
    }
}

impl Run {
    async fn emit(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            quiet(logger.log(event).await);
        }
    }

    async fn transition(&mut self, to: PipelineState) {
        let from = self.state.map(|s| s.as_str()).unwrap_or("start");
        tracing::info!(run_id = %self.run_id, attempt = self.attempt, from, to = %to, "state transition");
        if let Some(logger) = &self.logger {
            quiet(logger.log_state_transition(self.attempt, from, to.as_str()).await);
        }
        self.state = Some(to);
    }

    fn push(
        &mut self,
        origin: IssueOrigin,
        field: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        status: IssueStatus,
    ) {
        self.issues.push(Issue {
            attempt: self.attempt,
            origin,
            field: field.into(),
            severity,
            message: message.into(),
            check: None,
            status,
        });
    }

    fn push_verification(&mut self, issue: &VerificationIssue) {
        self.issues.push(Issue {
            attempt: self.attempt,
            origin: IssueOrigin::Verifier,
            field: issue.field.clone(),
            severity: issue.severity,
            message: issue.message.clone(),
            check: Some(issue.check),
            status: IssueStatus::Open,
        });
    }

    fn supersede_open(&mut self) {
        for issue in &mut self.issues {
            if issue.status == IssueStatus::Open {
                issue.status = IssueStatus::Superseded;
            }
        }
    }

    /// Folds a post-merge report into this attempt's verifier issues: checks
    /// that no longer fire are corrected, new ones are opened.
    fn reconcile(&mut self, report: &VerificationReport) {
        let attempt = self.attempt;
        for issue in &mut self.issues {
            if issue.attempt == attempt
                && issue.origin == IssueOrigin::Verifier
                && issue.status == IssueStatus::Open
                && !report.issues.iter().any(|r| issue.same_check(r))
            {
                issue.status = IssueStatus::Corrected;
            }
        }
        for fresh in &report.issues {
            let known = self
                .issues
                .iter()
                .any(|i| i.attempt == attempt && i.same_check(fresh));
            if !known {
                self.push_verification(fresh);
            }
        }
    }

    fn open_critical(&self) -> usize {
        self.issues.iter().filter(|i| i.is_open_critical()).count()
    }
}

/// Drives one document through drafting, verification, review and merge.
pub struct PipelineController<D: Drafter, R: ComplianceReviewer> {
    drafter: D,
    reviewer: R,
    registry: Arc<ChecklistRegistry>,
    config: PipelineConfig,
    cancel: Option<watch::Receiver<bool>>,
}

impl<D: Drafter, R: ComplianceReviewer> PipelineController<D, R> {
    pub fn new(drafter: D, reviewer: R, registry: Arc<ChecklistRegistry>, config: PipelineConfig) -> Self {
        Self {
            drafter,
            reviewer,
            registry,
            config,
            cancel: None,
        }
    }

    /// Once the watched value turns `true`, runs stop at the next state
    /// boundary. A collaborator call already in flight is allowed to finish
    /// and its output is discarded.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn registry(&self) -> &ChecklistRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn ensure_not_cancelled(&self, request: &DocumentRequest) -> Result<(), PipelineError> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            tracing::warn!(
                deal_id = request.facts.deal_id(),
                document_type = %request.document_type,
                "run cancelled"
            );
            return Err(PipelineError::Cancelled(format!(
                "{}/{}",
                request.facts.deal_id(),
                request.document_type
            )));
        }
        Ok(())
    }

    async fn call<T>(
        &self,
        role: &str,
        fut: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, CollaboratorError> {
        match tokio::time::timeout(self.config.collaborator_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::TimedOut {
                role: role.to_string(),
                seconds: self.config.collaborator_timeout_secs,
            }),
        }
    }

    async fn open_logger(&self, run_id: Uuid) -> Option<RunLogger> {
        let dir = self.config.log_dir.as_ref()?.join(run_id.to_string());
        match RunLogger::new(&dir).await {
            Ok(logger) => Some(logger),
            Err(e) => {
                tracing::warn!(error = %e, dir = %dir.display(), "run log disabled");
                None
            }
        }
    }

    pub async fn run(&self, request: &DocumentRequest) -> Result<PipelineResult, PipelineError> {
        let facts = request.facts.as_ref();
        if facts.document_type() != request.document_type {
            return Err(PipelineError::FactContextMismatch {
                built: facts.document_type().to_string(),
                requested: request.document_type.to_string(),
            });
        }

        let document_type = request.document_type;
        let program = request.program.as_ref();
        let profile = catalog::profile(document_type);
        let entry = self.registry.entry(document_type, program);
        let builder = ContractBuilder::new(&self.registry, self.config.max_contract_chars);
        let max_attempts = self.config.max_attempts.max(1);

        let run_id = Uuid::new_v4();
        let mut run = Run {
            run_id,
            logger: self.open_logger(run_id).await,
            state: None,
            attempt: 0,
            issues: Vec::new(),
            used_fallback: false,
        };
        tracing::info!(
            %run_id,
            deal_id = facts.deal_id(),
            %document_type,
            program = program.map(|p| p.as_str()),
            "pipeline run started"
        );
        if let Some(logger) = &run.logger {
            quiet(
                logger
                    .log_run_start(&run_id.to_string(), facts.deal_id(), document_type.as_str())
                    .await,
            );
        }

        let mut feedback: Vec<CorrectionDirective> = Vec::new();

        loop {
            run.attempt += 1;
            let attempt = run.attempt;
            let last_attempt = attempt >= max_attempts;

            self.ensure_not_cancelled(request)?;
            run.supersede_open();
            run.transition(PipelineState::Drafting).await;

            let contract = builder.build(facts, program, &feedback);
            let prompt = contract.render();
            run.emit(LogEvent::info_with_details(
                LogEventType::ContractBuilt,
                format!("Contract built for attempt {}", attempt),
                json!({
                    "attempt": attempt,
                    "chars": prompt.len(),
                    "feedback": feedback.len(),
                    "excerpts": contract.excerpts.len(),
                }),
            ))
            .await;
            if let Some(logger) = &run.logger {
                quiet(logger.log_prompt_sent(DRAFTER, attempt, &prompt).await);
            }

            let drafted = self.call(DRAFTER, self.drafter.draft(&contract)).await;
            self.ensure_not_cancelled(request)?;

            let bundle = match drafted {
                Ok(bundle) => {
                    if let Some(logger) = &run.logger {
                        quiet(logger.log_response_received(DRAFTER, attempt, &bundle.to_json()).await);
                    }
                    bundle
                }
                Err(err) if !last_attempt => {
                    tracing::warn!(%run_id, attempt, error = %err, "drafting failed, retrying");
                    run.push(IssueOrigin::Drafter, "*", Severity::Critical, err.to_string(), IssueStatus::Open);
                    run.emit(LogEvent::error_with_details(
                        err.to_string(),
                        json!({ "role": DRAFTER, "attempt": attempt }),
                    ))
                    .await;
                    accumulate(
                        &mut feedback,
                        [CorrectionDirective::new(
                            "*",
                            format!(
                                "The previous response could not be used ({}). Return one JSON object with exactly the schema keys.",
                                err
                            ),
                        )],
                    );
                    run.transition(PipelineState::Retry).await;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(%run_id, attempt, error = %err, "drafting failed, using fallback bundle");
                    run.push(
                        IssueOrigin::Drafter,
                        "*",
                        Severity::Warning,
                        format!("Drafting collaborator failed; generic fallback bundle used: {}", err),
                        IssueStatus::Open,
                    );
                    run.emit(LogEvent::warn_with_details(
                        LogEventType::FallbackUsed,
                        "Generic fallback bundle used",
                        json!({ "attempt": attempt, "error": err.to_string() }),
                    ))
                    .await;
                    run.used_fallback = true;
                    ProseBundle::fallback(profile, facts)
                }
            };

            run.transition(PipelineState::Verifying).await;
            let report = DeterministicVerifier::verify(profile, &entry, facts, &bundle);
            for issue in &report.issues {
                run.push_verification(issue);
            }
            run.emit(verification_event(attempt, &report, "draft")).await;

            if !report.passed {
                if !last_attempt {
                    accumulate(
                        &mut feedback,
                        report
                            .critical_issues()
                            .map(|i| CorrectionDirective::new(&i.field, &i.message)),
                    );
                    run.transition(PipelineState::Retry).await;
                    continue;
                }
                run.transition(PipelineState::Rejected).await;
                return Ok(self
                    .finish(run, request, bundle, report, Vec::new(), ReviewStatus::NotRun)
                    .await);
            }

            run.transition(PipelineState::Reviewing).await;
            let reviewed = self
                .call(REVIEWER, self.reviewer.review(&bundle, facts, &entry))
                .await;
            self.ensure_not_cancelled(request)?;

            let (review, review_status) = match reviewed {
                Ok(result) => {
                    let mut result = result.normalize_fields();
                    result.verdicts =
                        normalize_verdicts(&entry.items(), profile.template_guaranteed, &result.verdicts);
                    (result, ReviewStatus::Completed)
                }
                Err(err) => {
                    tracing::warn!(%run_id, error = %err, "review failed");
                    let severity = if self.config.reject_on_review_error {
                        Severity::Critical
                    } else {
                        Severity::Warning
                    };
                    run.push(
                        IssueOrigin::Reviewer,
                        "*",
                        severity,
                        format!("Reviewed with system error: {}", err),
                        IssueStatus::Open,
                    );
                    (ReviewResult::default(), ReviewStatus::SystemError)
                }
            };
            run.emit(LogEvent::info_with_details(
                LogEventType::ReviewResult,
                format!("Review {:?}", review_status),
                json!({
                    "findings": review.findings.len(),
                    "critical": review.critical_findings().count(),
                    "corrected_fields": review.corrected_fields.keys().collect::<Vec<_>>(),
                    "failed_items": review.verdicts.iter().filter(|v| !v.passed).count(),
                }),
            ))
            .await;

            run.transition(PipelineState::Merging).await;
            let outcome = CorrectionMerger::merge(&bundle, facts, &review.corrected_fields);
            for field in &outcome.applied {
                run.emit(LogEvent::info_with_details(
                    LogEventType::CorrectionApplied,
                    format!("Applied correction to {}", field),
                    json!({ "field": field }),
                ))
                .await;
            }
            for rejected in &outcome.rejected {
                run.push(
                    IssueOrigin::Merger,
                    format!("prose:{}", rejected.field),
                    Severity::Warning,
                    format!("Correction rejected: {}", rejected.reason),
                    IssueStatus::Open,
                );
                run.emit(LogEvent::warn_with_details(
                    LogEventType::CorrectionRejected,
                    format!("Rejected correction to {}", rejected.field),
                    json!({ "field": rejected.field, "reason": rejected.reason }),
                ))
                .await;
            }
            for finding in &review.findings {
                let status = if outcome.applied.contains(&finding.field) {
                    IssueStatus::Corrected
                } else {
                    IssueStatus::Open
                };
                run.push(
                    IssueOrigin::Reviewer,
                    format!("prose:{}", finding.field),
                    finding.severity,
                    finding.description.clone(),
                    status,
                );
            }

            if review_status == ReviewStatus::Completed {
                for item in entry.items() {
                    let Some(verdict) = review
                        .verdicts
                        .iter()
                        .find(|v| v.item == item.text && !v.passed)
                    else {
                        continue;
                    };
                    let severity = item.category.severity();
                    let corrected = severity.is_critical()
                        && review.findings.iter().any(|f| {
                            outcome.applied.contains(&f.field) && cites(&f.description, &item.text)
                        });
                    run.push(
                        IssueOrigin::Reviewer,
                        format!("checklist:{}", item.text),
                        severity,
                        checklist_message(verdict),
                        if corrected {
                            IssueStatus::Corrected
                        } else {
                            IssueStatus::Open
                        },
                    );
                }
            }

            let mut final_report = report;
            if self.config.reverify_after_merge && !outcome.applied.is_empty() {
                let reverified = DeterministicVerifier::verify(profile, &entry, facts, &outcome.bundle);
                run.reconcile(&reverified);
                run.emit(verification_event(attempt, &reverified, "merged")).await;
                final_report = reverified;
            }

            let state = if run.open_critical() == 0 {
                PipelineState::Accepted
            } else {
                PipelineState::Rejected
            };
            run.transition(state).await;
            return Ok(self
                .finish(run, request, outcome.bundle, final_report, review.verdicts, review_status)
                .await);
        }
    }

    async fn finish(
        &self,
        run: Run,
        request: &DocumentRequest,
        bundle: ProseBundle,
        verification: VerificationReport,
        verdicts: Vec<ChecklistVerdict>,
        review_status: ReviewStatus,
    ) -> PipelineResult {
        let state = run.state.unwrap_or(PipelineState::Rejected);
        let open_critical = run.open_critical();
        let accepted = state == PipelineState::Accepted && open_critical == 0;

        tracing::info!(
            run_id = %run.run_id,
            document_type = %request.document_type,
            accepted,
            attempts = run.attempt,
            open_critical,
            "pipeline run finished"
        );
        if let Some(logger) = &run.logger {
            quiet(
                logger
                    .log_verdict(accepted, state.as_str(), run.attempt, open_critical)
                    .await,
            );
        }

        PipelineResult {
            run_id: run.run_id,
            deal_id: request.facts.deal_id().to_string(),
            document_type: request.document_type,
            program: request.program.clone(),
            accepted,
            state,
            attempts: run.attempt,
            used_fallback: run.used_fallback,
            bundle,
            issues: run.issues,
            verdicts,
            review_status,
            verification,
        }
    }
}

/// A finding resolves a checklist item only when its description names it.
fn cites(description: &str, item: &str) -> bool {
    description.to_lowercase().contains(&item.to_lowercase())
}

fn checklist_message(verdict: &ChecklistVerdict) -> String {
    if verdict.note.trim().is_empty() {
        format!("Checklist item not satisfied: {}", verdict.item)
    } else {
        format!("Checklist item not satisfied: {} ({})", verdict.item, verdict.note.trim())
    }
}

fn verification_event(attempt: u32, report: &VerificationReport, stage: &str) -> LogEvent {
    LogEvent::info_with_details(
        LogEventType::VerificationResult,
        format!(
            "Verification of {} {}: {}/{} references",
            stage,
            if report.passed { "passed" } else { "failed" },
            report.checks_passed,
            report.checks_run
        ),
        json!({
            "attempt": attempt,
            "stage": stage,
            "passed": report.passed,
            "checks_passed": report.checks_passed,
            "checks_run": report.checks_run,
            "issues": report.issues,
        }),
    )
}
