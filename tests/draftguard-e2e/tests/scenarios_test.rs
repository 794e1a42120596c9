mod common;

use anyhow::Result;
use common::*;
use draftguard_engine::agents::cli_client::mocks::MockCliClient;
use draftguard_engine::facts::keys;
use draftguard_engine::gates::CheckKind;
use draftguard_engine::orchestrator::{IssueOrigin, IssueStatus};
use draftguard_engine::review::ReviewStatus;
use draftguard_engine::{
    DocumentRequest, DocumentType, FactContext, PipelineConfig, PipelineState, ProseValue, Severity,
};
use serde_json::{Value, json};
use std::sync::Arc;

#[tokio::test]
async fn test_empty_default_provisions_triggers_retry_with_feedback() -> Result<()> {
    let note = facts(DocumentType::PromissoryNote);
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    drafter.add_response(note_json(&note, ""));
    drafter.add_response(note_json(&note, "Upon an event of default the Holder may accelerate the Note."));
    reviewer.add_response(passing_review(DocumentType::PromissoryNote));

    let request = DocumentRequest::new(Arc::new(note), None);
    let result = controller(&drafter, &reviewer, PipelineConfig::default())
        .run(&request)
        .await?;

    let first_attempt_critical: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.attempt == 1 && i.severity == Severity::Critical)
        .collect();
    assert_eq!(first_attempt_critical.len(), 1);
    assert_eq!(first_attempt_critical[0].field, "prose:defaultProvisions");
    assert_eq!(first_attempt_critical[0].check, Some(CheckKind::Shape));
    assert_eq!(first_attempt_critical[0].status, IssueStatus::Superseded);

    let prompts = drafter.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("[prose:defaultProvisions]"));
    assert!(prompts[1].contains("[prose:defaultProvisions]"));

    assert!(result.accepted);
    assert_eq!(result.state, PipelineState::Accepted);
    assert_eq!(result.attempts, 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_regulatory_citations_are_warnings_only() -> Result<()> {
    let ind = FactContext::from_pairs(
        "D-200",
        DocumentType::IndApplication,
        [
            (keys::SPONSOR_NAME, "Northwind Therapeutics, Inc."),
            (keys::INVESTIGATIONAL_PRODUCT, "NW-101"),
            (keys::PROTOCOL_NUMBER, "NW-101-001"),
            (keys::ENROLLMENT_TARGET, "48 (forty-eight) subjects"),
        ],
    );
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    drafter.add_response(
        json!({
            "coverLetterSummary": "Northwind Therapeutics, Inc. submits this application for NW-101 under protocol NW-101-001.",
            "investigationalPlan": "A dose-escalation study enrolling 48 (forty-eight) subjects.",
            "chemistryManufacturing": "The drug substance is manufactured under current good manufacturing practice.",
            "pharmacologyToxicology": "Nonclinical studies support the proposed starting dose.",
            "previousHumanExperience": "There is no previous human experience with NW-101.",
            "sponsorCommitments": ["An IRB will review and approve the study.", "Safety findings will be reported promptly."]
        })
        .to_string(),
    );
    reviewer.add_response(passing_review(DocumentType::IndApplication));

    let request = DocumentRequest::new(Arc::new(ind), None);
    let result = controller(&drafter, &reviewer, PipelineConfig::default())
        .run(&request)
        .await?;

    let report = &result.verification;
    assert!(report.passed);
    assert_eq!((report.checks_passed, report.checks_run), (0, 2));
    let regulatory: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.check == CheckKind::Regulatory)
        .collect();
    assert_eq!(regulatory.len(), 2);
    assert!(regulatory.iter().all(|i| i.severity == Severity::Warning));
    assert!(regulatory.iter().any(|i| i.field == "regulatory:21 CFR 312"));
    assert!(regulatory.iter().any(|i| i.field == "regulatory:Form 1571"));

    assert!(result.accepted);
    assert_eq!(result.attempts, 1);
    Ok(())
}

#[tokio::test]
async fn test_reviewer_correction_replaces_only_the_flagged_field() -> Result<()> {
    let guaranty = facts(DocumentType::Guaranty);
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    drafter.add_response(guaranty_json(&guaranty));

    let corrected_scope = format!(
        "{} This Guaranty shall be reinstated if any payment on the obligations is rescinded or must be returned upon the insolvency of Borrower.",
        GUARANTY_SCOPE
    );
    let mut verdicts: Vec<Value> = passing_verdicts(DocumentType::Guaranty, None)
        .into_iter()
        .filter(|v| {
            let item = v["item"].as_str().unwrap_or_default();
            item != "Reinstatement of guaranty after avoidance of payments"
                && item != "Waiver of suretyship defenses"
        })
        .collect();
    verdicts.push(json!({
        "item": "Reinstatement of guaranty after avoidance of payments",
        "passed": false,
        "note": "Missing from the draft"
    }));
    verdicts.push(json!({ "item": "waiver of suretyship defenses", "passed": true, "note": "" }));
    reviewer.add_response(
        json!({
            "findings": [{
                "severity": "critical",
                "field": "prose:guarantyScope",
                "description": "Reinstatement of guaranty after avoidance of payments is missing",
                "fix": "Added reinstatement language"
            }],
            "correctedFields": { "guarantyScope": corrected_scope },
            "verdicts": verdicts
        })
        .to_string(),
    );

    let request = DocumentRequest::new(Arc::new(guaranty), None);
    let result = controller(&drafter, &reviewer, PipelineConfig::default())
        .run(&request)
        .await?;

    assert!(result.accepted);
    assert_eq!(result.state, PipelineState::Accepted);
    assert_eq!(result.review_status, ReviewStatus::Completed);
    assert_eq!(
        result.bundle.get("guarantyScope"),
        Some(&ProseValue::Text(corrected_scope))
    );
    assert_eq!(
        result.bundle.get("waiverOfDefenses"),
        Some(&ProseValue::Text(GUARANTY_WAIVERS.to_string()))
    );

    let finding = result
        .issues_for("prose:guarantyScope")
        .find(|i| i.origin == IssueOrigin::Reviewer)
        .unwrap();
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.status, IssueStatus::Corrected);
    let reinstatement: Vec<_> = result
        .issues_for("checklist:Reinstatement of guaranty after avoidance of payments")
        .collect();
    assert_eq!(reinstatement.len(), 1);
    assert_eq!(reinstatement[0].status, IssueStatus::Corrected);
    assert_eq!(result.open_critical().count(), 0);

    let waiver = result
        .verdicts
        .iter()
        .find(|v| v.item == "Waiver of suretyship defenses")
        .unwrap();
    assert!(waiver.passed);
    Ok(())
}

#[tokio::test]
async fn test_drafting_failure_falls_back_to_generic_bundle() -> Result<()> {
    let note = facts(DocumentType::PromissoryNote);
    let borrower = fact(&note, keys::BORROWER_NAME).to_string();
    let principal = fact(&note, keys::PRINCIPAL_AMOUNT).to_string();

    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    for _ in 0..3 {
        drafter.add_failure("connection reset by peer");
    }
    reviewer.add_response(passing_review(DocumentType::PromissoryNote));

    let request = DocumentRequest::new(Arc::new(note), None);
    let result = controller(&drafter, &reviewer, PipelineConfig::default())
        .run(&request)
        .await?;

    assert!(result.used_fallback);
    assert_eq!(result.attempts, 3);
    let text = result.bundle.concatenated_text();
    assert!(text.contains(&borrower));
    assert!(text.contains(&principal));

    let drafter_issues: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.origin == IssueOrigin::Drafter)
        .collect();
    assert_eq!(drafter_issues.len(), 3);
    assert_eq!(drafter_issues[2].severity, Severity::Warning);
    assert!(drafter_issues[2].message.contains("fallback"));
    assert!(drafter.prompts()[1].contains("could not be used"));

    assert!(result.accepted);
    Ok(())
}

#[tokio::test]
async fn test_fallback_with_failed_review_is_flagged_not_crashed() -> Result<()> {
    let note = facts(DocumentType::PromissoryNote);
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    drafter.add_failure("quota exhausted");
    reviewer.add_failure("reviewer unavailable");

    let config = PipelineConfig {
        max_attempts: 1,
        reject_on_review_error: true,
        ..PipelineConfig::default()
    };
    let request = DocumentRequest::new(Arc::new(note), None);
    let result = controller(&drafter, &reviewer, config).run(&request).await?;

    assert!(result.used_fallback);
    assert!(!result.accepted);
    assert_eq!(result.state, PipelineState::Rejected);
    assert_eq!(result.review_status, ReviewStatus::SystemError);
    assert!(result.verdicts.is_empty());
    assert!(result
        .open_critical()
        .any(|i| i.message.starts_with("Reviewed with system error")));
    Ok(())
}
