mod common;

use anyhow::Result;
use common::*;
use draftguard_engine::agents::cli_client::mocks::MockCliClient;
use draftguard_engine::facts::keys;
use draftguard_engine::logging::{LogEventType, read_events};
use draftguard_engine::{
    DocumentType, FactContext, PackageRunner, PipelineConfig, PipelineError, Severity,
};
use std::sync::Arc;

/// Concurrent runs pull from one queue in no fixed order, so every queued
/// action answers according to the document named in the prompt.
fn queue_by_document(drafter: &MockCliClient, reviewer: &MockCliClient, runs: usize) {
    let note = facts(DocumentType::PromissoryNote);
    let guaranty = facts(DocumentType::Guaranty);
    for _ in 0..runs {
        let (note, guaranty) = (note.clone(), guaranty.clone());
        drafter.add_action(move |prompt| {
            if prompt.contains("(promissory_note)") {
                Ok(note_json(&note, "Upon an event of default the Holder may accelerate."))
            } else {
                Ok(guaranty_json(&guaranty))
            }
        });
        reviewer.add_action(review_by_document);
    }
}

fn review_by_document(prompt: &str) -> Result<String> {
    if prompt.contains("(promissory_note)") {
        Ok(passing_review(DocumentType::PromissoryNote))
    } else {
        Ok(passing_review(DocumentType::Guaranty))
    }
}

#[tokio::test]
async fn test_package_accepts_consistent_siblings() -> Result<()> {
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    queue_by_document(&drafter, &reviewer, 2);
    let controller = controller(&drafter, &reviewer, PipelineConfig::default());

    let report = PackageRunner::new(&controller)
        .run(
            &deal(),
            &[DocumentType::PromissoryNote, DocumentType::Guaranty, DocumentType::PromissoryNote],
            None,
        )
        .await?;

    assert_eq!(report.deal_id, "D-100");
    assert_eq!(report.results.len(), 2);
    assert!(report.result(DocumentType::PromissoryNote).unwrap().accepted);
    assert!(report.result(DocumentType::Guaranty).unwrap().accepted);
    assert!(report.cross_document_issues.is_empty());
    assert!(report.accepted());
    assert_eq!(drafter.pending(), 0);
    Ok(())
}

#[tokio::test]
async fn test_package_flags_diverging_principal() -> Result<()> {
    let note = FactContext::from_pairs(
        "D-100",
        DocumentType::PromissoryNote,
        [
            (keys::BORROWER_NAME, "Acme Holdings LLC"),
            (keys::LENDER_NAME, "First Harbor Bank"),
            (keys::PRINCIPAL_AMOUNT, "$500,000 (five hundred thousand dollars)"),
            (keys::INTEREST_RATE, "6.250% per annum"),
            (keys::MATURITY_DATE, "March 1, 2031"),
            (keys::GOVERNING_STATE, "California"),
        ],
    );
    let guaranty = FactContext::from_pairs(
        "D-100",
        DocumentType::Guaranty,
        [
            (keys::GUARANTOR_NAME, "Dana Whitfield"),
            (keys::BORROWER_NAME, "Acme Holdings LLC"),
            (keys::LENDER_NAME, "First Harbor Bank"),
            (keys::PRINCIPAL_AMOUNT, "$550,000 (five hundred fifty thousand dollars)"),
            (keys::GOVERNING_STATE, "California"),
        ],
    );

    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    for _ in 0..2 {
        let (note, guaranty) = (note.clone(), guaranty.clone());
        drafter.add_action(move |prompt| {
            if prompt.contains("(promissory_note)") {
                Ok(note_json(&note, "Upon an event of default the Holder may accelerate."))
            } else {
                Ok(guaranty_json(&guaranty))
            }
        });
        reviewer.add_action(review_by_document);
    }
    let controller = controller(&drafter, &reviewer, PipelineConfig::default());

    let report = PackageRunner::new(&controller)
        .run_contexts("D-100", vec![Arc::new(note), Arc::new(guaranty)], None)
        .await?;

    assert!(report.results.iter().all(|r| r.accepted));
    let critical: Vec<_> = report
        .cross_document_issues
        .iter()
        .filter(|i| i.severity == Severity::Critical)
        .collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].fact, keys::PRINCIPAL_AMOUNT);
    assert!(!report.accepted());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_package_returns_error() {
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    let (tx, rx) = tokio::sync::watch::channel(false);
    let controller =
        controller(&drafter, &reviewer, PipelineConfig::default()).with_cancellation(rx);
    tx.send(true).unwrap();

    let outcome = PackageRunner::new(&controller)
        .run(&deal(), &[DocumentType::PromissoryNote], None)
        .await;

    assert!(matches!(outcome, Err(PipelineError::Cancelled(_))));
    assert!(drafter.prompts().is_empty());
}

#[tokio::test]
async fn test_each_run_writes_its_own_log() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    queue_by_document(&drafter, &reviewer, 2);
    let config = PipelineConfig {
        log_dir: Some(tmp.path().to_path_buf()),
        ..PipelineConfig::default()
    };
    let controller = controller(&drafter, &reviewer, config);

    let report = PackageRunner::new(&controller)
        .run(&deal(), &[DocumentType::PromissoryNote, DocumentType::Guaranty], None)
        .await?;

    for result in &report.results {
        let path = tmp
            .path()
            .join(result.run_id.to_string())
            .join("logs")
            .join("pipeline.jsonl");
        let events = read_events(&path).await?;
        assert_eq!(events.first().unwrap().event_type, LogEventType::RunStart);
        assert_eq!(events.last().unwrap().event_type, LogEventType::Verdict);
    }
    Ok(())
}
