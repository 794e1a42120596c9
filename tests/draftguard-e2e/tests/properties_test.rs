mod common;

use anyhow::Result;
use common::*;
use draftguard_engine::agents::cli_client::mocks::MockCliClient;
use draftguard_engine::catalog;
use draftguard_engine::facts::keys;
use draftguard_engine::merge::CorrectionMerger;
use draftguard_engine::orchestrator::IssueOrigin;
use draftguard_engine::review::{NO_VERDICT_NOTE, ReviewStatus, TEMPLATE_GUARANTEED_NOTE};
use draftguard_engine::{
    ChecklistRegistry, DocumentRequest, DocumentType, PipelineConfig, PipelineState, ProgramCode,
    ProseBundle, ProseValue, Severity,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

fn guaranty_bundle() -> ProseBundle {
    let facts = facts(DocumentType::Guaranty);
    let value: Value = serde_json::from_str(&guaranty_json(&facts)).unwrap();
    ProseBundle::from_json(DocumentType::Guaranty, &value).unwrap()
}

fn shape(bundle: &ProseBundle) -> Vec<(String, bool)> {
    bundle
        .iter()
        .map(|(k, v)| (k.to_string(), matches!(v, ProseValue::List(_))))
        .collect()
}

#[test]
fn test_merge_is_idempotent() {
    let facts = facts(DocumentType::Guaranty);
    let bundle = guaranty_bundle();
    let mut corrections = BTreeMap::new();
    corrections.insert(
        "guarantyScope".to_string(),
        ProseValue::text("Guarantor guarantees payment, and this Guaranty is reinstated if any payment is avoided."),
    );
    corrections.insert(
        "guarantorCovenants".to_string(),
        ProseValue::list(["Deliver annual financial statements.", "Maintain liquidity."]),
    );

    let once = CorrectionMerger::merge(&bundle, &facts, &corrections);
    let twice = CorrectionMerger::merge(&once.bundle, &facts, &corrections);

    assert_eq!(once.bundle, twice.bundle);
    assert_eq!(once.applied, twice.applied);
    assert!(twice.rejected.is_empty());
}

#[test]
fn test_merge_preserves_bundle_shape() {
    let facts = facts(DocumentType::Guaranty);
    let bundle = guaranty_bundle();
    let mut corrections = BTreeMap::new();
    corrections.insert("signatureBlock".to_string(), ProseValue::text("Signed by Guarantor."));
    corrections.insert("guarantorCovenants".to_string(), ProseValue::text("Deliver statements."));
    corrections.insert("subordination".to_string(), ProseValue::text("   "));
    corrections.insert(
        "waiverOfDefenses".to_string(),
        ProseValue::text("Guarantor waives every defense available to a surety."),
    );

    let outcome = CorrectionMerger::merge(&bundle, &facts, &corrections);

    assert_eq!(shape(&outcome.bundle), shape(&bundle));
    assert_eq!(outcome.applied, vec!["waiverOfDefenses".to_string()]);
    assert_eq!(outcome.rejected.len(), 3);
    assert_eq!(outcome.bundle.get("subordination"), bundle.get("subordination"));
    assert_eq!(outcome.bundle.get("guarantorCovenants"), bundle.get("guarantorCovenants"));
}

#[tokio::test]
async fn test_reviewer_cannot_change_a_locked_figure() -> Result<()> {
    let guaranty = facts(DocumentType::Guaranty);
    let principal = fact(&guaranty, keys::PRINCIPAL_AMOUNT).to_string();
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    drafter.add_response(guaranty_json(&guaranty));
    reviewer.add_response(
        json!({
            "findings": [],
            "correctedFields": {
                "recitals": "Dana Whitfield guarantees the loan made by First Harbor Bank to Acme Holdings LLC in the principal amount of $550,000."
            },
            "verdicts": []
        })
        .to_string(),
    );

    let request = DocumentRequest::new(Arc::new(guaranty), None);
    let result = controller(&drafter, &reviewer, PipelineConfig::default())
        .run(&request)
        .await?;

    let recitals = result.bundle.get("recitals").unwrap().as_text();
    assert!(recitals.contains(&principal));
    assert!(!result.bundle.concatenated_text().contains("$550,000"));
    let rejected = result
        .issues
        .iter()
        .find(|i| i.origin == IssueOrigin::Merger)
        .unwrap();
    assert_eq!(rejected.field, "prose:recitals");
    assert!(rejected.message.contains("drops fact token"));
    Ok(())
}

#[test]
fn test_fallback_introduces_no_figures_beyond_the_facts() {
    let facts = facts(DocumentType::Guaranty);
    let bundle = ProseBundle::fallback(catalog::profile(DocumentType::Guaranty), &facts);
    let known: String = facts.iter().map(|(_, v)| v).collect::<Vec<_>>().join(" ");

    let text = bundle.concatenated_text();
    let figures: Vec<&str> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();

    assert!(!figures.is_empty());
    for figure in figures {
        assert!(known.contains(figure), "fallback invented figure {}", figure);
    }
}

#[tokio::test]
async fn test_every_checklist_item_gets_exactly_one_verdict() -> Result<()> {
    let guaranty = facts(DocumentType::Guaranty);
    let program = ProgramCode::from("sba_7a");
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    drafter.add_response(guaranty_json(&guaranty));
    reviewer.add_response(
        json!({
            "findings": [],
            "correctedFields": {},
            "verdicts": [
                { "item": "GUARANTY OF PAYMENT AND NOT OF COLLECTION", "passed": true, "note": "Present" },
                { "item": "Guaranty of payment and not of collection", "passed": false, "note": "Duplicate" },
                { "item": "Signature block for Guarantor", "passed": false, "note": "Not in narrative" },
                { "item": "Something the checklist never asked for", "passed": true, "note": "" }
            ]
        })
        .to_string(),
    );

    let request = DocumentRequest::new(Arc::new(guaranty), Some(program.clone()));
    let result = controller(&drafter, &reviewer, PipelineConfig::default())
        .run(&request)
        .await?;

    let expected = ChecklistRegistry::builtin()
        .entry(DocumentType::Guaranty, Some(&program))
        .items();
    assert_eq!(result.verdicts.len(), expected.len());
    for (verdict, item) in result.verdicts.iter().zip(&expected) {
        assert_eq!(verdict.item, item.text);
    }

    let find = |item: &str| result.verdicts.iter().find(|v| v.item == item).unwrap();
    assert!(find("Guaranty of payment and not of collection").passed);
    let signature = find("Signature block for Guarantor");
    assert!(signature.passed);
    assert_eq!(signature.note, TEMPLATE_GUARANTEED_NOTE);
    let sba = find("SBA Form 148 unconditional guarantee language");
    assert!(!sba.passed);
    assert_eq!(sba.note, NO_VERDICT_NOTE);
    Ok(())
}

#[tokio::test]
async fn test_retries_never_exceed_the_attempt_budget() -> Result<()> {
    let note = Arc::new(facts(DocumentType::PromissoryNote));
    for max_attempts in 1..=4 {
        let drafter = MockCliClient::new();
        let reviewer = MockCliClient::new();
        for _ in 0..max_attempts + 2 {
            drafter.add_response(note_json(&note, ""));
        }

        let config = PipelineConfig {
            max_attempts,
            ..PipelineConfig::default()
        };
        let request = DocumentRequest::new(Arc::clone(&note), None);
        let result = controller(&drafter, &reviewer, config).run(&request).await?;

        assert_eq!(result.attempts, max_attempts);
        assert_eq!(drafter.prompts().len(), max_attempts as usize);
        assert_eq!(drafter.pending(), 2);
        assert!(reviewer.prompts().is_empty());
        assert_eq!(result.state, PipelineState::Rejected);
        assert_eq!(result.review_status, ReviewStatus::NotRun);
        assert!(!result.accepted);
        assert!(result.open_critical().all(|i| i.attempt == max_attempts));
    }
    Ok(())
}

#[tokio::test]
async fn test_any_failed_required_item_blocks_acceptance() -> Result<()> {
    let registry = ChecklistRegistry::builtin();
    for document_type in [DocumentType::PromissoryNote, DocumentType::Guaranty] {
        let facts = Arc::new(facts(document_type));
        let guaranteed = catalog::profile(document_type).template_guaranteed;
        let required: Vec<String> = registry
            .base(document_type)
            .required_provisions
            .into_iter()
            .filter(|item| !guaranteed.contains(&item.as_str()))
            .collect();
        assert!(!required.is_empty());

        for failing in required {
            let drafter = MockCliClient::new();
            let reviewer = MockCliClient::new();
            drafter.add_response(match document_type {
                DocumentType::PromissoryNote => {
                    note_json(&facts, "Upon an event of default the Holder may accelerate.")
                }
                _ => guaranty_json(&facts),
            });
            let verdicts: Vec<Value> = passing_verdicts(document_type, None)
                .into_iter()
                .map(|v| {
                    if v["item"] == failing.as_str() {
                        json!({ "item": failing.as_str(), "passed": false, "note": "Not found in draft" })
                    } else {
                        v
                    }
                })
                .collect();
            reviewer.add_response(
                json!({ "findings": [], "correctedFields": {}, "verdicts": verdicts }).to_string(),
            );

            let request = DocumentRequest::new(Arc::clone(&facts), None);
            let result = controller(&drafter, &reviewer, PipelineConfig::default())
                .run(&request)
                .await?;

            assert!(!result.accepted, "{} passed with '{}' failing", document_type, failing);
            assert_eq!(result.state, PipelineState::Rejected);
            let open: Vec<_> = result.open_critical().collect();
            assert_eq!(open.len(), 1);
            assert_eq!(open[0].origin, IssueOrigin::Reviewer);
            assert_eq!(open[0].field, format!("checklist:{}", failing));
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_failed_standard_item_is_only_a_warning() -> Result<()> {
    let guaranty = facts(DocumentType::Guaranty);
    let drafter = MockCliClient::new();
    let reviewer = MockCliClient::new();
    drafter.add_response(guaranty_json(&guaranty));
    let verdicts: Vec<Value> = passing_verdicts(DocumentType::Guaranty, None)
        .into_iter()
        .filter(|v| v["item"] != "Consent to jurisdiction")
        .collect();
    reviewer.add_response(
        json!({ "findings": [], "correctedFields": {}, "verdicts": verdicts }).to_string(),
    );

    let request = DocumentRequest::new(Arc::new(guaranty), None);
    let result = controller(&drafter, &reviewer, PipelineConfig::default())
        .run(&request)
        .await?;

    assert!(result.accepted);
    let skipped: Vec<_> = result.issues_for("checklist:Consent to jurisdiction").collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].severity, Severity::Warning);
    assert!(skipped[0].message.contains(NO_VERDICT_NOTE));
    Ok(())
}
