#![allow(dead_code)]

use draftguard_engine::agents::cli_client::mocks::MockCliClient;
use draftguard_engine::agents::{DraftingAgent, ReviewAgent};
use draftguard_engine::facts::keys;
use draftguard_engine::{
    ChecklistRegistry, DealState, DocumentType, FactContext, FactContextBuilder, PipelineConfig,
    PipelineController, ProgramCode,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub type MockController = PipelineController<DraftingAgent<MockCliClient>, ReviewAgent<MockCliClient>>;

/// One passing verdict per checklist item, in registry order.
pub fn passing_verdicts(document_type: DocumentType, program: Option<&ProgramCode>) -> Vec<Value> {
    ChecklistRegistry::builtin()
        .entry(document_type, program)
        .items()
        .into_iter()
        .map(|item| json!({ "item": item.text, "passed": true, "note": "Present" }))
        .collect()
}

/// A review with no findings that passes every checklist item.
pub fn passing_review(document_type: DocumentType) -> String {
    json!({
        "findings": [],
        "correctedFields": {},
        "verdicts": passing_verdicts(document_type, None)
    })
    .to_string()
}

pub fn deal() -> DealState {
    DealState::from_json(
        r#"{
            "deal_id": "D-100",
            "borrower": { "name": "Acme Holdings LLC", "entity_type": "limited liability company" },
            "lender": { "name": "First Harbor Bank" },
            "guarantor": { "name": "Dana Whitfield" },
            "property": { "address": "12 Harbor Way, Oakland", "county": "Alameda", "state": "California" },
            "loan": {
                "principal": 500000.0,
                "interest_rate": 6.25,
                "origination_date": "2026-03-01",
                "maturity_date": "2031-03-01",
                "term_months": 60,
                "governing_state": "California"
            }
        }"#,
    )
    .unwrap()
}

pub fn facts(document_type: DocumentType) -> FactContext {
    FactContextBuilder::build(&deal(), document_type)
}

pub fn fact<'a>(facts: &'a FactContext, key: &str) -> &'a str {
    facts.resolved(key).unwrap()
}

pub fn controller(
    drafter: &MockCliClient,
    reviewer: &MockCliClient,
    config: PipelineConfig,
) -> MockController {
    PipelineController::new(
        DraftingAgent::new(drafter.clone()),
        ReviewAgent::new(reviewer.clone()),
        Arc::new(ChecklistRegistry::builtin()),
        config,
    )
}

/// A promissory note that passes every deterministic check.
pub fn note_json(facts: &FactContext, default_provisions: &str) -> String {
    json!({
        "promiseToPay": format!(
            "For value received, {} promises to pay to the order of {} the principal sum of {} with interest at {}.",
            fact(facts, keys::BORROWER_NAME),
            fact(facts, keys::LENDER_NAME),
            fact(facts, keys::PRINCIPAL_AMOUNT),
            fact(facts, keys::INTEREST_RATE),
        ),
        "interestProvisions": "Interest accrues on the unpaid balance on an actual/360 basis.",
        "paymentTerms": format!(
            "Monthly installments are due and all unpaid sums are payable on {}.",
            fact(facts, keys::MATURITY_DATE)
        ),
        "prepaymentProvisions": "Borrower may prepay this Note in whole or in part without premium.",
        "defaultProvisions": default_provisions,
        "eventsOfDefault": ["Failure to pay any installment when due.", "Insolvency of Borrower."],
        "waivers": "Borrower waives presentment, demand and notice of dishonor.",
        "governingLaw": format!(
            "This Note is a negotiable instrument under UCC 3-104 governed by the laws of {}.",
            fact(facts, keys::GOVERNING_STATE)
        )
    })
    .to_string()
}

pub const GUARANTY_SCOPE: &str =
    "Guarantor absolutely and unconditionally guarantees payment of the obligations when due.";
pub const GUARANTY_WAIVERS: &str =
    "Guarantor waives notice of acceptance, presentment and every suretyship defense.";

pub fn guaranty_json(facts: &FactContext) -> String {
    json!({
        "recitals": format!(
            "{} guarantees the loan made by {} to {} in the principal amount of {}.",
            fact(facts, keys::GUARANTOR_NAME),
            fact(facts, keys::LENDER_NAME),
            fact(facts, keys::BORROWER_NAME),
            fact(facts, keys::PRINCIPAL_AMOUNT),
        ),
        "guarantyScope": GUARANTY_SCOPE,
        "waiverOfDefenses": GUARANTY_WAIVERS,
        "subordination": "All claims of Guarantor against Borrower are subordinate to the guaranteed obligations.",
        "guarantorCovenants": ["Deliver annual personal financial statements."],
        "governingLaw": format!(
            "This Guaranty is governed by the laws of {}. Lender complies with Regulation B.",
            fact(facts, keys::GOVERNING_STATE)
        )
    })
    .to_string()
}
