use super::{ChecklistEntry, CrossDocumentRule};
use crate::domain::{DocumentType, ProgramCode};
use crate::facts::keys;

fn entry(
    required: &[&str],
    standard: &[&str],
    regulatory: &[&str],
    cross: &[(&str, &str)],
) -> ChecklistEntry {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    ChecklistEntry {
        required_provisions: owned(required),
        standard_provisions: owned(standard),
        regulatory_references: owned(regulatory),
        cross_document_rules: cross
            .iter()
            .map(|(fact, description)| CrossDocumentRule {
                fact: fact.to_string(),
                description: description.to_string(),
            })
            .collect(),
    }
}

pub(super) fn base_entries() -> Vec<(DocumentType, ChecklistEntry)> {
    vec![
        (
            DocumentType::PromissoryNote,
            entry(
                &[
                    "Unconditional promise to pay a sum certain",
                    "Stated interest rate and accrual basis",
                    "Maturity date and payment schedule",
                    "Acceleration upon event of default",
                    "Signature block for Borrower",
                ],
                &[
                    "Prepayment terms",
                    "Late charge provision",
                    "Waiver of presentment and notice of dishonor",
                    "Governing law clause",
                    "Note date and place of execution",
                ],
                &["UCC 3-104"],
                &[
                    (keys::PRINCIPAL_AMOUNT, "Principal amount matches every loan document"),
                    (keys::INTEREST_RATE, "Interest rate matches the loan agreement"),
                    (keys::MATURITY_DATE, "Maturity date matches the security instrument"),
                ],
            ),
        ),
        (
            DocumentType::SecurityInstrument,
            entry(
                &[
                    "Granting clause with power of sale",
                    "Description of secured obligations",
                    "Identification of the encumbered property",
                    "Acceleration and foreclosure remedies",
                    "Notary acknowledgment",
                ],
                &[
                    "Hazard insurance requirement",
                    "Tax and lien covenants",
                    "Governing law of the property state",
                    "Legal description exhibit",
                ],
                &["12 U.S.C. 1701j-3"],
                &[
                    (keys::PRINCIPAL_AMOUNT, "Principal amount matches every loan document"),
                    (keys::MATURITY_DATE, "Maturity date matches the security instrument"),
                    (keys::PROPERTY_ADDRESS, "Property address matches the loan agreement"),
                ],
            ),
        ),
        (
            DocumentType::Guaranty,
            entry(
                &[
                    "Guaranty of payment and not of collection",
                    "Reinstatement of guaranty after avoidance of payments",
                    "Waiver of suretyship defenses",
                    "Signature block for Guarantor",
                ],
                &[
                    "Subordination of guarantor claims",
                    "Guarantor financial reporting covenant",
                    "Consent to jurisdiction",
                ],
                &["Regulation B"],
                &[(keys::PRINCIPAL_AMOUNT, "Principal amount matches every loan document")],
            ),
        ),
        (
            DocumentType::LoanAgreement,
            entry(
                &[
                    "Loan amount, rate and maturity",
                    "Conditions precedent to funding",
                    "Events of default",
                    "Financial covenants",
                    "Notice addresses schedule",
                ],
                &[
                    "Representations and warranties",
                    "Negative covenants",
                    "Cumulative remedies",
                    "Governing law clause",
                ],
                &["USA PATRIOT Act"],
                &[
                    (keys::PRINCIPAL_AMOUNT, "Principal amount matches every loan document"),
                    (keys::INTEREST_RATE, "Interest rate matches the loan agreement"),
                    (keys::MATURITY_DATE, "Maturity date matches the security instrument"),
                    (keys::PROPERTY_ADDRESS, "Property address matches the loan agreement"),
                ],
            ),
        ),
        (
            DocumentType::CommitmentLetter,
            entry(
                &[
                    "Commitment amount and rate",
                    "Conditions to closing",
                    "Commitment expiration",
                    "Lender letterhead and date",
                ],
                &["Written acceptance procedure", "Non-assignability of commitment"],
                &["Equal Credit Opportunity Act"],
                &[
                    (keys::PRINCIPAL_AMOUNT, "Principal amount matches every loan document"),
                    (keys::INTEREST_RATE, "Interest rate matches the loan agreement"),
                ],
            ),
        ),
        (
            DocumentType::IndApplication,
            entry(
                &[
                    "Identification of the investigational drug",
                    "Investigational plan with rationale",
                    "Chemistry, manufacturing and controls summary",
                    "Pharmacology and toxicology summary",
                    "Commitment to IRB review",
                    "Sponsor signature and date",
                ],
                &["Previous human experience", "Safety reporting commitment"],
                &["21 CFR 312", "Form 1571"],
                &[
                    (keys::PROTOCOL_NUMBER, "Protocol number matches the informed consent form"),
                    (
                        keys::INVESTIGATIONAL_PRODUCT,
                        "Investigational product name matches across the submission",
                    ),
                ],
            ),
        ),
        (
            DocumentType::InformedConsent,
            entry(
                &[
                    "Statement that the study involves research",
                    "Description of reasonably foreseeable risks",
                    "Description of expected benefits",
                    "Disclosure of alternative treatments",
                    "Confidentiality statement including FDA inspection",
                    "Compensation for injury explanation",
                    "Voluntary participation statement",
                    "Contact information for questions and subject rights",
                    "Subject signature and date lines",
                ],
                &["Anticipated number of subjects", "Consequences of withdrawal"],
                &["21 CFR 50.25"],
                &[
                    (keys::PROTOCOL_NUMBER, "Protocol number matches the informed consent form"),
                    (
                        keys::INVESTIGATIONAL_PRODUCT,
                        "Investigational product name matches across the submission",
                    ),
                ],
            ),
        ),
    ]
}

pub(super) fn overlay_entries() -> Vec<(ProgramCode, DocumentType, ChecklistEntry)> {
    let sba = ProgramCode::from("sba_7a");
    let usda = ProgramCode::from("usda_b_and_i");
    let fast_track = ProgramCode::from("fda_fast_track");

    vec![
        (
            sba.clone(),
            DocumentType::PromissoryNote,
            entry(
                &["Incorporation of SBA Form 147 terms"],
                &[],
                &["13 CFR 120"],
                &[],
            ),
        ),
        (
            sba.clone(),
            DocumentType::Guaranty,
            entry(
                &["SBA Form 148 unconditional guarantee language"],
                &[],
                &["13 CFR 120"],
                &[],
            ),
        ),
        (
            sba.clone(),
            DocumentType::LoanAgreement,
            entry(&[], &["Compliance with the SBA Authorization"], &["13 CFR 120"], &[]),
        ),
        (
            sba,
            DocumentType::CommitmentLetter,
            entry(&[], &["SBA guaranty fee disclosure"], &[], &[]),
        ),
        (
            usda.clone(),
            DocumentType::LoanAgreement,
            entry(&["Lender loan classification"], &[], &["7 CFR 4279"], &[]),
        ),
        (
            usda,
            DocumentType::Guaranty,
            entry(&[], &[], &["7 CFR 4279"], &[]),
        ),
        (
            fast_track,
            DocumentType::IndApplication,
            entry(
                &["Fast Track designation request rationale"],
                &[],
                &["21 CFR 312", "Section 506(b)"],
                &[],
            ),
        ),
    ]
}
