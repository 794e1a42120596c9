//! Static per-document profiles: the prose schema a drafter must fill, the
//! facts its contract references, and which of those facts the verifier
//! treats as parties, tracked numerics or locked tokens.

use serde::Serialize;

use crate::domain::DocumentType;
use crate::facts::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub purpose: &'static str,
    pub constraints: &'static str,
}

const fn text(key: &'static str, purpose: &'static str, constraints: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        kind: FieldKind::Text,
        purpose,
        constraints,
    }
}

const fn list(key: &'static str, purpose: &'static str, constraints: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        kind: FieldKind::List,
        purpose,
        constraints,
    }
}

#[derive(Debug)]
pub struct DocumentProfile {
    pub document_type: DocumentType,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
    /// Every fact the contract for this document references.
    pub facts: &'static [&'static str],
    /// Facts whose formatted value must appear verbatim in accepted prose.
    pub mandatory_facts: &'static [&'static str],
    pub primary_parties: &'static [&'static str],
    pub tracked_numeric: Option<&'static str>,
    /// Checklist items the deterministic template already satisfies.
    pub template_guaranteed: &'static [&'static str],
}

impl DocumentProfile {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.key)
    }
}

static PROMISSORY_NOTE: DocumentProfile = DocumentProfile {
    document_type: DocumentType::PromissoryNote,
    title: "Promissory Note",
    fields: &[
        text(
            "promiseToPay",
            "Unconditional promise of the Borrower to pay the Lender the principal with interest.",
            "Must state the principal amount and interest rate exactly as given.",
        ),
        text(
            "interestProvisions",
            "Accrual basis, computation method and default-rate interest.",
            "Must restate the interest rate verbatim; no alternate rates.",
        ),
        text(
            "paymentTerms",
            "Payment schedule, place of payment and the maturity date.",
            "Must state the maturity date verbatim.",
        ),
        text(
            "prepaymentProvisions",
            "Right to prepay and any premium.",
            "No prepayment premium unless stated in the facts.",
        ),
        text(
            "defaultProvisions",
            "Consequences of an event of default, acceleration and collection costs.",
            "Must include an acceleration clause.",
        ),
        list(
            "eventsOfDefault",
            "Enumerated events of default.",
            "One event per item; include payment default and insolvency.",
        ),
        text(
            "waivers",
            "Waiver of presentment, demand, protest and notice of dishonor.",
            "Plain statement; no waiver of statutory consumer protections.",
        ),
        text(
            "governingLaw",
            "Choice of governing law.",
            "Name the governing state exactly as given.",
        ),
    ],
    facts: &[
        keys::BORROWER_NAME,
        keys::LENDER_NAME,
        keys::PRINCIPAL_AMOUNT,
        keys::INTEREST_RATE,
        keys::NOTE_DATE,
        keys::MATURITY_DATE,
        keys::TERM_MONTHS,
        keys::GOVERNING_STATE,
    ],
    mandatory_facts: &[keys::PRINCIPAL_AMOUNT, keys::INTEREST_RATE, keys::MATURITY_DATE],
    primary_parties: &[keys::BORROWER_NAME, keys::LENDER_NAME],
    tracked_numeric: Some(keys::INTEREST_RATE),
    template_guaranteed: &["Signature block for Borrower", "Note date and place of execution"],
};

static SECURITY_INSTRUMENT: DocumentProfile = DocumentProfile {
    document_type: DocumentType::SecurityInstrument,
    title: "Deed of Trust",
    fields: &[
        text(
            "grantingClause",
            "Grant of the property to the trustee in trust, with power of sale.",
            "Must identify the property address exactly as given.",
        ),
        text(
            "securedObligations",
            "Description of the debt secured, including the note and its principal.",
            "Must state the principal amount verbatim.",
        ),
        list(
            "borrowerCovenants",
            "Borrower covenants on taxes, maintenance, liens and use.",
            "One covenant per item.",
        ),
        text(
            "insuranceRequirements",
            "Hazard and flood insurance obligations and loss payee terms.",
            "Lender named as mortgagee and loss payee.",
        ),
        text(
            "defaultAndRemedies",
            "Acceleration, power of sale and foreclosure remedies.",
            "Remedies must follow the governing state's foreclosure procedure.",
        ),
        text(
            "governingLaw",
            "Choice of governing law for the instrument.",
            "Law of the state where the property is located.",
        ),
    ],
    facts: &[
        keys::BORROWER_NAME,
        keys::LENDER_NAME,
        keys::PRINCIPAL_AMOUNT,
        keys::PROPERTY_ADDRESS,
        keys::MATURITY_DATE,
        keys::GOVERNING_STATE,
    ],
    mandatory_facts: &[keys::PRINCIPAL_AMOUNT, keys::PROPERTY_ADDRESS],
    primary_parties: &[keys::BORROWER_NAME, keys::LENDER_NAME],
    tracked_numeric: Some(keys::PRINCIPAL_AMOUNT),
    template_guaranteed: &["Notary acknowledgment", "Legal description exhibit"],
};

static GUARANTY: DocumentProfile = DocumentProfile {
    document_type: DocumentType::Guaranty,
    title: "Guaranty of Payment",
    fields: &[
        text(
            "recitals",
            "Background: the loan, the parties and the inducement for the guaranty.",
            "Must state the principal amount verbatim.",
        ),
        text(
            "guarantyScope",
            "Absolute, unconditional guaranty of payment and performance.",
            "Guaranty of payment, not of collection; survives avoidance of payments.",
        ),
        text(
            "waiverOfDefenses",
            "Guarantor waivers of suretyship defenses.",
            "Waivers must be specific and conspicuous.",
        ),
        text(
            "subordination",
            "Subordination of guarantor claims against the borrower.",
            "Applies until the guaranteed obligations are paid in full.",
        ),
        list(
            "guarantorCovenants",
            "Reporting and financial covenants of the guarantor.",
            "One covenant per item.",
        ),
        text(
            "governingLaw",
            "Choice of law and consent to jurisdiction.",
            "Name the governing state exactly as given.",
        ),
    ],
    facts: &[
        keys::GUARANTOR_NAME,
        keys::BORROWER_NAME,
        keys::LENDER_NAME,
        keys::PRINCIPAL_AMOUNT,
        keys::NOTE_DATE,
        keys::GOVERNING_STATE,
    ],
    mandatory_facts: &[keys::PRINCIPAL_AMOUNT],
    primary_parties: &[keys::GUARANTOR_NAME, keys::BORROWER_NAME],
    tracked_numeric: Some(keys::PRINCIPAL_AMOUNT),
    template_guaranteed: &["Signature block for Guarantor"],
};

static LOAN_AGREEMENT: DocumentProfile = DocumentProfile {
    document_type: DocumentType::LoanAgreement,
    title: "Loan Agreement",
    fields: &[
        text(
            "recitals",
            "Parties and purpose of the loan.",
            "Must state the principal amount verbatim.",
        ),
        text(
            "loanTerms",
            "Amount, rate, term and maturity of the loan.",
            "Must restate principal, rate and maturity verbatim.",
        ),
        list(
            "conditionsPrecedent",
            "Conditions to closing and funding.",
            "One condition per item.",
        ),
        list(
            "representationsAndWarranties",
            "Borrower representations and warranties.",
            "One representation per item.",
        ),
        list(
            "affirmativeCovenants",
            "Ongoing borrower obligations, including financial covenants.",
            "Financial covenants must use the stated ratios exactly.",
        ),
        list(
            "negativeCovenants",
            "Restrictions on additional debt, liens and transfers.",
            "One covenant per item.",
        ),
        list(
            "eventsOfDefault",
            "Enumerated events of default.",
            "One event per item.",
        ),
        text(
            "remedies",
            "Lender remedies after an event of default.",
            "Remedies are cumulative.",
        ),
    ],
    facts: &[
        keys::BORROWER_NAME,
        keys::LENDER_NAME,
        keys::PRINCIPAL_AMOUNT,
        keys::INTEREST_RATE,
        keys::MATURITY_DATE,
        keys::TERM_MONTHS,
        keys::LTV_RATIO,
        keys::DSCR,
        keys::PROPERTY_ADDRESS,
        keys::GOVERNING_STATE,
    ],
    mandatory_facts: &[keys::PRINCIPAL_AMOUNT, keys::INTEREST_RATE],
    primary_parties: &[keys::BORROWER_NAME, keys::LENDER_NAME],
    tracked_numeric: Some(keys::DSCR),
    template_guaranteed: &["Notice addresses schedule"],
};

static COMMITMENT_LETTER: DocumentProfile = DocumentProfile {
    document_type: DocumentType::CommitmentLetter,
    title: "Loan Commitment Letter",
    fields: &[
        text(
            "opening",
            "Statement of the lender's commitment to the borrower.",
            "Must name the borrower and lender.",
        ),
        text(
            "loanSummary",
            "Summary of amount, rate and term.",
            "Must restate principal and rate verbatim.",
        ),
        list(
            "conditions",
            "Conditions the borrower must satisfy before closing.",
            "One condition per item.",
        ),
        text(
            "expiration",
            "Expiration of the commitment if not accepted or closed.",
            "State a definite expiration mechanism.",
        ),
        text(
            "acceptanceInstructions",
            "How the borrower accepts the commitment.",
            "Acceptance must be in writing.",
        ),
    ],
    facts: &[
        keys::BORROWER_NAME,
        keys::LENDER_NAME,
        keys::PRINCIPAL_AMOUNT,
        keys::INTEREST_RATE,
        keys::TERM_MONTHS,
        keys::LTV_RATIO,
        keys::DSCR,
    ],
    mandatory_facts: &[keys::PRINCIPAL_AMOUNT, keys::INTEREST_RATE],
    primary_parties: &[keys::BORROWER_NAME, keys::LENDER_NAME],
    tracked_numeric: Some(keys::PRINCIPAL_AMOUNT),
    template_guaranteed: &["Lender letterhead and date"],
};

static IND_APPLICATION: DocumentProfile = DocumentProfile {
    document_type: DocumentType::IndApplication,
    title: "Investigational New Drug Application Cover Narrative",
    fields: &[
        text(
            "coverLetterSummary",
            "Purpose of the submission and the product under investigation.",
            "Must name the investigational product and protocol number exactly.",
        ),
        text(
            "investigationalPlan",
            "Rationale, indication, study phase and planned enrollment.",
            "Must state the enrollment target verbatim.",
        ),
        text(
            "chemistryManufacturing",
            "Summary of chemistry, manufacturing and controls.",
            "No claims beyond the submitted data.",
        ),
        text(
            "pharmacologyToxicology",
            "Summary of nonclinical pharmacology and toxicology.",
            "No efficacy claims.",
        ),
        text(
            "previousHumanExperience",
            "Prior human experience with the product, if any.",
            "State explicitly when there is none.",
        ),
        list(
            "sponsorCommitments",
            "Sponsor commitments under the IND regulations.",
            "One commitment per item; include IRB review and safety reporting.",
        ),
    ],
    facts: &[
        keys::SPONSOR_NAME,
        keys::PRINCIPAL_INVESTIGATOR,
        keys::INVESTIGATIONAL_PRODUCT,
        keys::IND_NUMBER,
        keys::PROTOCOL_NUMBER,
        keys::STUDY_PHASE,
        keys::INDICATION,
        keys::ENROLLMENT_TARGET,
        keys::SUBMISSION_DATE,
    ],
    mandatory_facts: &[keys::INVESTIGATIONAL_PRODUCT, keys::PROTOCOL_NUMBER],
    primary_parties: &[keys::SPONSOR_NAME],
    tracked_numeric: Some(keys::ENROLLMENT_TARGET),
    template_guaranteed: &["Sponsor signature and date"],
};

static INFORMED_CONSENT: DocumentProfile = DocumentProfile {
    document_type: DocumentType::InformedConsent,
    title: "Informed Consent Form",
    fields: &[
        text(
            "studyPurpose",
            "Statement that the study involves research, and its purpose.",
            "Plain language at or below an eighth-grade reading level.",
        ),
        text(
            "procedures",
            "Procedures, expected duration and which procedures are experimental.",
            "Must identify experimental procedures.",
        ),
        list(
            "risks",
            "Reasonably foreseeable risks or discomforts.",
            "One risk per item.",
        ),
        text(
            "benefits",
            "Benefits to the subject or others reasonably expected.",
            "No promise of benefit.",
        ),
        text(
            "alternatives",
            "Appropriate alternative procedures or treatments.",
            "Must be stated even when the alternative is no treatment.",
        ),
        text(
            "confidentiality",
            "Extent of confidentiality of records, including FDA inspection.",
            "Must disclose possible FDA inspection of records.",
        ),
        text(
            "compensationForInjury",
            "Compensation and treatment available for research injury.",
            "No exculpatory language.",
        ),
        text(
            "voluntaryParticipation",
            "Participation is voluntary and may be discontinued without penalty.",
            "Must state no penalty or loss of benefits.",
        ),
        text(
            "contacts",
            "Whom to contact about the research and subject rights.",
            "Name the principal investigator.",
        ),
    ],
    facts: &[
        keys::SPONSOR_NAME,
        keys::PRINCIPAL_INVESTIGATOR,
        keys::INVESTIGATIONAL_PRODUCT,
        keys::PROTOCOL_NUMBER,
        keys::STUDY_PHASE,
        keys::INDICATION,
        keys::ENROLLMENT_TARGET,
    ],
    mandatory_facts: &[keys::PROTOCOL_NUMBER],
    primary_parties: &[keys::SPONSOR_NAME, keys::PRINCIPAL_INVESTIGATOR],
    tracked_numeric: Some(keys::ENROLLMENT_TARGET),
    template_guaranteed: &["Subject signature and date lines"],
};

pub fn profile(document_type: DocumentType) -> &'static DocumentProfile {
    match document_type {
        DocumentType::PromissoryNote => &PROMISSORY_NOTE,
        DocumentType::SecurityInstrument => &SECURITY_INSTRUMENT,
        DocumentType::Guaranty => &GUARANTY,
        DocumentType::LoanAgreement => &LOAN_AGREEMENT,
        DocumentType::CommitmentLetter => &COMMITMENT_LETTER,
        DocumentType::IndApplication => &IND_APPLICATION,
        DocumentType::InformedConsent => &INFORMED_CONSENT,
    }
}
