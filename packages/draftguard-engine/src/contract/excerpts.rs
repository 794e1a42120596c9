//! Short statutory and regulatory excerpts quoted into drafting contracts.
//! Keyed by the exact reference string the checklist registry declares.

const EXCERPTS: &[(&str, &str)] = &[
    (
        "UCC 3-104",
        "A negotiable instrument is an unconditional promise or order to pay a fixed amount of \
         money, with or without interest, payable to bearer or to order, payable on demand or at \
         a definite time, that does not state any other undertaking or instruction by the person \
         promising payment, subject to stated exceptions for collateral, confession of judgment \
         and waivers.",
    ),
    (
        "12 U.S.C. 1701j-3",
        "A lender may, subject to the exceptions in subsection (d), enter into or enforce a \
         contract containing a due-on-sale clause with respect to a real property loan. \
         Exercise of the clause is governed exclusively by the terms of the loan contract.",
    ),
    (
        "Regulation B",
        "A creditor shall not require the signature of an applicant's spouse or other person, \
         other than a joint applicant, on any credit instrument if the applicant qualifies under \
         the creditor's standards of creditworthiness for the amount and terms requested \
         (12 CFR 1002.7(d)).",
    ),
    (
        "USA PATRIOT Act",
        "Federal law requires financial institutions to obtain, verify and record information \
         that identifies each person who opens an account, including the name, address and \
         other information that will allow the institution to identify the borrower.",
    ),
    (
        "Equal Credit Opportunity Act",
        "It is unlawful for any creditor to discriminate against any applicant, with respect to \
         any aspect of a credit transaction, on the basis of race, color, religion, national \
         origin, sex or marital status, or age (provided the applicant has the capacity to \
         contract).",
    ),
    (
        "13 CFR 120",
        "Loans made under section 7(a) must be documented on SBA-approved forms. The Note and \
         any Guarantee must incorporate SBA Form 147 and SBA Form 148 terms, and the lender must \
         close the loan in accordance with the SBA Authorization.",
    ),
    (
        "7 CFR 4279",
        "The lender is responsible for servicing the entire loan and must close the loan in \
         accordance with the Conditional Commitment. Personal and corporate guarantees are \
         required to the extent the Agency determines them necessary.",
    ),
    (
        "21 CFR 312",
        "A sponsor shall submit an IND to FDA if the sponsor intends to conduct a clinical \
         investigation with an investigational new drug. The IND shall contain a cover sheet \
         (Form FDA 1571), a table of contents, an introductory statement and general \
         investigational plan, the investigator's brochure, protocols, chemistry, manufacturing \
         and control information, pharmacology and toxicology information, and previous human \
         experience with the drug (21 CFR 312.23).",
    ),
    (
        "Form 1571",
        "The cover sheet commits the sponsor not to begin clinical investigations until 30 days \
         after FDA's receipt of the IND unless notified otherwise, to ensure that an Institutional \
         Review Board will be responsible for initial and continuing review, and to conduct the \
         investigation in accordance with all applicable regulatory requirements.",
    ),
    (
        "Section 506(b)",
        "The sponsor of a drug may request designation of the drug as a fast track product if it \
         is intended, alone or in combination with other drugs, for the treatment of a serious or \
         life-threatening disease or condition and demonstrates the potential to address unmet \
         medical needs.",
    ),
    (
        "21 CFR 50.25",
        "In seeking informed consent, each subject shall be provided a statement that the study \
         involves research, a description of reasonably foreseeable risks, a description of \
         benefits, a disclosure of appropriate alternatives, a statement describing the extent \
         of confidentiality and noting the possibility that FDA may inspect the records, an \
         explanation of compensation for injury, contacts for questions, and a statement that \
         participation is voluntary.",
    ),
];

pub fn excerpt(reference: &str) -> Option<&'static str> {
    EXCERPTS
        .iter()
        .find(|(name, _)| *name == reference)
        .map(|(_, text)| *text)
}
