mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{DocumentType, ProgramCode, Severity};

/// A fact that must be byte-identical across sibling documents of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossDocumentRule {
    pub fact: String,
    pub description: String,
}

/// Compliance rules for one document type. Overlays are entries too; merging
/// only ever appends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    #[serde(default)]
    pub required_provisions: Vec<String>,
    #[serde(default)]
    pub standard_provisions: Vec<String>,
    #[serde(default)]
    pub regulatory_references: Vec<String>,
    #[serde(default)]
    pub cross_document_rules: Vec<CrossDocumentRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistCategory {
    Required,
    Standard,
    Regulatory,
}

impl ChecklistCategory {
    /// Severity of a failed item in this category.
    pub fn severity(&self) -> Severity {
        match self {
            ChecklistCategory::Required => Severity::Critical,
            ChecklistCategory::Standard | ChecklistCategory::Regulatory => Severity::Warning,
        }
    }
}

/// One reviewable line of a checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub category: ChecklistCategory,
    pub text: String,
}

fn extend_unique<T: PartialEq + Clone>(base: &mut Vec<T>, extra: &[T]) {
    for item in extra {
        if !base.contains(item) {
            base.push(item.clone());
        }
    }
}

impl ChecklistEntry {
    /// Base items first, then overlay items not already present.
    pub fn merged_with(&self, overlay: &ChecklistEntry) -> ChecklistEntry {
        let mut merged = self.clone();
        merged.extend(overlay);
        merged
    }

    fn extend(&mut self, overlay: &ChecklistEntry) {
        extend_unique(&mut self.required_provisions, &overlay.required_provisions);
        extend_unique(&mut self.standard_provisions, &overlay.standard_provisions);
        extend_unique(&mut self.regulatory_references, &overlay.regulatory_references);
        extend_unique(&mut self.cross_document_rules, &overlay.cross_document_rules);
    }

    /// Items the reviewer must return a verdict for, in registry order.
    /// Cross-document rules are evaluated per package, not per document.
    pub fn items(&self) -> Vec<ChecklistItem> {
        let tagged = |category: ChecklistCategory, list: &[String]| {
            list.iter()
                .map(|text| ChecklistItem {
                    category,
                    text: text.clone(),
                })
                .collect::<Vec<_>>()
        };
        let mut items = tagged(ChecklistCategory::Required, &self.required_provisions);
        items.extend(tagged(ChecklistCategory::Standard, &self.standard_provisions));
        items.extend(tagged(ChecklistCategory::Regulatory, &self.regulatory_references));
        items
    }

    pub fn is_empty(&self) -> bool {
        self.required_provisions.is_empty()
            && self.standard_provisions.is_empty()
            && self.regulatory_references.is_empty()
            && self.cross_document_rules.is_empty()
    }
}

/// Read-only lookup of base entries and program overlays.
///
/// Built once at startup and shared by reference (`Arc`) with every
/// controller; nothing mutates it after construction.
#[derive(Debug, Clone, Default)]
pub struct ChecklistRegistry {
    base: HashMap<DocumentType, ChecklistEntry>,
    overlays: HashMap<(ProgramCode, DocumentType), ChecklistEntry>,
}

impl ChecklistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in loan and clinical tables.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (document_type, entry) in builtin::base_entries() {
            registry.insert_base(document_type, entry);
        }
        for (program, document_type, entry) in builtin::overlay_entries() {
            registry.add_overlay(program, document_type, entry);
        }
        registry
    }

    pub fn insert_base(&mut self, document_type: DocumentType, entry: ChecklistEntry) {
        self.base.insert(document_type, entry);
    }

    /// Adds overlay items for a program; repeated calls accumulate.
    pub fn add_overlay(
        &mut self,
        program: ProgramCode,
        document_type: DocumentType,
        entry: ChecklistEntry,
    ) {
        self.overlays
            .entry((program, document_type))
            .or_default()
            .extend(&entry);
    }

    pub fn base(&self, document_type: DocumentType) -> ChecklistEntry {
        self.base.get(&document_type).cloned().unwrap_or_default()
    }

    /// Base entry merged with the program overlay, if any.
    pub fn entry(&self, document_type: DocumentType, program: Option<&ProgramCode>) -> ChecklistEntry {
        let base = self.base(document_type);
        match program.and_then(|p| self.overlays.get(&(p.clone(), document_type))) {
            Some(overlay) => base.merged_with(overlay),
            None => base,
        }
    }

    pub fn programs(&self) -> Vec<ProgramCode> {
        let mut programs: Vec<ProgramCode> =
            self.overlays.keys().map(|(p, _)| p.clone()).collect();
        programs.sort();
        programs.dedup();
        programs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_overlay_extends_without_duplicates() {
        let base = ChecklistEntry {
            required_provisions: strings(&["A", "B"]),
            regulatory_references: strings(&["21 CFR 312"]),
            ..Default::default()
        };
        let overlay = ChecklistEntry {
            required_provisions: strings(&["B", "C", "C"]),
            regulatory_references: strings(&["21 CFR 312", "Form 1571"]),
            ..Default::default()
        };
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.required_provisions, strings(&["A", "B", "C"]));
        assert_eq!(merged.regulatory_references, strings(&["21 CFR 312", "Form 1571"]));
        assert_eq!(merged.merged_with(&overlay), merged);
    }

    #[test]
    fn test_overlay_never_removes_base_items() {
        let registry = ChecklistRegistry::builtin();
        let program = ProgramCode::from("sba_7a");
        for doc_type in DocumentType::ALL {
            let base = registry.base(doc_type);
            let merged = registry.entry(doc_type, Some(&program));
            assert_eq!(
                &merged.required_provisions[..base.required_provisions.len()],
                &base.required_provisions[..]
            );
            assert!(merged.items().len() >= base.items().len());
        }
    }

    #[test]
    fn test_unknown_program_falls_back_to_base() {
        let registry = ChecklistRegistry::builtin();
        let program = ProgramCode::from("no_such_program");
        assert_eq!(
            registry.entry(DocumentType::Guaranty, Some(&program)),
            registry.base(DocumentType::Guaranty)
        );
    }

    #[test]
    fn test_items_are_ordered_by_category() {
        let registry = ChecklistRegistry::builtin();
        let entry = registry.base(DocumentType::IndApplication);
        let items = entry.items();
        assert_eq!(
            items.len(),
            entry.required_provisions.len()
                + entry.standard_provisions.len()
                + entry.regulatory_references.len()
        );
        assert_eq!(items[0].category, ChecklistCategory::Required);
        assert_eq!(items.last().map(|i| i.category), Some(ChecklistCategory::Regulatory));
    }

    #[test]
    fn test_ind_application_references() {
        let registry = ChecklistRegistry::builtin();
        let entry = registry.base(DocumentType::IndApplication);
        assert_eq!(entry.regulatory_references, strings(&["21 CFR 312", "Form 1571"]));
    }

    #[test]
    fn test_every_document_type_has_a_base_entry() {
        let registry = ChecklistRegistry::builtin();
        for doc_type in DocumentType::ALL {
            let entry = registry.base(doc_type);
            assert!(!entry.required_provisions.is_empty(), "{}", doc_type);
            for guaranteed in catalog::profile(doc_type).template_guaranteed {
                assert!(
                    entry.items().iter().any(|i| i.text == *guaranteed),
                    "{} lists template item {} missing from its checklist",
                    doc_type,
                    guaranteed
                );
            }
        }
    }

    #[test]
    fn test_repeated_overlays_accumulate() {
        let mut registry = ChecklistRegistry::new();
        let program = ProgramCode::from("custom");
        registry.add_overlay(
            program.clone(),
            DocumentType::Guaranty,
            ChecklistEntry {
                standard_provisions: strings(&["X"]),
                ..Default::default()
            },
        );
        registry.add_overlay(
            program.clone(),
            DocumentType::Guaranty,
            ChecklistEntry {
                standard_provisions: strings(&["X", "Y"]),
                ..Default::default()
            },
        );
        let entry = registry.entry(DocumentType::Guaranty, Some(&program));
        assert_eq!(entry.standard_provisions, strings(&["X", "Y"]));
        assert_eq!(registry.programs(), vec![program]);
    }
}
