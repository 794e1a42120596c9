use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{self, FieldKind};
use crate::facts::FactContext;
use crate::prose::{ProseBundle, ProseValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCorrection {
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub bundle: ProseBundle,
    /// Fields whose value was replaced (or already equal to the correction).
    pub applied: Vec<String>,
    pub rejected: Vec<RejectedCorrection>,
}

/// Applies reviewer corrections back into a bundle, one whole field at a time.
#[derive(Debug, Default)]
pub struct CorrectionMerger;

impl CorrectionMerger {
    /// A correction is refused when it targets a field outside the schema,
    /// is empty, changes a text field into a list (or back), or drops a fact
    /// token the original field carried. Refused fields keep their original
    /// value.
    pub fn merge(
        bundle: &ProseBundle,
        facts: &FactContext,
        corrections: &BTreeMap<String, ProseValue>,
    ) -> MergeOutcome {
        let profile = catalog::profile(bundle.document_type());
        let tokens = facts.tokens();
        let mut merged = bundle.clone();
        let mut applied = Vec::new();
        let mut rejected = Vec::new();

        for (field, corrected) in corrections {
            let reject = |reason: String| RejectedCorrection {
                field: field.clone(),
                reason,
            };

            let (Some(spec), Some(original)) = (profile.field(field), bundle.get(field)) else {
                rejected.push(reject(format!(
                    "'{}' is not a {} field",
                    field,
                    bundle.document_type()
                )));
                continue;
            };

            if corrected.is_empty() {
                rejected.push(reject("correction is empty".to_string()));
                continue;
            }

            let kind_matches = matches!(
                (spec.kind, corrected),
                (FieldKind::Text, ProseValue::Text(_)) | (FieldKind::List, ProseValue::List(_))
            );
            if !kind_matches {
                rejected.push(reject(format!(
                    "correction changes the shape of '{}'",
                    field
                )));
                continue;
            }

            let dropped: Vec<&str> = tokens
                .iter()
                .copied()
                .filter(|t| original.contains(t) && !corrected.contains(t))
                .collect();
            if !dropped.is_empty() {
                rejected.push(reject(format!(
                    "correction drops fact token(s): {}",
                    dropped.join(", ")
                )));
                continue;
            }

            // The key exists, so `set` cannot fail here.
            if merged.set(field, corrected.clone()).is_ok() {
                applied.push(field.clone());
            }
        }

        MergeOutcome {
            bundle: merged,
            applied,
            rejected,
        }
    }
}
