use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::catalog::{self, DocumentProfile, FieldKind};
use crate::domain::DocumentType;
use crate::error::{CollaboratorError, PipelineError};
use crate::facts::{FactContext, keys};

/// One narrative field: a paragraph, an ordered list of items, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProseValue {
    Text(String),
    List(Vec<String>),
    Missing,
}

impl ProseValue {
    pub fn text(value: impl Into<String>) -> Self {
        ProseValue::Text(value.into())
    }

    pub fn list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        ProseValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Empty string, empty list, a list of blank items, and null are all empty.
    pub fn is_empty(&self) -> bool {
        match self {
            ProseValue::Text(s) => s.trim().is_empty(),
            ProseValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
            ProseValue::Missing => true,
        }
    }

    /// Flattened text; list items are joined by newlines.
    pub fn as_text(&self) -> String {
        match self {
            ProseValue::Text(s) => s.clone(),
            ProseValue::List(items) => items.join("\n"),
            ProseValue::Missing => String::new(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        match self {
            ProseValue::Text(s) => s.contains(token),
            ProseValue::List(items) => items.iter().any(|i| i.contains(token)),
            ProseValue::Missing => false,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(ProseValue::Missing),
            Value::String(s) => Some(ProseValue::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|i| i.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(ProseValue::List),
            _ => None,
        }
    }
}

/// Narrative fields for one document. The key set is fixed by the document
/// profile when the bundle is created; only values ever change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProseBundle {
    document_type: DocumentType,
    fields: BTreeMap<String, ProseValue>,
}

impl ProseBundle {
    /// Every schema key present, every value missing.
    pub fn empty(document_type: DocumentType) -> Self {
        let fields = catalog::profile(document_type)
            .field_keys()
            .map(|k| (k.to_string(), ProseValue::Missing))
            .collect();
        Self {
            document_type,
            fields,
        }
    }

    /// Reads a drafter response object. Keys outside the schema are dropped,
    /// absent keys become [`ProseValue::Missing`].
    pub fn from_json(document_type: DocumentType, value: &Value) -> Result<Self, CollaboratorError> {
        let object = value
            .as_object()
            .ok_or_else(|| CollaboratorError::malformed("drafter", "response is not a JSON object"))?;

        let mut bundle = Self::empty(document_type);
        for (key, slot) in bundle.fields.iter_mut() {
            if let Some(raw) = object.get(key) {
                *slot = ProseValue::from_json(raw).ok_or_else(|| {
                    CollaboratorError::malformed(
                        "drafter",
                        format!("field {} must be a string or a list of strings", key),
                    )
                })?;
            }
        }
        Ok(bundle)
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn get(&self, key: &str) -> Option<&ProseValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProseValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replaces the value of an existing field.
    pub fn set(&mut self, key: &str, value: ProseValue) -> Result<(), PipelineError> {
        match self.fields.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PipelineError::UnknownField {
                field: key.to_string(),
                document_type: self.document_type.to_string(),
            }),
        }
    }

    /// Builder form of [`ProseBundle::set`].
    pub fn with(mut self, key: &str, value: ProseValue) -> Result<Self, PipelineError> {
        self.set(key, value)?;
        Ok(self)
    }

    /// All field text joined by newlines, in key order.
    pub fn concatenated_text(&self) -> String {
        self.fields
            .values()
            .map(ProseValue::as_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or(Value::Null)
    }

    /// Minimal generic bundle used when the drafting collaborator cannot
    /// produce one. Names every primary party and restates every mandatory
    /// fact so the document still verifies.
    pub fn fallback(profile: &DocumentProfile, facts: &FactContext) -> Self {
        let parties: Vec<&str> = profile
            .primary_parties
            .iter()
            .filter_map(|k| facts.resolved(k))
            .collect();

        let mut anchors: Vec<&str> = Vec::new();
        let mut anchor_keys: Vec<&str> = vec![keys::PRINCIPAL_AMOUNT];
        anchor_keys.extend(profile.mandatory_facts.iter().copied());
        anchor_keys.extend(profile.tracked_numeric);
        for key in anchor_keys {
            if let Some(value) = facts.resolved(key) {
                if !anchors.contains(&value) {
                    anchors.push(value);
                }
            }
        }

        let recital = format!(
            "This {} is entered into by {}. It governs the obligations described herein, including {}.",
            profile.title,
            if parties.is_empty() {
                "the parties identified in the signature blocks".to_string()
            } else {
                parties.join(" and ")
            },
            if anchors.is_empty() {
                "the terms set out in the accompanying schedule".to_string()
            } else {
                anchors.join("; ")
            }
        );

        let mut bundle = Self::empty(profile.document_type);
        for (idx, spec) in profile.fields.iter().enumerate() {
            let sentence = if idx == 0 {
                format!("{} {}", recital, spec.purpose)
            } else {
                format!("{} ({})", spec.purpose, profile.title)
            };
            let value = match spec.kind {
                FieldKind::Text => ProseValue::Text(sentence),
                FieldKind::List => ProseValue::List(vec![sentence]),
            };
            bundle.fields.insert(spec.key.to_string(), value);
        }
        bundle
    }
}
