//! Structural output contract for extraction tasks.
//!
//! A [`Schema`] describes the fields a merged answer must carry. It is a
//! runtime value, not a derived type, because tasks arrive with their
//! schema at run time. Validation collects every issue it finds so the
//! caller sees the full shape mismatch at once.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{InvalidInput, ValidationError};

/// Expected JSON type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Any JSON value is accepted
    Any,
}

impl FieldKind {
    /// Check whether a JSON value matches this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::Any => true,
        }
    }

    /// Name used in validation messages and prompt instructions.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
            FieldKind::Any => "any",
        }
    }
}

/// Specification of one schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Expected JSON type
    pub kind: FieldKind,

    /// Whether the field must be present
    pub required: bool,
}

/// A structural contract for the merged answer.
///
/// Field order is preserved so prompt instructions are stable across
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Fields by name, in declaration order
    #[serde(default)]
    pub fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields
            .insert(name.into(), FieldSpec { kind, required: true });
        self
    }

    /// Add an optional field.
    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields
            .insert(name.into(), FieldSpec { kind, required: false });
        self
    }

    /// Check the schema itself is usable (non-empty field names).
    pub fn check_well_formed(&self) -> Result<(), InvalidInput> {
        if self.fields.keys().any(|name| name.trim().is_empty()) {
            return Err(InvalidInput::MalformedSchema {
                reason: "empty field name".to_string(),
            });
        }
        Ok(())
    }

    /// Validate a payload against this contract.
    ///
    /// Collects all issues: the payload must be a JSON object, required
    /// fields must be present and non-null, and present fields must
    /// match their declared kind. Fields not named by the schema are
    /// allowed through.
    pub fn validate(&self, payload: &Value) -> Result<(), ValidationError> {
        let Some(object) = payload.as_object() else {
            return Err(ValidationError::new(vec![format!(
                "expected a JSON object, got {}",
                json_type_name(payload)
            )]));
        };

        let mut issues = Vec::new();
        for (name, spec) in &self.fields {
            match object.get(name) {
                None | Some(Value::Null) if spec.required => {
                    issues.push(format!("missing required field '{}'", name));
                }
                Some(value) if !value.is_null() && !spec.kind.matches(value) => {
                    issues.push(format!(
                        "field '{}' expected {}, got {}",
                        name,
                        spec.kind.name(),
                        json_type_name(value)
                    ));
                }
                _ => {}
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Render output instructions for the synthesis prompt.
    pub fn format_instructions(&self) -> String {
        if self.fields.is_empty() {
            return "Return a valid JSON object.".to_string();
        }

        let lines: Vec<String> = self
            .fields
            .iter()
            .map(|(name, spec)| {
                format!(
                    "- \"{}\" ({}{})",
                    name,
                    spec.kind.name(),
                    if spec.required { ", required" } else { ", optional" }
                )
            })
            .collect();

        format!(
            "Return a JSON object with these fields:\n{}",
            lines.join("\n")
        )
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
