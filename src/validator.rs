//! Value validation against [`Schema`] descriptions.
//!
//! Validation walks the whole value and reports every problem it finds as an
//! [`Issue`], each carrying the path of the offending field. The issue shape matches
//! the `{code, message, path}` body a transport layer returns for a 400 response.

use crate::schema::{ObjectSchema, ScalarSchema, Schema, SchemaKind};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One segment of the path to a field: an object key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Machine readable issue code (e.g. "invalid_type")
    pub code: String,
    /// Human readable message
    pub message: String,
    /// Path to the offending field, outermost first
    pub path: Vec<PathSegment>,
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl Issue {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        path: Vec<PathSegment>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path,
        }
    }

    /// The path rendered with dots, e.g. `payload.who`
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(f, "{}: {} ({})", self.dotted_path(), self.message, self.code)
        }
    }
}

/// Validate `value` against `schema` without a component table.
///
/// References are accepted as-is when no table is available.
pub fn validate(schema: &Schema, value: &Value) -> Result<(), Vec<Issue>> {
    Validator::new().validate(schema, value)
}

/// Schema validator, optionally resolving named references through a component table
#[derive(Default)]
pub struct Validator<'a> {
    components: Option<&'a IndexMap<String, Schema>>,
}

impl<'a> Validator<'a> {
    pub fn new() -> Self {
        Self { components: None }
    }

    pub fn with_components(components: &'a IndexMap<String, Schema>) -> Self {
        Self {
            components: Some(components),
        }
    }

    /// Validate a value, collecting every issue found.
    pub fn validate(&self, schema: &Schema, value: &Value) -> Result<(), Vec<Issue>> {
        let mut issues = Vec::new();
        let mut path = Vec::new();
        self.check(schema, value, &mut path, &mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            debug!("Validation produced {} issue(s)", issues.len());
            Err(issues)
        }
    }

    fn check(
        &self,
        schema: &Schema,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
    ) {
        match &schema.kind {
            SchemaKind::Any => {}
            SchemaKind::Void => {
                if !value.is_null() {
                    issues.push(type_issue("void", value, path));
                }
            }
            SchemaKind::Object(shape) => self.check_object(shape, value, path, issues),
            SchemaKind::Union(members) => {
                let matched = members.iter().any(|member| {
                    let mut scratch = Vec::new();
                    self.check(member, value, &mut path.clone(), &mut scratch);
                    scratch.is_empty()
                });
                if !matched {
                    issues.push(Issue::new("invalid_union", "Invalid input", path.clone()));
                }
            }
            SchemaKind::Literal(expected) => {
                if value != expected {
                    issues.push(Issue::new(
                        "invalid_literal",
                        format!("Invalid literal value, expected {}", expected),
                        path.clone(),
                    ));
                }
            }
            SchemaKind::Array(items) => match value.as_array() {
                Some(elements) => {
                    for (index, element) in elements.iter().enumerate() {
                        path.push(PathSegment::Index(index));
                        self.check(items, element, path, issues);
                        path.pop();
                    }
                }
                None => issues.push(type_issue("array", value, path)),
            },
            SchemaKind::Scalar(scalar) => check_scalar(scalar, value, path, issues),
            SchemaKind::Opaque => {
                if !value.is_string() {
                    issues.push(type_issue("string", value, path));
                }
            }
            SchemaKind::Reference(name) => match self.components {
                Some(components) => match components.get(name) {
                    Some(target) => self.check(target, value, path, issues),
                    None => issues.push(Issue::new(
                        "unrecognized_reference",
                        format!("Unknown schema reference '{}'", name),
                        path.clone(),
                    )),
                },
                None => {}
            },
        }
    }

    fn check_object(
        &self,
        shape: &ObjectSchema,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
    ) {
        let Some(fields) = value.as_object() else {
            issues.push(type_issue("object", value, path));
            return;
        };

        // Unknown fields are tolerated and ignored.
        for property in &shape.properties {
            path.push(PathSegment::Key(property.name.clone()));
            match fields.get(&property.name) {
                Some(field) => self.check(&property.schema, field, path, issues),
                None if property.optional => {}
                None => issues.push(Issue::new(
                    "invalid_type",
                    format!(
                        "Required: expected {}, received undefined",
                        property.schema.kind_name()
                    ),
                    path.clone(),
                )),
            }
            path.pop();
        }
    }
}

fn check_scalar(
    scalar: &ScalarSchema,
    value: &Value,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) {
    match scalar {
        ScalarSchema::String(rules) => {
            let Some(text) = value.as_str() else {
                issues.push(type_issue("string", value, path));
                return;
            };
            if let Some(pattern) = &rules.pattern {
                if !pattern.is_match(text) {
                    let message = pattern
                        .message()
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            format!("Invalid string: must match pattern /{}/", pattern.as_str())
                        });
                    issues.push(Issue::new("invalid_string", message, path.to_vec()));
                }
            }
        }
        ScalarSchema::Integer => {
            let is_integer = value.is_i64()
                || value.is_u64()
                || value.as_f64().map(|n| n.fract() == 0.0).unwrap_or(false);
            if !is_integer {
                issues.push(type_issue("integer", value, path));
            }
        }
        ScalarSchema::Number => {
            if !value.is_number() {
                issues.push(type_issue("number", value, path));
            }
        }
        ScalarSchema::Boolean => {
            if !value.is_boolean() {
                issues.push(type_issue("boolean", value, path));
            }
        }
    }
}

fn type_issue(expected: &str, value: &Value, path: &[PathSegment]) -> Issue {
    Issue::new(
        "invalid_type",
        format!("Expected {}, received {}", expected, json_type(value)),
        path.to_vec(),
    )
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
