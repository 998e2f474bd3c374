//! Declarative schema descriptions.
//!
//! A [`Schema`] is a closed, tagged description of a data shape. The same value drives
//! request validation (see [`crate::validator`]) and OpenAPI rendering (see
//! [`crate::schema_generator`]). Object-shaped schemas can be merged field by field,
//! which is what the response merge engine relies on.
//!
//! # Example
//!
//! ```
//! use openapi_route_map::schema::{Property, Schema};
//!
//! let who = Schema::string()
//!     .with_pattern("^[a-zA-Z]+$", "Who must be a string with only letters")
//!     .unwrap()
//!     .with_id("Who");
//! let payload = Schema::object([Property::required("who", who)]);
//! assert!(payload.as_object_shape().is_some());
//! ```

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;

/// A schema description: the shape plus documentation metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// The shape this schema accepts
    pub kind: SchemaKind,
    /// Documentation metadata (component id, description, examples, format)
    pub meta: SchemaMeta,
}

/// Metadata attached to a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMeta {
    /// Component name; named schemas are emitted once under `components/schemas`
    pub id: Option<String>,
    /// Human readable description
    pub description: Option<String>,
    /// Example values
    pub examples: Vec<Value>,
    /// Format hint (e.g. "int64" or a custom format such as "prefixid")
    pub format: Option<String>,
}

/// The closed set of schema kinds
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// Accepts anything; as a payload it means "no request body"
    Any,
    /// No value at all; as a response it means "no body"
    Void,
    /// An object with named properties
    Object(ObjectSchema),
    /// Accepts a value matching any member
    Union(Vec<Schema>),
    /// Accepts exactly one value
    Literal(Value),
    /// A homogeneous array
    Array(Box<Schema>),
    /// A primitive value
    Scalar(ScalarSchema),
    /// An opaque string without structural constraints
    Opaque,
    /// A named schema declared elsewhere
    Reference(String),
}

/// Object shape: ordered properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: Vec<Property>,
}

/// A single object property
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub schema: Schema,
    /// Whether the property may be absent
    pub optional: bool,
}

/// Primitive schemas
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarSchema {
    String(StringRules),
    Integer,
    Number,
    Boolean,
}

/// Constraints on string values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    pub pattern: Option<Pattern>,
}

/// A compiled regular expression with an optional custom failure message
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    message: Option<String>,
}

impl Pattern {
    /// Compile a pattern, failing on invalid regular expressions.
    pub fn new(pattern: &str, message: Option<String>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            Error::Compilation(format!("Invalid pattern '{}': {}", pattern, e))
        })?;
        Ok(Self { regex, message })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.message == other.message
    }
}

impl Property {
    /// A property that must be present
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: false,
        }
    }

    /// A property that may be absent
    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: true,
        }
    }
}

impl ObjectSchema {
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Field union of `self` and `other`; on a name conflict the property from `other`
    /// replaces the one from `self` in place, new properties are appended.
    pub fn merge(&self, other: &ObjectSchema) -> ObjectSchema {
        let mut properties = self.properties.clone();
        for incoming in &other.properties {
            match properties.iter_mut().find(|p| p.name == incoming.name) {
                Some(existing) => *existing = incoming.clone(),
                None => properties.push(incoming.clone()),
            }
        }
        ObjectSchema { properties }
    }
}

impl Schema {
    fn from_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            meta: SchemaMeta::default(),
        }
    }

    pub fn any() -> Self {
        Self::from_kind(SchemaKind::Any)
    }

    pub fn void() -> Self {
        Self::from_kind(SchemaKind::Void)
    }

    pub fn string() -> Self {
        Self::from_kind(SchemaKind::Scalar(ScalarSchema::String(StringRules::default())))
    }

    pub fn integer() -> Self {
        Self::from_kind(SchemaKind::Scalar(ScalarSchema::Integer))
    }

    pub fn number() -> Self {
        Self::from_kind(SchemaKind::Scalar(ScalarSchema::Number))
    }

    pub fn boolean() -> Self {
        Self::from_kind(SchemaKind::Scalar(ScalarSchema::Boolean))
    }

    /// Any string, used for raw response bodies
    pub fn opaque_string() -> Self {
        Self::from_kind(SchemaKind::Opaque)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::from_kind(SchemaKind::Literal(value.into()))
    }

    pub fn array(items: Schema) -> Self {
        Self::from_kind(SchemaKind::Array(Box::new(items)))
    }

    pub fn union(members: impl IntoIterator<Item = Schema>) -> Self {
        Self::from_kind(SchemaKind::Union(members.into_iter().collect()))
    }

    pub fn object(properties: impl IntoIterator<Item = Property>) -> Self {
        Self::from_kind(SchemaKind::Object(ObjectSchema {
            properties: properties.into_iter().collect(),
        }))
    }

    /// The empty object, default for path and query parameters
    pub fn empty_object() -> Self {
        Self::object([])
    }

    /// Reference to a named schema registered elsewhere
    pub fn reference(name: impl Into<String>) -> Self {
        Self::from_kind(SchemaKind::Reference(name.into()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.meta.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn with_examples(mut self, examples: impl IntoIterator<Item = Value>) -> Self {
        self.meta.examples = examples.into_iter().collect();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.meta.format = Some(format.into());
        self
    }

    /// Constrain a string schema with a regular expression.
    pub fn with_pattern(mut self, pattern: &str, message: impl Into<String>) -> Result<Self> {
        match &mut self.kind {
            SchemaKind::Scalar(ScalarSchema::String(rules)) => {
                rules.pattern = Some(Pattern::new(pattern, Some(message.into()))?);
                Ok(self)
            }
            other => Err(Error::Compilation(format!(
                "Pattern '{}' applied to a non-string schema ({})",
                pattern,
                kind_name(other)
            ))),
        }
    }

    /// Copy of an object schema with `properties` added or overriding existing ones.
    ///
    /// The result is a new anonymous schema: the component id is not carried over.
    pub fn extend(&self, properties: impl IntoIterator<Item = Property>) -> Result<Schema> {
        let shape = self.as_object_shape().ok_or_else(|| {
            Error::Compilation(format!(
                "Cannot extend a non-object schema ({})",
                kind_name(&self.kind)
            ))
        })?;
        let addition = ObjectSchema {
            properties: properties.into_iter().collect(),
        };
        let mut meta = self.meta.clone();
        meta.id = None;
        Ok(Schema {
            kind: SchemaKind::Object(shape.merge(&addition)),
            meta,
        })
    }

    /// The object shape of this schema, if it has one.
    pub fn as_object_shape(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self.kind, SchemaKind::Any)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, SchemaKind::Void)
    }

    pub fn id(&self) -> Option<&str> {
        self.meta.id.as_deref()
    }

    pub fn kind_name(&self) -> &'static str {
        kind_name(&self.kind)
    }
}

/// Merge two schemas for the same content type.
///
/// Object shapes are merged field by field with `incoming` winning on conflicts; the
/// merged schema keeps the incoming metadata minus the component id. Any other
/// combination returns `incoming` unchanged.
pub fn merge_schemas(existing: &Schema, incoming: &Schema) -> Schema {
    match (existing.as_object_shape(), incoming.as_object_shape()) {
        (Some(left), Some(right)) => {
            let mut meta = incoming.meta.clone();
            meta.id = None;
            Schema {
                kind: SchemaKind::Object(left.merge(right)),
                meta,
            }
        }
        _ => incoming.clone(),
    }
}

fn kind_name(kind: &SchemaKind) -> &'static str {
    match kind {
        SchemaKind::Any => "any",
        SchemaKind::Void => "void",
        SchemaKind::Object(_) => "object",
        SchemaKind::Union(_) => "union",
        SchemaKind::Literal(_) => "literal",
        SchemaKind::Array(_) => "array",
        SchemaKind::Scalar(ScalarSchema::String(_)) => "string",
        SchemaKind::Scalar(ScalarSchema::Integer) => "integer",
        SchemaKind::Scalar(ScalarSchema::Number) => "number",
        SchemaKind::Scalar(ScalarSchema::Boolean) => "boolean",
        SchemaKind::Opaque => "opaque",
        SchemaKind::Reference(_) => "reference",
    }
}
