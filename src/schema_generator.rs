use crate::error::{Error, Result};
use crate::schema::{ScalarSchema, Schema, SchemaKind};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde_json::{json, Map, Value};

const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// Schema generator - renders schema descriptions as OpenAPI 3.1 schemas
///
/// Named schemas are emitted once into the component table and replaced by `$ref`s.
pub struct SchemaGenerator {
    /// Rendered component schemas by name
    schemas: IndexMap<String, Value>,
    /// Source description of each component, used to detect conflicting definitions
    definitions: IndexMap<String, Schema>,
    /// Every component name referenced so far
    referenced: IndexSet<String>,
}

impl SchemaGenerator {
    pub fn new() -> Self {
        debug!("Initializing SchemaGenerator");
        Self {
            schemas: IndexMap::new(),
            definitions: IndexMap::new(),
            referenced: IndexSet::new(),
        }
    }

    /// Emit a component under `name`, independently of any `id` on the schema.
    pub fn declare_component(&mut self, name: &str, schema: &Schema) -> Result<()> {
        let mut named = schema.clone();
        named.meta.id = Some(name.to_string());
        self.generate_named(name, &named)?;
        Ok(())
    }

    /// Render a schema, hoisting named parts into the component table
    pub fn generate_schema(&mut self, schema: &Schema) -> Result<Value> {
        match schema.id() {
            Some(id) => self.generate_named(id, schema),
            None => self.generate_inline(schema),
        }
    }

    fn generate_named(&mut self, id: &str, schema: &Schema) -> Result<Value> {
        if let Some(existing) = self.definitions.get(id) {
            if existing != schema {
                return Err(Error::Compilation(format!(
                    "Component '{}' is defined more than once with different schemas",
                    id
                )));
            }
            debug!("Schema for {} already exists", id);
            return Ok(reference(id));
        }

        debug!("Generating component schema for: {}", id);
        self.definitions.insert(id.to_string(), schema.clone());
        let rendered = self.generate_inline(schema)?;
        self.schemas.insert(id.to_string(), rendered);
        Ok(reference(id))
    }

    fn generate_inline(&mut self, schema: &Schema) -> Result<Value> {
        let mut rendered = match &schema.kind {
            SchemaKind::Any => json!({}),
            SchemaKind::Void => json!({ "type": "null" }),
            SchemaKind::Object(shape) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for property in &shape.properties {
                    let value = self.generate_schema(&property.schema)?;
                    properties.insert(property.name.clone(), value);
                    if !property.optional {
                        required.push(Value::String(property.name.clone()));
                    }
                }
                let mut object = Map::new();
                object.insert("type".to_string(), json!("object"));
                object.insert("properties".to_string(), Value::Object(properties));
                if !required.is_empty() {
                    object.insert("required".to_string(), Value::Array(required));
                }
                Value::Object(object)
            }
            SchemaKind::Union(members) => {
                let members = members
                    .iter()
                    .map(|member| self.generate_schema(member))
                    .collect::<Result<Vec<_>>>()?;
                json!({ "anyOf": members })
            }
            SchemaKind::Literal(value) => match literal_type(value) {
                Some(kind) => json!({ "type": kind, "const": value }),
                None => json!({ "const": value }),
            },
            SchemaKind::Array(items) => {
                let items = self.generate_schema(items)?;
                json!({ "type": "array", "items": items })
            }
            SchemaKind::Scalar(ScalarSchema::String(rules)) => match &rules.pattern {
                Some(pattern) => json!({ "type": "string", "pattern": pattern.as_str() }),
                None => json!({ "type": "string" }),
            },
            SchemaKind::Scalar(ScalarSchema::Integer) => json!({ "type": "integer" }),
            SchemaKind::Scalar(ScalarSchema::Number) => json!({ "type": "number" }),
            SchemaKind::Scalar(ScalarSchema::Boolean) => json!({ "type": "boolean" }),
            SchemaKind::Opaque => json!({ "type": "string" }),
            SchemaKind::Reference(name) => {
                self.referenced.insert(name.clone());
                // Metadata belongs to the referenced component
                return Ok(reference(name));
            }
        };

        if let Value::Object(object) = &mut rendered {
            if let Some(format) = &schema.meta.format {
                object.insert("format".to_string(), json!(format));
            }
            if let Some(description) = &schema.meta.description {
                object.insert("description".to_string(), json!(description));
            }
            if !schema.meta.examples.is_empty() {
                object.insert("examples".to_string(), json!(schema.meta.examples));
            }
        }
        Ok(rendered)
    }

    /// Get all generated schemas
    pub fn get_schemas(&self) -> &IndexMap<String, Value> {
        &self.schemas
    }

    /// Finish generation, failing if any reference names a component never defined.
    pub fn into_schemas(self) -> Result<IndexMap<String, Value>> {
        for name in &self.referenced {
            if !self.schemas.contains_key(name) {
                return Err(Error::Compilation(format!(
                    "Unresolved schema reference '{}'",
                    name
                )));
            }
        }
        Ok(self.schemas)
    }
}

impl Default for SchemaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn reference(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", COMPONENT_PREFIX, name) })
}

fn literal_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::String(_) => Some("string"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(n) if n.is_f64() => Some("number"),
        Value::Number(_) => Some("integer"),
        Value::Null => Some("null"),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Property;
    use pretty_assertions::assert_eq;

    fn who() -> Schema {
        Schema::string()
            .with_pattern("^[a-zA-Z]+$", "Who must be a string with only letters")
            .unwrap()
            .with_id("Who")
            .with_examples([json!("World")])
    }

    #[test]
    fn test_primitive_schemas() {
        let mut generator = SchemaGenerator::new();

        for (schema, expected) in [
            (Schema::string(), json!({"type": "string"})),
            (Schema::integer(), json!({"type": "integer"})),
            (Schema::number(), json!({"type": "number"})),
            (Schema::boolean(), json!({"type": "boolean"})),
            (Schema::opaque_string(), json!({"type": "string"})),
        ] {
            assert_eq!(generator.generate_schema(&schema).unwrap(), expected);
        }
        assert_eq!(generator.generate_schema(&Schema::any()).unwrap(), json!({}));
        assert!(generator.get_schemas().is_empty());
    }

    #[test]
    fn test_object_schema_with_required_fields() {
        let mut generator = SchemaGenerator::new();
        let schema = Schema::object([
            Property::optional("_id", Schema::string()),
            Property::required("count", Schema::integer()),
        ]);

        assert_eq!(
            generator.generate_schema(&schema).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "_id": {"type": "string"},
                    "count": {"type": "integer"}
                },
                "required": ["count"]
            })
        );
    }

    #[test]
    fn test_empty_object_has_no_required() {
        let mut generator = SchemaGenerator::new();
        assert_eq!(
            generator.generate_schema(&Schema::empty_object()).unwrap(),
            json!({"type": "object", "properties": {}})
        );
    }

    #[test]
    fn test_named_schema_becomes_component() {
        let mut generator = SchemaGenerator::new();
        let rendered = generator.generate_schema(&who()).unwrap();

        assert_eq!(rendered, json!({"$ref": "#/components/schemas/Who"}));
        assert_eq!(
            generator.get_schemas()["Who"],
            json!({"type": "string", "pattern": "^[a-zA-Z]+$", "examples": ["World"]})
        );
    }

    #[test]
    fn test_named_schema_emitted_once() {
        let mut generator = SchemaGenerator::new();
        let payload = Schema::object([Property::required("who", who())]).with_id("Payload");
        let response = Schema::object([
            Property::required("who", who()),
            Property::required("message", Schema::string()),
        ])
        .with_id("Response");

        generator.generate_schema(&payload).unwrap();
        generator.generate_schema(&response).unwrap();

        let names: Vec<_> = generator.get_schemas().keys().cloned().collect();
        assert_eq!(names, vec!["Who", "Payload", "Response"]);
        assert_eq!(
            generator.get_schemas()["Payload"]["properties"]["who"],
            json!({"$ref": "#/components/schemas/Who"})
        );
    }

    #[test]
    fn test_conflicting_component_definitions() {
        let mut generator = SchemaGenerator::new();
        generator.generate_schema(&Schema::string().with_id("Thing")).unwrap();

        let err = generator
            .generate_schema(&Schema::integer().with_id("Thing"))
            .unwrap_err();
        assert!(matches!(err, Error::Compilation(_)));
    }

    #[test]
    fn test_union_literal_array_and_metadata() {
        let mut generator = SchemaGenerator::new();
        let schema = Schema::array(Schema::union([Schema::string(), Schema::integer()]))
            .with_description("Path to the field");

        assert_eq!(
            generator.generate_schema(&schema).unwrap(),
            json!({
                "type": "array",
                "items": {"anyOf": [{"type": "string"}, {"type": "integer"}]},
                "description": "Path to the field"
            })
        );
        assert_eq!(
            generator.generate_schema(&Schema::literal("GET")).unwrap(),
            json!({"type": "string", "const": "GET"})
        );
        assert_eq!(
            generator
                .generate_schema(&Schema::string().with_format("prefixid"))
                .unwrap(),
            json!({"type": "string", "format": "prefixid"})
        );
    }

    #[test]
    fn test_unresolved_reference_fails_on_finish() {
        let mut generator = SchemaGenerator::new();
        let rendered = generator.generate_schema(&Schema::reference("Missing")).unwrap();
        assert_eq!(rendered, json!({"$ref": "#/components/schemas/Missing"}));

        let err = generator.into_schemas().unwrap_err();
        assert!(err.to_string().contains("Unresolved schema reference 'Missing'"));
    }

    #[test]
    fn test_reference_resolved_by_declared_component() {
        let mut generator = SchemaGenerator::new();
        generator.generate_schema(&Schema::reference("Who")).unwrap();
        generator.declare_component("Who", &Schema::string()).unwrap();

        let schemas = generator.into_schemas().unwrap();
        assert_eq!(schemas["Who"], json!({"type": "string"}));
    }
}
