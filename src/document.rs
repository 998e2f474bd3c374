//! Document generation adapter.
//!
//! Renders everything accumulated in a [`Registry`] into an OpenAPI 3.1 document and
//! serializes it. Failures here (conflicting component definitions, references to
//! schemas that were never defined) are structural and should be treated as fatal.
//!
//! # Example
//!
//! ```
//! use openapi_route_map::document::{generate_openapi_document, DocumentConfig};
//! use openapi_route_map::registry::Registry;
//!
//! let registry = Registry::default();
//! let yaml = generate_openapi_document(&DocumentConfig::new("demo", "1.0.0"), &registry).unwrap();
//! assert!(yaml.contains("3.1.0"));
//! ```

use crate::error::Result;
use crate::openapi_builder::{Info, OpenApiBuilder, OpenApiDocument, Server};
use crate::registry::Registry;
use crate::serializer::{serialize_json, serialize_yaml};
use log::debug;

/// Global document metadata
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentConfig {
    pub info: Info,
    pub servers: Vec<Server>,
}

impl DocumentConfig {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: Info {
                title: title.into(),
                version: version.into(),
                description: None,
            },
            servers: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    pub fn with_server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }
}

/// Build the document object for `registry`.
pub fn build_document(config: &DocumentConfig, registry: &Registry) -> Result<OpenApiDocument> {
    debug!("Building document '{}' from registry {}", config.info.title, registry.name());

    let mut builder = OpenApiBuilder::new()
        .with_info(config.info.clone())
        .with_servers(config.servers.clone());
    builder.add_components(&registry.components())?;
    for operation in registry.operations() {
        builder.add_operation(&operation)?;
    }
    builder.build()
}

/// Render the registry as a YAML OpenAPI document
pub fn generate_openapi_document(config: &DocumentConfig, registry: &Registry) -> Result<String> {
    serialize_yaml(&build_document(config, registry)?)
}

/// Render the registry as a pretty-printed JSON OpenAPI document
pub fn generate_openapi_json(config: &DocumentConfig, registry: &Registry) -> Result<String> {
    serialize_json(&build_document(config, registry)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{HttpMethod, RouteSpec};
    use crate::route_map::{create_route_map, CompileOptions, RouteMap};
    use crate::schema::{Property, Schema};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compiled_registry(response: Schema) -> Registry {
        let registry = Registry::default();
        let route = RouteSpec::new(HttpMethod::Get, "/greeting", response, |_request| async {
            Ok(json!({"message": "hi"}))
        })
        .build()
        .unwrap();
        let map = RouteMap::new().with("Greeting", route).unwrap();
        create_route_map(map, &registry, &CompileOptions::new()).unwrap();
        registry
    }

    #[test]
    fn test_config_builders() {
        let config = DocumentConfig::new("demo", "1.0.0")
            .with_description("Demo API")
            .with_server("http://localhost:8080", Some("local".to_string()));

        assert_eq!(config.info.title, "demo");
        assert_eq!(config.info.description.as_deref(), Some("Demo API"));
        assert_eq!(config.servers[0].url, "http://localhost:8080");
    }

    #[test]
    fn test_yaml_document() {
        let registry =
            compiled_registry(Schema::object([Property::required("message", Schema::string())]));
        let config = DocumentConfig::new("demo", "1.0.0");
        let yaml = generate_openapi_document(&config, &registry).unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["openapi"], serde_yaml::Value::from("3.1.0"));
        assert_eq!(
            parsed["paths"]["/greeting"]["get"]["operationId"],
            serde_yaml::Value::from("Greeting")
        );
        assert_eq!(
            parsed["paths"]["/greeting"]["get"]["responses"]["200"]["description"],
            serde_yaml::Value::from("Success")
        );
    }

    #[test]
    fn test_json_document() {
        let registry = compiled_registry(Schema::void());
        let json = generate_openapi_json(&DocumentConfig::new("demo", "1.0.0"), &registry).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed["paths"]["/greeting"]["get"]["responses"],
            json!({"204": {"description": "Accepted"}})
        );
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let registry = compiled_registry(Schema::reference("NeverDefined"));
        let config = DocumentConfig::new("demo", "1.0.0");
        let err = generate_openapi_document(&config, &registry).unwrap_err();
        assert!(err.to_string().contains("NeverDefined"));
    }

    #[test]
    fn test_component_declared_after_compilation_resolves() {
        let registry = compiled_registry(Schema::reference("Greeting"));
        registry
            .register_component(
                "Greeting",
                Schema::object([Property::required("message", Schema::string())]),
            )
            .unwrap();

        let document = build_document(&DocumentConfig::new("demo", "1.0.0"), &registry).unwrap();
        let schemas = document.components.unwrap().schemas.unwrap();
        assert_eq!(schemas["Greeting"]["required"], json!(["message"]));
    }

    #[test]
    fn test_separate_registries_do_not_interfere() {
        let first = compiled_registry(Schema::string());
        let second = Registry::new("other");

        let doc = build_document(&DocumentConfig::new("demo", "1.0.0"), &second).unwrap();
        assert!(doc.paths.is_empty());
        assert_eq!(first.len(), 1);
    }
}
