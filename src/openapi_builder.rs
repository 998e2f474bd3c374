use crate::error::{Error, Result};
use crate::registry::OperationRegistration;
use crate::response::ResponseDescriptor;
use crate::route::HttpMethod;
use crate::schema::Schema;
use crate::schema_generator::SchemaGenerator;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAPI version emitted in every document
pub const OPENAPI_VERSION: &str = "3.1.0";

/// OpenAPI document builder
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Server list
    servers: Vec<Server>,
    /// Paths collection (URL path -> PathItem), in registration order
    paths: IndexMap<String, PathItem>,
    /// Renders schemas and collects components
    generator: SchemaGenerator,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Operation tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation ID
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Parameters (path, query)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code
    pub responses: IndexMap<String, Response>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query)
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema
    pub schema: Value,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Value,
}

/// OpenAPI Header object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub schema: Value,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, Header>>,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<IndexMap<String, Value>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<IndexMap<String, Value>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths
    pub paths: IndexMap<String, PathItem>,
    /// Components (schemas, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            servers: Vec::new(),
            paths: IndexMap::new(),
            generator: SchemaGenerator::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    pub fn with_servers(mut self, servers: Vec<Server>) -> Self {
        self.servers = servers;
        self
    }

    /// Emit named component schemas declared on a registry
    pub fn add_components(&mut self, components: &IndexMap<String, Schema>) -> Result<()> {
        for (name, schema) in components {
            self.generator.declare_component(name, schema)?;
        }
        Ok(())
    }

    /// Add a registered operation to the document
    pub fn add_operation(&mut self, registration: &OperationRegistration) -> Result<()> {
        debug!(
            "Adding operation: {} {} ({})",
            registration.method, registration.path, registration.operation_id
        );

        let operation_id = &registration.operation_id;
        let mut parameters =
            self.generate_parameters(&registration.request.params, "path", operation_id)?;
        parameters.extend(self.generate_parameters(
            &registration.request.query,
            "query",
            operation_id,
        )?);

        let request_body = match &registration.request.body {
            Some(schema) => {
                let schema = self.generator.generate_schema(schema)?;
                let mut content = IndexMap::new();
                content.insert("application/json".to_string(), MediaType { schema });
                Some(RequestBody {
                    required: true,
                    content,
                })
            }
            None => None,
        };

        let mut responses = IndexMap::new();
        for (code, descriptor) in &registration.responses {
            responses.insert(code.to_string(), self.generate_response(descriptor)?);
        }

        let operation = Operation {
            tags: registration.tags.clone(),
            summary: registration.summary.clone(),
            description: registration.description.clone(),
            operation_id: registration.operation_id.clone(),
            parameters: if parameters.is_empty() { None } else { Some(parameters) },
            request_body,
            responses,
            deprecated: registration.deprecated,
        };

        let path_item = self.paths.entry(registration.path.clone()).or_default();
        let slot = match registration.method {
            HttpMethod::Get => &mut path_item.get,
            HttpMethod::Post => &mut path_item.post,
            HttpMethod::Put => &mut path_item.put,
            HttpMethod::Delete => &mut path_item.delete,
        };
        if slot.is_some() {
            warn!(
                "{} {} is registered more than once; keeping {}",
                registration.method, registration.path, registration.operation_id
            );
        }
        *slot = Some(operation);
        Ok(())
    }

    /// Turn the properties of an object schema into parameters
    fn generate_parameters(
        &mut self,
        schema: &Schema,
        location: &str,
        operation_id: &str,
    ) -> Result<Vec<Parameter>> {
        let shape = schema.as_object_shape().ok_or_else(|| {
            Error::Compilation(format!(
                "{}: {} parameters must be an object schema, got {}",
                operation_id,
                location,
                schema.kind_name()
            ))
        })?;

        shape
            .properties
            .iter()
            .map(|property| {
                Ok(Parameter {
                    name: property.name.clone(),
                    location: location.to_string(),
                    // Path parameters are always required in OpenAPI
                    required: location == "path" || !property.optional,
                    schema: self.generator.generate_schema(&property.schema)?,
                    description: property.schema.meta.description.clone(),
                })
            })
            .collect()
    }

    fn generate_response(&mut self, descriptor: &ResponseDescriptor) -> Result<Response> {
        let headers = match &descriptor.headers {
            Some(headers) => {
                let mut rendered = IndexMap::new();
                for (name, schema) in headers {
                    let schema = self.generator.generate_schema(schema)?;
                    rendered.insert(name.clone(), Header { schema });
                }
                Some(rendered)
            }
            None => None,
        };

        let content = match &descriptor.content {
            Some(content) => {
                let mut rendered = IndexMap::new();
                for (content_type, media) in content {
                    let schema = self.generator.generate_schema(&media.schema)?;
                    rendered.insert(content_type.clone(), MediaType { schema });
                }
                Some(rendered)
            }
            None => None,
        };

        Ok(Response {
            description: descriptor.description.clone(),
            headers,
            content,
            links: descriptor.links.clone(),
        })
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> Result<OpenApiDocument> {
        debug!("Building final OpenAPI document");

        let schemas = self.generator.into_schemas()?;
        let components = if !schemas.is_empty() {
            Some(Components {
                schemas: Some(schemas),
            })
        } else {
            None
        };

        Ok(OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            paths: self.paths,
            components,
        })
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
