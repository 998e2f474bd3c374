//! Sample API.
//!
//! A handful of models and routes exercising every part of the crate: named component
//! schemas, patterns with custom messages, extended objects, path parameters, a failing
//! handler, and two hidden routes that serve the generated document itself.

use crate::document::{generate_openapi_document, generate_openapi_json, DocumentConfig};
use crate::error::Result;
use crate::registry::Registry;
use crate::response::ResponseDescriptor;
use crate::route::{HttpMethod, RequestEnvelope, RouteMeta, RouteSpec};
use crate::route_map::{create_route_map, CompileOptions, RouteMap};
use crate::schema::{Property, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DOCUMENT_TITLE: &str = "demo-zod4-openapi";
pub const DOCUMENT_VERSION: &str = "1.0.0";

/// One segment of an issue path: a field name or an array index
pub fn issue_path_part() -> Schema {
    Schema::union([Schema::string(), Schema::integer()])
}

/// `{code, message, path}` issue shape, published as the `APIIssue` component
pub fn api_issue() -> Schema {
    Schema::object([
        Property::required("code", Schema::string()),
        Property::required("message", Schema::string()),
        Property::required("path", Schema::array(issue_path_part().with_id("APIIssuePathPart"))),
    ])
    .with_id("APIIssue")
}

/// Same shape as [`api_issue`] with the path segment inlined
pub fn api_issue_working() -> Schema {
    Schema::object([
        Property::required("code", Schema::string()),
        Property::required("message", Schema::string()),
        Property::required("path", Schema::array(issue_path_part())),
    ])
    .with_id("APIIssueWorking")
}

pub fn specific_api_issue() -> Result<Schema> {
    api_issue().extend([Property::required("code", Schema::literal("specific_error_code"))])
}

pub fn specific_api_issue_working() -> Result<Schema> {
    api_issue_working().extend([Property::required("code", Schema::literal("specific_error_code"))])
}

/// Prefixed identifier such as `test_12345`
pub fn test_id() -> Schema {
    Schema::string()
        .with_id("TestId")
        .with_format("prefixid")
        .with_examples([json!("test_12345")])
}

pub fn who() -> Result<Schema> {
    Ok(Schema::string()
        .with_pattern("^[a-zA-Z]+$", "Who must be a string with only letters")?
        .with_id("Who")
        .with_examples([json!("World")]))
}

pub fn my_special_payload() -> Result<Schema> {
    Ok(Schema::object([
        Property::optional("_id", test_id()),
        Property::required("who", who()?),
    ])
    .with_id("MySpecialParam"))
}

pub fn my_special_response() -> Result<Schema> {
    Ok(Schema::object([
        Property::optional("_id", test_id()),
        Property::required("who", who()?),
        Property::required("message", Schema::string()),
    ])
    .with_id("MySpecialResponse"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MySpecialPayload {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub who: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MySpecialResponse {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub who: String,
    pub message: String,
}

impl MySpecialResponse {
    fn greet(payload: MySpecialPayload) -> Self {
        Self {
            id: payload.id,
            message: format!("Hello, {}!", payload.who),
            who: payload.who,
        }
    }
}

async fn greet_from_payload(request: RequestEnvelope) -> anyhow::Result<Value> {
    let payload: MySpecialPayload = request.payload_as()?;
    Ok(serde_json::to_value(MySpecialResponse::greet(payload))?)
}

async fn greet_from_path_params(request: RequestEnvelope) -> anyhow::Result<Value> {
    let params: MySpecialPayload = request.path_params_as()?;
    Ok(serde_json::to_value(MySpecialResponse::greet(params))?)
}

async fn serve_yaml_document(registry: Registry) -> anyhow::Result<Value> {
    Ok(Value::String(generate_openapi_document(&document_config(), &registry)?))
}

async fn serve_json_document(registry: Registry) -> anyhow::Result<Value> {
    Ok(Value::String(generate_openapi_json(&document_config(), &registry)?))
}

/// Metadata of the generated document
pub fn document_config() -> DocumentConfig {
    DocumentConfig::new(DOCUMENT_TITLE, DOCUMENT_VERSION)
}

/// Build the demo routes.
///
/// The two document routes render `registry`, so they always reflect whatever has
/// been compiled into it by the time they are called.
pub fn routes(registry: &Registry) -> Result<RouteMap> {
    let my_route = RouteSpec::new(
        HttpMethod::Get,
        "/my-route",
        my_special_response()?,
        greet_from_payload,
    )
    .payload(my_special_payload()?)
    .build()?;

    let my_route_with_path_params = RouteSpec::new(
        HttpMethod::Get,
        "/my-route/{who}",
        my_special_response()?,
        greet_from_path_params,
    )
    .path_params(my_special_payload()?)
    .build()?;

    let error_route = RouteSpec::new(
        HttpMethod::Get,
        "/error",
        Schema::object([
            Property::required("issue", api_issue()),
            Property::required("issueWorking", api_issue_working()),
            Property::required("specificIssue", specific_api_issue()?),
            Property::required("specificIssueWorking", specific_api_issue_working()?),
        ]),
        |_request| async { Err(anyhow::anyhow!("This is a simulated error")) },
    )
    .build()?;

    let yaml_registry = registry.clone();
    let openapi_route = RouteSpec::new(
        HttpMethod::Get,
        "/openapi.yml",
        Schema::string(),
        move |_request| serve_yaml_document(yaml_registry.clone()),
    )
    .raw_response_type("application/x-yaml")
    .meta(RouteMeta::hidden())
    .build()?;

    let json_registry = registry.clone();
    let openapi_json_route = RouteSpec::new(
        HttpMethod::Get,
        "/openapi.json",
        Schema::string(),
        move |_request| serve_json_document(json_registry.clone()),
    )
    .raw_response_type("application/json")
    .meta(RouteMeta::hidden())
    .build()?;

    RouteMap::new()
        .with("MyRoute", my_route)?
        .with("MyRouteWithPathParams", my_route_with_path_params)?
        .with("ErrorRoute", error_route)?
        .with("OpenAPIRoute", openapi_route)?
        .with("OpenAPIJsonRoute", openapi_json_route)
}

/// Default errors attached to every documented demo route
pub fn compile_options() -> CompileOptions {
    CompileOptions::new().with_error(
        500,
        ResponseDescriptor::new("Internal Server Error").with_json(api_issue()),
    )
}

/// Build and compile the demo routes against `registry`
pub fn route_map(registry: &Registry) -> Result<RouteMap> {
    create_route_map(routes(registry)?, registry, &compile_options())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;
    use crate::validator::validate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_who_pattern_message() {
        let schema = who().unwrap();
        assert!(validate(&schema, &json!("World")).is_ok());

        let issues = validate(&schema, &json!("123")).unwrap_err();
        assert_eq!(issues[0].code, "invalid_string");
        assert_eq!(issues[0].message, "Who must be a string with only letters");
    }

    #[test]
    fn test_specific_issue_overrides_code() {
        let schema = specific_api_issue().unwrap();
        let shape = schema.as_object_shape().unwrap();

        assert_eq!(schema.id(), None);
        assert_eq!(
            shape.get("code").unwrap().schema.kind,
            SchemaKind::Literal(json!("specific_error_code"))
        );
        let names: Vec<_> = shape.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["code", "message", "path"]);
    }

    #[test]
    fn test_compiled_map_hides_document_routes() {
        let registry = Registry::new("demo");
        let map = route_map(&registry).unwrap();

        assert_eq!(map.len(), 5);
        let documented: Vec<_> = registry
            .operations()
            .into_iter()
            .map(|op| op.operation_id)
            .collect();
        assert_eq!(documented, vec!["MyRoute", "MyRouteWithPathParams", "ErrorRoute"]);
    }

    #[test]
    fn test_every_route_carries_default_error() {
        let registry = Registry::new("demo");
        route_map(&registry).unwrap();

        for operation in registry.operations() {
            assert_eq!(operation.responses[&500].description, "Internal Server Error");
        }
    }

    #[test]
    fn test_greeting_keeps_id() {
        let response = MySpecialResponse::greet(MySpecialPayload {
            id: Some("test_1".to_string()),
            who: "World".to_string(),
        });
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"_id": "test_1", "who": "World", "message": "Hello, World!"})
        );
    }
}
