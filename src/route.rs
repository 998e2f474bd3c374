//! Route definitions.
//!
//! A [`Route`] binds a method and path template to its request schemas, response
//! schema, declared error responses, metadata and an async handler. Routes are built
//! once at startup through [`RouteSpec`] / [`make_route`] and never mutated afterwards.
//!
//! # Example
//!
//! ```
//! use openapi_route_map::route::{HttpMethod, RouteSpec};
//! use openapi_route_map::schema::{Property, Schema};
//! use serde_json::json;
//!
//! let route = RouteSpec::new(
//!     HttpMethod::Get,
//!     "/hello",
//!     Schema::object([Property::required("message", Schema::string())]),
//!     |_request| async { Ok(json!({ "message": "Hello" })) },
//! )
//! .build()
//! .unwrap();
//!
//! assert_eq!(route.route_key, "GET /hello");
//! ```

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::response::ResponseDescriptor;
use crate::schema::{Property, Schema};
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by route handlers
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// Type-erased async route handler
pub type Handler = Arc<dyn Fn(RequestEnvelope) -> HandlerFuture + Send + Sync>;

/// HTTP methods a route can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Lowercase name, as used for operation keys in the document
    pub fn lowercase(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(Error::Compilation(format!("Unsupported HTTP method: {}", other))),
        }
    }
}

/// Route metadata used for documentation
#[derive(Debug, Clone, Default)]
pub struct RouteMeta {
    /// Keep the route dispatchable but leave it out of every document
    pub hide_from_openapi: bool,
    pub deprecated: bool,
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Registries to register against instead of the default one
    pub registries: Option<Vec<Registry>>,
}

impl RouteMeta {
    pub fn hidden() -> Self {
        Self {
            hide_from_openapi: true,
            ..Default::default()
        }
    }
}

/// Already-parsed request handed to the dispatcher by the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub route_key: String,
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub path_params: Map<String, Value>,
    #[serde(default)]
    pub query_params: Map<String, Value>,
    #[serde(default)]
    pub payload: Value,
}

impl RequestEnvelope {
    /// Envelope for `method` and `path` with a matching route key and empty parameters
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            route_key: route_key(method, &path),
            path,
            method: method.as_str().to_string(),
            path_params: Map::new(),
            query_params: Map::new(),
            payload: Value::Object(Map::new()),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Deserialize the payload into a typed value
    pub fn payload_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// Deserialize the path parameters into a typed value
    pub fn path_params_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(Value::Object(self.path_params.clone()))?)
    }

    /// Deserialize the query parameters into a typed value
    pub fn query_params_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(Value::Object(self.query_params.clone()))?)
    }
}

/// Result envelope returned to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// The three request schemas of a route
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSchema {
    pub path_params: Schema,
    pub query_params: Schema,
    /// `Schema::any()` means the route takes no request body
    pub payload: Schema,
}

/// An immutable route definition
#[derive(Clone)]
pub struct Route {
    /// `"{METHOD} {path}"`
    pub route_key: String,
    pub path: String,
    pub method: HttpMethod,
    pub request: RequestSchema,
    /// Success body schema; `Schema::void()` for routes without a body
    pub response: Schema,
    /// MIME type of an opaque string body replacing the JSON response
    pub raw_response_type: Option<String>,
    pub errors: BTreeMap<u16, ResponseDescriptor>,
    pub meta: RouteMeta,
    composite: Schema,
    handler: Handler,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Route")
            .field("route_key", &self.route_key)
            .field("raw_response_type", &self.raw_response_type)
            .field("errors", &self.errors.keys().collect::<Vec<_>>())
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Schema every envelope must satisfy before the handler runs.
    ///
    /// `routeKey`, `path` and `method` are literals, so an envelope built for another
    /// route is rejected.
    pub fn request_schema(&self) -> &Schema {
        &self.composite
    }

    /// Invoke the handler without validation
    pub fn call(&self, request: RequestEnvelope) -> HandlerFuture {
        (self.handler)(request)
    }

    pub fn is_void(&self) -> bool {
        self.response.is_void()
    }
}

/// Declarative route specification, turned into a [`Route`] by [`make_route`]
pub struct RouteSpec {
    pub path: String,
    pub method: HttpMethod,
    pub response: Schema,
    pub path_params: Option<Schema>,
    pub query_params: Option<Schema>,
    pub payload: Option<Schema>,
    pub errors: BTreeMap<u16, ResponseDescriptor>,
    pub raw_response_type: Option<String>,
    pub meta: RouteMeta,
    pub handler: Handler,
}

impl RouteSpec {
    pub fn new<F, Fut>(
        method: HttpMethod,
        path: impl Into<String>,
        response: Schema,
        handler: F,
    ) -> Self
    where
        F: Fn(RequestEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            path: path.into(),
            method,
            response,
            path_params: None,
            query_params: None,
            payload: None,
            errors: BTreeMap::new(),
            raw_response_type: None,
            meta: RouteMeta::default(),
            handler: Arc::new(move |request| handler(request).boxed()),
        }
    }

    pub fn path_params(mut self, schema: Schema) -> Self {
        self.path_params = Some(schema);
        self
    }

    pub fn query_params(mut self, schema: Schema) -> Self {
        self.query_params = Some(schema);
        self
    }

    pub fn payload(mut self, schema: Schema) -> Self {
        self.payload = Some(schema);
        self
    }

    /// Declare an error response for `code`
    pub fn error(mut self, code: u16, response: ResponseDescriptor) -> Self {
        self.errors.insert(code, response);
        self
    }

    pub fn raw_response_type(mut self, content_type: impl Into<String>) -> Self {
        self.raw_response_type = Some(content_type.into());
        self
    }

    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn build(self) -> Result<Route> {
        make_route(self)
    }
}

/// Build a route from its specification.
///
/// Path and query parameters default to the empty object, the payload defaults to
/// `Schema::any()`. Fails when the path is not absolute, when parameter schemas are
/// not object-shaped, or when a `{placeholder}` in the path has no matching path
/// parameter.
pub fn make_route(spec: RouteSpec) -> Result<Route> {
    let RouteSpec {
        path,
        method,
        response,
        path_params,
        query_params,
        payload,
        errors,
        raw_response_type,
        meta,
        handler,
    } = spec;

    let route_key = route_key(method, &path);
    debug!("Building route: {}", route_key);

    if !path.starts_with('/') {
        return Err(Error::Compilation(format!(
            "Route path must start with '/': {}",
            route_key
        )));
    }

    let path_params = path_params.unwrap_or_else(Schema::empty_object);
    let query_params = query_params.unwrap_or_else(Schema::empty_object);
    let payload = payload.unwrap_or_else(Schema::any);

    let params = [("path parameters", &path_params), ("query parameters", &query_params)];
    for (label, schema) in params {
        if schema.as_object_shape().is_none() {
            return Err(Error::Compilation(format!(
                "{}: {} must be an object schema, got {}",
                route_key,
                label,
                schema.kind_name()
            )));
        }
    }

    if let Some(shape) = path_params.as_object_shape() {
        for placeholder in placeholders(&path) {
            if shape.get(placeholder).is_none() {
                return Err(Error::Compilation(format!(
                    "{}: placeholder '{{{}}}' has no path parameter schema",
                    route_key, placeholder
                )));
            }
        }
    }

    let composite = Schema::object([
        Property::required("routeKey", Schema::literal(route_key.clone())),
        Property::required("path", Schema::literal(path.clone())),
        Property::required("method", Schema::literal(method.as_str())),
        Property::required("pathParams", path_params.clone()),
        Property::required("queryParams", query_params.clone()),
        Property::required("payload", payload.clone()),
    ]);

    Ok(Route {
        route_key,
        path,
        method,
        request: RequestSchema {
            path_params,
            query_params,
            payload,
        },
        response,
        raw_response_type,
        errors,
        meta,
        composite,
        handler,
    })
}

/// `"{METHOD} {path}"`
pub fn route_key(method: HttpMethod, path: &str) -> String {
    format!("{} {}", method, path)
}

/// Names of the `{param}` placeholders in a path template
pub fn placeholders(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .collect()
}
