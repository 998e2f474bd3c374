//! OpenAPI route map - declarative routes that validate, dispatch and document themselves.
//!
//! Routes are declared once, with schemas for their path parameters, query parameters,
//! payload, response and error responses. The same declarations drive request
//! validation at dispatch time and the generated OpenAPI 3.1 document.
//!
//! # Architecture
//!
//! 1. [`schema`] - Schema descriptions (objects, unions, literals, patterns, references)
//! 2. [`validator`] - Validates JSON values against schemas, collecting every issue
//! 3. [`route`] - Route definitions and the request / result envelopes
//! 4. [`response`] - Response descriptors and the response merge engine
//! 5. [`registry`] - Accumulates documented operations and named components
//! 6. [`route_map`] - Compiles a route map, registering every visible route
//! 7. [`schema_generator`] - Renders schemas to OpenAPI schema objects
//! 8. [`openapi_builder`] - Constructs the complete OpenAPI document
//! 9. [`serializer`] - Serializes the document to YAML or JSON
//! 10. [`document`] - Renders a registry as a document in one call
//! 11. [`dispatcher`] - Looks up, validates and runs a route for one request
//!
//! # Example Usage
//!
//! ```
//! use openapi_route_map::{
//!     document::{generate_openapi_document, DocumentConfig},
//!     registry::Registry,
//!     route::{HttpMethod, RouteSpec},
//!     route_map::{create_route_map, CompileOptions, RouteMap},
//!     schema::{Property, Schema},
//! };
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
//! let registry = Registry::default();
//! let map = RouteMap::new().with("Hello", route).unwrap();
//! let map = create_route_map(map, &registry, &CompileOptions::new()).unwrap();
//! assert_eq!(map.len(), 1);
//!
//! let config = DocumentConfig::new("hello", "1.0.0");
//! let yaml = generate_openapi_document(&config, &registry).unwrap();
//! assert!(yaml.contains("/hello"));
//! ```
//!
//! # Command-Line Interface
//!
//! The [`cli`] module dispatches a single request against the [`demo`] API.

pub mod cli;
pub mod demo;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod openapi_builder;
pub mod registry;
pub mod response;
pub mod route;
pub mod route_map;
pub mod schema;
pub mod schema_generator;
pub mod serializer;
pub mod validator;
