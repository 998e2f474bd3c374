//! Per-status response descriptors and the response merge engine.
//!
//! A route's response table is assembled from a synthesized success entry, the
//! document-wide default errors and the route's own declared errors. When a route
//! declares a status code that is already present, the two descriptors are merged
//! with [`merge_response_configs`].

use crate::schema::{merge_schemas, Schema};
use indexmap::IndexMap;
use serde_json::Value;

/// Documentation for one response status code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDescriptor {
    pub description: String,
    /// Response header schemas by header name
    pub headers: Option<IndexMap<String, Schema>>,
    /// OpenAPI link objects, passed through verbatim
    pub links: Option<IndexMap<String, Value>>,
    /// Body schema by content type
    pub content: Option<IndexMap<String, MediaType>>,
}

/// Body schema for one content type
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    pub schema: Schema,
}

impl ResponseDescriptor {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Add a body schema for `content_type`
    pub fn with_content(mut self, content_type: impl Into<String>, schema: Schema) -> Self {
        self.content
            .get_or_insert_with(IndexMap::new)
            .insert(content_type.into(), MediaType { schema });
        self
    }

    /// Shorthand for an `application/json` body
    pub fn with_json(self, schema: Schema) -> Self {
        self.with_content("application/json", schema)
    }

    pub fn with_header(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.headers
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), schema);
        self
    }

    pub fn with_link(mut self, name: impl Into<String>, link: Value) -> Self {
        self.links
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), link);
        self
    }

    pub fn content_schema(&self, content_type: &str) -> Option<&Schema> {
        self.content
            .as_ref()
            .and_then(|content| content.get(content_type))
            .map(|media| &media.schema)
    }
}

/// Merge two descriptors for the same status code.
///
/// Without an existing descriptor the incoming one is returned verbatim. Otherwise
/// `description`, `headers` and `links` come from `incoming` when it has them. Content
/// is merged per content type: types on one side only pass through, types on both
/// sides get their schemas merged when both are object-shaped, and the incoming
/// schema replaces the existing one otherwise.
pub fn merge_response_configs(
    existing: Option<&ResponseDescriptor>,
    incoming: &ResponseDescriptor,
) -> ResponseDescriptor {
    let Some(existing) = existing else {
        return incoming.clone();
    };

    let description = if incoming.description.is_empty() {
        existing.description.clone()
    } else {
        incoming.description.clone()
    };

    ResponseDescriptor {
        description,
        headers: incoming.headers.clone().or_else(|| existing.headers.clone()),
        links: incoming.links.clone().or_else(|| existing.links.clone()),
        content: merge_contents(existing.content.as_ref(), incoming.content.as_ref()),
    }
}

fn merge_contents(
    existing: Option<&IndexMap<String, MediaType>>,
    incoming: Option<&IndexMap<String, MediaType>>,
) -> Option<IndexMap<String, MediaType>> {
    let (existing, incoming) = match (existing, incoming) {
        (None, None) => return None,
        (Some(only), None) | (None, Some(only)) => return Some(only.clone()),
        (Some(existing), Some(incoming)) => (existing, incoming),
    };

    let mut merged = existing.clone();
    for (content_type, media) in incoming {
        let schema = match existing.get(content_type) {
            Some(current) => merge_schemas(&current.schema, &media.schema),
            None => media.schema.clone(),
        };
        merged.insert(content_type.clone(), MediaType { schema });
    }
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Property;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn issue_body() -> Schema {
        Schema::object([
            Property::required("code", Schema::string()),
            Property::required("message", Schema::string()),
        ])
    }

    #[test]
    fn test_missing_existing_returns_incoming() {
        let incoming = ResponseDescriptor::new("Bad request").with_json(issue_body());
        assert_eq!(merge_response_configs(None, &incoming), incoming);
    }

    #[test]
    fn test_disjoint_object_fields_are_unioned() {
        let existing = ResponseDescriptor::new("Server error").with_json(issue_body());
        let incoming = ResponseDescriptor::new("Route failure").with_json(Schema::object([
            Property::required("retryable", Schema::boolean()),
        ]));

        let merged = merge_response_configs(Some(&existing), &incoming);
        assert_eq!(merged.description, "Route failure");

        let shape = merged
            .content_schema("application/json")
            .unwrap()
            .as_object_shape()
            .unwrap();
        let names: Vec<_> = shape.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["code", "message", "retryable"]);
    }

    #[test]
    fn test_content_type_on_one_side_is_kept() {
        let existing = ResponseDescriptor::new("Error")
            .with_json(issue_body())
            .with_content("text/plain", Schema::string());
        let incoming = ResponseDescriptor::new("Error").with_json(issue_body());

        let merged = merge_response_configs(Some(&existing), &incoming);
        assert_eq!(merged.content_schema("text/plain"), Some(&Schema::string()));

        let existing = ResponseDescriptor::new("Error").with_json(issue_body());
        let incoming =
            ResponseDescriptor::new("Error").with_content("text/plain", Schema::string());
        let merged = merge_response_configs(Some(&existing), &incoming);
        assert_eq!(merged.content_schema("application/json"), Some(&issue_body()));
        assert_eq!(merged.content_schema("text/plain"), Some(&Schema::string()));
    }

    #[test]
    fn test_non_object_schema_is_replaced_not_unioned() {
        let existing = ResponseDescriptor::new("Error").with_json(issue_body());
        let incoming = ResponseDescriptor::new("Error").with_json(Schema::string());

        let merged = merge_response_configs(Some(&existing), &incoming);
        assert_eq!(merged.content_schema("application/json"), Some(&Schema::string()));
    }

    #[test]
    fn test_headers_and_links_fall_back_to_existing() {
        let existing = ResponseDescriptor::new("Error")
            .with_header("x-request-id", Schema::string())
            .with_link("self", json!({"operationId": "MyRoute"}));
        let incoming = ResponseDescriptor::new("Other");

        let merged = merge_response_configs(Some(&existing), &incoming);
        assert_eq!(merged.headers, existing.headers);
        assert_eq!(merged.links, existing.links);

        let incoming =
            ResponseDescriptor::new("Other").with_header("retry-after", Schema::integer());
        let merged = merge_response_configs(Some(&existing), &incoming);
        assert_eq!(merged.headers, incoming.headers);
    }

    #[test]
    fn test_empty_incoming_description_keeps_existing() {
        let existing = ResponseDescriptor::new("Server error");
        let incoming = ResponseDescriptor::default().with_json(issue_body());

        let merged = merge_response_configs(Some(&existing), &incoming);
        assert_eq!(merged.description, "Server error");
        assert!(merged.content.is_some());
    }

    #[test]
    fn test_no_content_on_either_side() {
        let merged = merge_response_configs(
            Some(&ResponseDescriptor::new("Accepted")),
            &ResponseDescriptor::new("Accepted"),
        );
        assert!(merged.content.is_none());
    }
}
