//! Request dispatch.
//!
//! [`dispatch`] resolves a route by its key, validates the envelope against the
//! route's request schema and runs the handler. Nothing is shared between dispatches
//! except the read-only route map, so any number may be in flight at once.

use crate::error::{Error, Result};
use crate::route::{ApiResult, RequestEnvelope, Route};
use crate::route_map::RouteMap;
use crate::validator::Validator;
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::sync::Arc;

pub const CONTENT_TYPE: &str = "content-type";

/// Dispatch one request to the route registered under `route_key`.
///
/// # Errors
///
/// - [`Error::RouteNotFound`] when no route has this key
/// - [`Error::RequestValidation`] when the envelope fails validation; the handler
///   is not invoked. Schema references resolve through the components the map was
///   compiled with, and an unknown reference is itself a validation issue.
/// - [`Error::Handler`] when the handler fails
pub async fn dispatch(
    route_map: &RouteMap,
    route_key: &str,
    request: RequestEnvelope,
) -> Result<ApiResult> {
    let (route_id, route) = route_map
        .find_by_key(route_key)
        .ok_or_else(|| Error::RouteNotFound(route_key.to_string()))?;
    let route = Arc::clone(route);
    debug!("Dispatching {} to {}", route_key, route_id);

    let envelope = serde_json::to_value(&request)?;
    let validator = Validator::with_components(route_map.components());
    if let Err(issues) = validator.validate(route.request_schema(), &envelope) {
        debug!("Rejected {}: {} issue(s)", route_key, issues.len());
        return Err(Error::RequestValidation(issues));
    }

    let output = route.call(request).await.map_err(Error::Handler)?;
    let result = shape_result(&route, output)?;
    debug!("{} answered {}", route_key, result.code);
    Ok(result)
}

fn shape_result(route: &Route, output: Value) -> Result<ApiResult> {
    if route.is_void() {
        return Ok(ApiResult {
            code: 204,
            headers: None,
            body: None,
        });
    }

    let (content_type, body) = match &route.raw_response_type {
        Some(content_type) => match output {
            Value::String(text) => (content_type.clone(), text),
            other => {
                return Err(Error::Handler(anyhow::anyhow!(
                    "{} must return a string body for {}, got {}",
                    route.route_key,
                    content_type,
                    other
                )))
            }
        },
        None => ("application/json".to_string(), serde_json::to_string(&output)?),
    };

    let mut headers = IndexMap::new();
    headers.insert(CONTENT_TYPE.to_string(), content_type);
    Ok(ApiResult {
        code: 200,
        headers: Some(headers),
        body: Some(body),
    })
}
