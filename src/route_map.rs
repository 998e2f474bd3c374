//! Route maps and the route map compiler.
//!
//! [`create_route_map`] walks a [`RouteMap`] once, derives each route's full response
//! table and registers one operation per route against its target registries. The
//! map itself comes back unchanged and is what the dispatcher uses at call time.

use crate::error::{Error, Result};
use crate::registry::{OperationRegistration, Registry, RequestRegistration};
use crate::response::{merge_response_configs, ResponseDescriptor};
use crate::route::Route;
use crate::schema::Schema;
use indexmap::IndexMap;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Named routes, kept in insertion order and indexed by route key
#[derive(Debug, Clone, Default)]
pub struct RouteMap {
    routes: IndexMap<String, Arc<Route>>,
    by_key: HashMap<String, String>,
    components: IndexMap<String, Schema>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(route id, route)` pairs.
    pub fn from_routes(routes: impl IntoIterator<Item = (String, Route)>) -> Result<Self> {
        let mut map = Self::new();
        for (id, route) in routes {
            map.insert(id, route)?;
        }
        Ok(map)
    }

    /// Add a route under `id`. Reusing an id or a route key is a programming error.
    pub fn insert(&mut self, id: impl Into<String>, route: Route) -> Result<()> {
        let id = id.into();
        if self.routes.contains_key(&id) {
            return Err(Error::Compilation(format!("Duplicate route id: {}", id)));
        }
        if let Some(existing) = self.by_key.get(&route.route_key) {
            return Err(Error::Compilation(format!(
                "Route key '{}' of {} is already used by {}",
                route.route_key, id, existing
            )));
        }
        self.by_key.insert(route.route_key.clone(), id.clone());
        self.routes.insert(id, Arc::new(route));
        Ok(())
    }

    /// Chaining variant of [`RouteMap::insert`]
    pub fn with(mut self, id: impl Into<String>, route: Route) -> Result<Self> {
        self.insert(id, route)?;
        Ok(self)
    }

    /// Look a route up by its `"{METHOD} {path}"` key
    pub fn find_by_key(&self, route_key: &str) -> Option<(&str, &Arc<Route>)> {
        let id = self.by_key.get(route_key)?;
        self.routes.get_key_value(id).map(|(id, route)| (id.as_str(), route))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Route>)> {
        self.routes.iter().map(|(id, route)| (id.as_str(), route))
    }

    /// Named components resolved when the map was compiled
    pub fn components(&self) -> &IndexMap<String, Schema> {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Document-wide compile options
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Default error responses added to every registered route
    pub errors: BTreeMap<u16, ResponseDescriptor>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, code: u16, response: ResponseDescriptor) -> Self {
        self.errors.insert(code, response);
        self
    }
}

/// Compile a route map: register one operation per visible route.
///
/// Routes are registered against `meta.registries` when set, otherwise against
/// `registry`. Hidden routes are skipped but stay in the returned map. Nothing is
/// registered unless every route compiles. Compiling the same map twice against one
/// registry registers every operation twice.
///
/// The returned map carries a snapshot of the named components of every target
/// registry, which the dispatcher uses to resolve schema references.
pub fn create_route_map(
    mut map: RouteMap,
    registry: &Registry,
    options: &CompileOptions,
) -> Result<RouteMap> {
    for code in options.errors.keys() {
        check_status_code(*code, "default errors")?;
    }

    let mut pending = Vec::new();
    for (route_id, route) in map.iter() {
        if route.meta.hide_from_openapi {
            debug!("Skipping hidden route {} ({})", route_id, route.route_key);
            continue;
        }
        let operation = operation_for(route_id, route, options)?;
        pending.push((operation, route.meta.registries.as_ref()));
    }

    let registered = pending.len();
    let mut components = registry.components();
    for (operation, targets) in pending {
        match targets {
            Some(targets) => {
                for target in targets {
                    target.register_path(operation.clone());
                    for (name, schema) in target.components() {
                        components.entry(name).or_insert(schema);
                    }
                }
            }
            None => registry.register_path(operation),
        }
    }
    map.components = components;

    info!(
        "Compiled route map: {} routes, {} registered, {} hidden",
        map.len(),
        registered,
        map.len() - registered
    );
    Ok(map)
}

fn operation_for(
    route_id: &str,
    route: &Route,
    options: &CompileOptions,
) -> Result<OperationRegistration> {
    let responses = build_responses(route, options)?;
    let request = RequestRegistration {
        params: route.request.path_params.clone(),
        query: route.request.query_params.clone(),
        body: if route.request.payload.is_any() {
            None
        } else {
            Some(route.request.payload.clone())
        },
    };
    Ok(OperationRegistration {
        operation_id: route_id.to_string(),
        method: route.method,
        path: route.path.clone(),
        request,
        responses,
        tags: route.meta.tags.clone(),
        summary: route.meta.summary.clone(),
        description: route.meta.description.clone(),
        deprecated: route.meta.deprecated,
    })
}

/// Derive the full response table of a route.
///
/// The success entry comes first (`204` for void responses, `200` otherwise), the
/// default errors are laid over it as-is, and the route's own errors are merged into
/// any code already present.
pub fn build_responses(
    route: &Route,
    options: &CompileOptions,
) -> Result<BTreeMap<u16, ResponseDescriptor>> {
    let mut responses = BTreeMap::new();

    if route.is_void() {
        responses.insert(204, ResponseDescriptor::new("Accepted"));
    } else if let Some(content_type) = &route.raw_response_type {
        if content_type.trim().is_empty() {
            return Err(Error::Compilation(format!(
                "{}: raw response type must not be empty",
                route.route_key
            )));
        }
        responses.insert(
            200,
            ResponseDescriptor::new("Success")
                .with_content(content_type.clone(), Schema::opaque_string()),
        );
    } else {
        responses.insert(200, ResponseDescriptor::new("Success").with_json(route.response.clone()));
    }

    for (code, response) in &options.errors {
        responses.insert(*code, response.clone());
    }

    for (code, response) in &route.errors {
        check_status_code(*code, &route.route_key)?;
        let merged = merge_response_configs(responses.get(code), response);
        responses.insert(*code, merged);
    }

    Ok(responses)
}

fn check_status_code(code: u16, context: &str) -> Result<()> {
    if (100..=599).contains(&code) {
        Ok(())
    } else {
        Err(Error::Compilation(format!("{}: invalid HTTP status code {}", context, code)))
    }
}
