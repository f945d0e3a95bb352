//! Route registry: which schema validates which route, and which routes skip auth
//!
//! Filled once at startup, then moved into the pipeline behind an `Arc`. After
//! that move nothing can mutate it, so lookups need no locking.

use crate::core::path::{InvalidParam, PathParams, PathTemplate};
use crate::core::validation::{RegisteredSchema, Schema};
use axum::http::Method;
use indexmap::IndexMap;
use std::fmt;

/// A route as registered: method plus `:param` path template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub template: String,
}

impl RouteKey {
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

/// Everything known about one registered route
#[derive(Debug, Clone)]
pub struct RouteEntry {
    template: PathTemplate,
    schema: Option<RegisteredSchema>,
    skip_auth: bool,
}

impl RouteEntry {
    fn new(template: &str) -> Self {
        Self {
            template: PathTemplate::parse(template),
            schema: None,
            skip_auth: false,
        }
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn schema(&self) -> Option<&RegisteredSchema> {
        self.schema.as_ref()
    }

    pub fn skips_auth(&self) -> bool {
        self.skip_auth
    }
}

/// Result of matching a concrete request against the registry
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRoute<'a> {
    pub entry: &'a RouteEntry,
    pub key: &'a RouteKey,
}

impl<'a> ResolvedRoute<'a> {
    /// Decoded parameters captured from `path` by the matched template
    pub fn params(&self, path: &str) -> Result<PathParams, InvalidParam> {
        self.entry
            .template
            .captures(path)
            .unwrap_or_else(|| Ok(PathParams::default()))
    }
}

/// Registry of route schemas and auth bypasses
///
/// Entries keep registration order; lookup returns the first entry whose method
/// is equal and whose template matches. Overlapping templates resolve to
/// whichever was registered first. HEAD requests without a HEAD entry of their
/// own resolve to the GET entry, the same fallback the router applies.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    routes: IndexMap<RouteKey, RouteEntry>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, method: Method, template: &str) -> &mut RouteEntry {
        self.routes
            .entry(RouteKey::new(method, template))
            .or_insert_with(|| RouteEntry::new(template))
    }

    /// Attach a schema to a route; a second registration for the same key replaces it
    pub fn register(&mut self, method: Method, template: &str, schema: RegisteredSchema) {
        let entry = self.entry_mut(method, template);
        if entry.schema.is_some() {
            tracing::warn!(
                template = %template,
                schema = %schema.descriptor().name,
                "replacing previously registered schema"
            );
        }
        entry.schema = Some(schema);
    }

    /// Typed form of [`register`](Self::register)
    pub fn register_schema<T: Schema>(&mut self, method: Method, template: &str) {
        self.register(method, template, RegisteredSchema::of::<T>());
    }

    /// Mark a route as reachable without a bearer token
    pub fn skip_auth(&mut self, method: Method, template: &str) {
        self.entry_mut(method, template).skip_auth = true;
    }

    /// Make sure a route is known even without schema or bypass
    pub(crate) fn declare(&mut self, method: Method, template: &str) {
        self.entry_mut(method, template);
    }

    /// First registered route matching `method` and `path`
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute<'_>> {
        self.find(method, path).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET, path)
            } else {
                None
            }
        })
    }

    fn find(&self, method: &Method, path: &str) -> Option<ResolvedRoute<'_>> {
        self.routes
            .iter()
            .find(|(key, entry)| key.method == *method && entry.template.matches(path))
            .map(|(key, entry)| ResolvedRoute { entry, key })
    }

    /// Schema for the first matching route, if that route has one
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&RegisteredSchema> {
        self.resolve(method, path)
            .and_then(|resolved| resolved.entry.schema.as_ref())
    }

    pub fn is_auth_skipped(&self, method: &Method, path: &str) -> bool {
        self.resolve(method, path)
            .is_some_and(|resolved| resolved.entry.skip_auth)
    }

    pub fn get(&self, key: &RouteKey) -> Option<&RouteEntry> {
        self.routes.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.routes.keys()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
