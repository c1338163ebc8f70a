//! Path-template matching for incoming routes.
//!
//! A route path like `/users/:id/orders` is compiled to an anchored regex:
//! each `:name` segment matches exactly one path component, literal
//! segments match exactly. Selection over a rule set is a linear scan in
//! authoring order; the first full match wins.

use crate::rules::IncomingRoute;
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

/// Compiled form of one route's path template.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    /// `None` when the template failed to compile; such a route never
    /// matches (reported once at compile time).
    regex: Option<Regex>,
}

impl RouteMatcher {
    /// Compile a `:name`-style template into an anchored matcher.
    pub fn compile(template: &str) -> Self {
        let pattern = template
            .split('/')
            .map(|segment| {
                if segment.len() > 1 && segment.starts_with(':') {
                    "([^/]+)".to_string()
                } else {
                    regex::escape(segment)
                }
            })
            .collect::<Vec<_>>()
            .join("/");

        let anchored = format!("^{pattern}$");
        let regex = match Regex::new(&anchored) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("invalid route path template {template:?}: {e}");
                None
            }
        };
        Self { regex }
    }

    /// Whole-path test; a template never matches a prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(path))
    }
}

/// An incoming route paired with its compiled path matcher.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub matcher: RouteMatcher,
    pub route: Arc<IncomingRoute>,
}

impl CompiledRoute {
    /// Method + path test against a concrete request line.
    pub fn matches(&self, method: &hyper::Method, path: &str) -> bool {
        self.route.method.matches(method) && self.matcher.matches(path)
    }
}

/// Compile a rule set's routes, preserving authoring order.
pub fn compile_routes(routes: &[IncomingRoute]) -> Vec<CompiledRoute> {
    routes
        .iter()
        .map(|route| CompiledRoute {
            matcher: RouteMatcher::compile(&route.path),
            route: Arc::new(route.clone()),
        })
        .collect()
}
