//! Active rule-set snapshot with atomic replacement.
//!
//! The authoring layer pushes complete rule sets; the store compiles each
//! one and swaps it in whole. A request clones the `Arc` once and sees a
//! single consistent snapshot for its entire lifetime, never a partially
//! updated mix.

use super::types::{Mapping, OutgoingRoute, RuleSet};
use crate::matcher::{compile_routes, CompiledRoute};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A rule set compiled for dispatch: routes with prepared path matchers,
/// mappings and outgoing routes indexed by id.
pub struct CompiledRuleSet {
    /// The uncompiled snapshot, as pushed (served back by the admin API).
    pub rules: Arc<RuleSet>,
    pub routes: Vec<CompiledRoute>,
    mappings: HashMap<String, Arc<Mapping>>,
    outgoing: HashMap<String, Arc<OutgoingRoute>>,
}

impl CompiledRuleSet {
    pub fn compile(rules: RuleSet) -> Self {
        let routes = compile_routes(&rules.incoming_routes);
        let mappings = rules
            .mappings
            .iter()
            .map(|m| (m.id.clone(), Arc::new(m.clone())))
            .collect();
        let outgoing = rules
            .outgoing_routes
            .iter()
            .map(|r| (r.id.clone(), Arc::new(r.clone())))
            .collect();
        Self {
            rules: Arc::new(rules),
            routes,
            mappings,
            outgoing,
        }
    }

    pub fn mapping(&self, id: &str) -> Option<&Arc<Mapping>> {
        self.mappings.get(id)
    }

    pub fn outgoing_route(&self, id: &str) -> Option<&Arc<OutgoingRoute>> {
        self.outgoing.get(id)
    }
}

/// Holder of the active snapshot.
pub struct RuleStore {
    active: RwLock<Arc<CompiledRuleSet>>,
}

impl RuleStore {
    /// Start with an empty rule set (every request is a 404 until the
    /// authoring layer pushes one).
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Arc::new(CompiledRuleSet::compile(RuleSet::default()))),
        }
    }

    /// Compile and atomically swap in a complete snapshot.
    pub fn replace(&self, rules: RuleSet) {
        let compiled = Arc::new(CompiledRuleSet::compile(rules));
        info!(
            mappings = compiled.rules.mappings.len(),
            incoming_routes = compiled.rules.incoming_routes.len(),
            outgoing_routes = compiled.rules.outgoing_routes.len(),
            "rule set replaced"
        );
        *self.active.write() = compiled;
    }

    /// The current snapshot. The lock is held only for the clone; in-flight
    /// requests keep their snapshot across a concurrent `replace`.
    pub fn snapshot(&self) -> Arc<CompiledRuleSet> {
        Arc::clone(&self.active.read())
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{IncomingRoute, OutgoingAuth, ResponseMode, RouteMethod};

    fn rule_set(route_ids: &[&str]) -> RuleSet {
        RuleSet {
            mappings: vec![Mapping {
                id: "m1".into(),
                name: String::new(),
                datamap: Vec::new(),
            }],
            incoming_routes: route_ids
                .iter()
                .map(|id| IncomingRoute {
                    id: id.to_string(),
                    name: String::new(),
                    path: "/x".into(),
                    method: RouteMethod::Any,
                    conditions: Default::default(),
                    authentication: Default::default(),
                    response_mode: ResponseMode::Mock,
                    outgoing_route_id: None,
                    mock_status: 200,
                    mock_headers: Vec::new(),
                    mock_body: String::new(),
                })
                .collect(),
            outgoing_routes: vec![OutgoingRoute {
                id: "o1".into(),
                name: String::new(),
                target_url: "http://upstream.test".into(),
                mapping_id: None,
                egress_transforms: Vec::new(),
                authentication: OutgoingAuth::None,
            }],
        }
    }

    #[test]
    fn test_compile_indexes_by_id() {
        let compiled = CompiledRuleSet::compile(rule_set(&["r1"]));
        assert!(compiled.mapping("m1").is_some());
        assert!(compiled.mapping("nope").is_none());
        assert!(compiled.outgoing_route("o1").is_some());
        assert!(compiled.outgoing_route("nope").is_none());
    }

    #[test]
    fn test_store_starts_empty() {
        let store = RuleStore::new();
        assert!(store.snapshot().routes.is_empty());
    }

    #[test]
    fn test_replace_swaps_whole_snapshot() {
        let store = RuleStore::new();
        store.replace(rule_set(&["r1", "r2"]));
        assert_eq!(store.snapshot().routes.len(), 2);

        store.replace(rule_set(&["r3"]));
        let after = store.snapshot();
        assert_eq!(after.routes.len(), 1);
        assert_eq!(after.routes[0].route.id, "r3");
    }

    #[test]
    fn test_in_flight_snapshot_survives_replace() {
        let store = RuleStore::new();
        store.replace(rule_set(&["r1"]));

        let held = store.snapshot();
        store.replace(rule_set(&["r2", "r3"]));

        // The held snapshot still sees the old rule set in full.
        assert_eq!(held.routes.len(), 1);
        assert_eq!(held.routes[0].route.id, "r1");
        assert_eq!(store.snapshot().routes.len(), 2);
    }
}
