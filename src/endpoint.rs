use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::{CycleError, ResolveError};
use crate::graph::{GraphBuilder, NodeParam, ParamSpec};
use crate::inputs::RawInputs;
use crate::overrides::OverrideRegistry;
use crate::resolver::{Args, ResolutionContext};

/// Entry-point declaration: a name and the parameters the handler wants
/// resolved before it runs.
#[derive(Debug)]
pub struct Endpoint {
    name: String,
    params: Vec<ParamSpec>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the dependency graph using the process-wide override
    /// registry.
    pub fn build(&self) -> Result<Plan, CycleError> {
        self.build_with(OverrideRegistry::global())
    }

    /// Builds the dependency graph against an explicit registry.
    pub fn build_with(&self, overrides: &OverrideRegistry) -> Result<Plan, CycleError> {
        log::debug!("building plan for endpoint '{}'", self.name);
        let mut builder = GraphBuilder::new(overrides);
        let params = builder.build_params(&self.params)?;
        Ok(Plan {
            name: self.name.clone(),
            params,
            slot_count: builder.finish(),
        })
    }
}

/// Built, immutable resolution plan for one entry point.
///
/// Plans are built once at registration time and reused for every
/// request; per-request state lives entirely in the
/// [`ResolutionContext`].
pub struct Plan {
    pub(crate) name: String,
    pub(crate) params: Vec<NodeParam>,
    pub(crate) slot_count: usize,
}

impl Plan {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the entry point's arguments for one request.
    pub async fn resolve(
        &self,
        inputs: &RawInputs,
        ctx: &ResolutionContext,
    ) -> Result<Args, ResolveError> {
        crate::resolver::execute(self, inputs, ctx).await
    }
}

impl std::fmt::Debug for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plan")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .field("slot_count", &self.slot_count)
            .finish()
    }
}

/// Per-route plan cache with lazy builds.
///
/// An override registered after a plan has been cached does not affect
/// that plan; callers needing a late override to take effect must
/// `invalidate` the route (or `clear` the cache) to force a fresh
/// build.
pub struct PlanCache {
    plans: RwLock<HashMap<String, Arc<Plan>>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached plan for the endpoint, building it on first
    /// use with the process-wide override registry.
    pub fn get_or_build(&self, endpoint: &Endpoint) -> Result<Arc<Plan>, CycleError> {
        if let Some(plan) = self.plans.read().get(endpoint.name()) {
            return Ok(plan.clone());
        }

        let plan = Arc::new(endpoint.build()?);
        let mut plans = self.plans.write();
        Ok(plans
            .entry(endpoint.name().to_string())
            .or_insert(plan)
            .clone())
    }

    /// Drops one cached plan so the next request rebuilds it.
    pub fn invalidate(&self, name: &str) -> bool {
        self.plans.write().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.plans.write().clear();
    }

    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new()
    }
}
