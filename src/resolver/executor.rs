use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use serde_json::Value;

use crate::binding::{bind_plan, BoundValues};
use crate::endpoint::Plan;
use crate::errors::{CycleError, ResolveError};
use crate::graph::{DependencyId, DependencyNode, Invocation, NodeBinding, NodeParam};
use crate::inputs::RawInputs;
use crate::resolver::context::ResolutionContext;
use crate::resolver::types::Args;

/// Resolves every entry-point parameter of a plan against one request's
/// inputs.
///
/// Raw-source parameters across the whole graph are bound and validated
/// up front so that every failing field lands in a single report; only a
/// fully valid request executes any dependency body. Sibling branches
/// resolve concurrently, and the final argument list follows declaration
/// order no matter which branch finished first.
pub(crate) async fn execute(
    plan: &Plan,
    inputs: &RawInputs,
    ctx: &ResolutionContext,
) -> Result<Args, ResolveError> {
    if ctx.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }

    let bound = bind_plan(plan, inputs).map_err(ResolveError::Validation)?;
    let values = resolve_params(&plan.params, 0, ctx, &bound, &[]).await?;
    if ctx.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }

    let names = plan.params.iter().map(|param| param.name.clone());
    Ok(Args::new(names.zip(values).collect()))
}

async fn resolve_params(
    params: &[NodeParam],
    slot: usize,
    ctx: &ResolutionContext,
    bound: &BoundValues,
    path: &[DependencyId],
) -> Result<Vec<Value>, ResolveError> {
    try_join_all(params.iter().enumerate().map(|(index, param)| async move {
        match &param.binding {
            NodeBinding::Source(_) => Ok(bound.get(slot, index).clone()),
            NodeBinding::Depends(node) => resolve_node(node, ctx, bound, path).await,
        }
    }))
    .await
}

/// Resolves one dependency node, memoized per identity.
///
/// The first requester executes the body; every other requester, from
/// any branch, awaits and shares the same terminal result. The `path`
/// is the chain of identities currently executing above this call and
/// backs the runtime cycle safety net; build-time detection is the
/// primary guard.
fn resolve_node<'a>(
    node: &'a Arc<DependencyNode>,
    ctx: &'a ResolutionContext,
    bound: &'a BoundValues,
    path: &'a [DependencyId],
) -> BoxFuture<'a, Result<Value, ResolveError>> {
    Box::pin(async move {
        if ctx.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        if let Some(position) = path.iter().position(|visiting| *visiting == node.id) {
            let mut chain: Vec<DependencyId> = path[position..].to_vec();
            chain.push(node.id.clone());
            return Err(ResolveError::Cycle(CycleError { chain }));
        }

        let cell = ctx.cell(&node.id);
        let result = cell
            .get_or_init(|| async {
                log::trace!("resolving dependency '{}'", node.id);
                invoke_node(node, ctx, bound, path).await
            })
            .await;
        result.clone()
    })
}

async fn invoke_node(
    node: &Arc<DependencyNode>,
    ctx: &ResolutionContext,
    bound: &BoundValues,
    path: &[DependencyId],
) -> Result<Value, ResolveError> {
    let mut chain = Vec::with_capacity(path.len() + 1);
    chain.extend_from_slice(path);
    chain.push(node.id.clone());

    let values = resolve_params(&node.params, node.slot, ctx, bound, &chain).await?;
    if ctx.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }

    let names = node.params.iter().map(|param| param.name.clone());
    let invocation = Invocation::new(names.zip(values).collect(), ctx.scope());
    node.body.invoke(invocation).await.map_err(|error| {
        log::warn!("dependency '{}' failed: {}", node.id, error);
        ResolveError::Execution {
            dependency: node.id.clone(),
            message: error.to_string(),
        }
    })
}
