use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::CycleError;
use crate::graph::body::{BodyKind, DependencyBody};
use crate::graph::types::{Binding, Dependency, DependencyId, ParamSpec, SourceSpec};
use crate::overrides::OverrideRegistry;

/// Built, immutable form of a dependency declaration.
///
/// Nodes keep the *original* identity even when an override supplied the
/// body and parameters, so downstream caching and further overrides keep
/// working against the identity callers declared. Within one plan a
/// given identity is built once and shared by every referencing branch.
pub struct DependencyNode {
    pub(crate) id: DependencyId,
    pub(crate) slot: usize,
    pub(crate) kind: BodyKind,
    pub(crate) body: Arc<dyn DependencyBody>,
    pub(crate) params: Vec<NodeParam>,
}

impl DependencyNode {
    pub fn id(&self) -> &DependencyId {
        &self.id
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }
}

impl fmt::Debug for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyNode")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("kind", &self.kind)
            .field("params", &self.params.len())
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct NodeParam {
    pub(crate) name: String,
    pub(crate) binding: NodeBinding,
}

#[derive(Debug)]
pub(crate) enum NodeBinding {
    Depends(Arc<DependencyNode>),
    Source(SourceSpec),
}

/// Recursive expansion of declared parameters into a node graph.
///
/// Expansion is deterministic and side-effect-free: no dependency body
/// runs here. Overrides are substituted at every level, and a visiting
/// stack rejects any chain that reaches back into itself. Slot 0 is
/// reserved for the entry point's own parameter list.
pub(crate) struct GraphBuilder<'a> {
    overrides: &'a OverrideRegistry,
    visiting: Vec<DependencyId>,
    built: HashMap<DependencyId, Arc<DependencyNode>>,
    next_slot: usize,
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn new(overrides: &'a OverrideRegistry) -> Self {
        Self {
            overrides,
            visiting: Vec::new(),
            built: HashMap::new(),
            next_slot: 1,
        }
    }

    pub(crate) fn build_params(
        &mut self,
        params: &[ParamSpec],
    ) -> Result<Vec<NodeParam>, CycleError> {
        params
            .iter()
            .map(|param| {
                let binding = match param.binding() {
                    Binding::Source(spec) => NodeBinding::Source(spec.clone()),
                    Binding::Depends(dependency) => {
                        NodeBinding::Depends(self.build_node(dependency)?)
                    }
                };
                Ok(NodeParam {
                    name: param.name().to_string(),
                    binding,
                })
            })
            .collect()
    }

    fn build_node(&mut self, dependency: &Arc<Dependency>) -> Result<Arc<DependencyNode>, CycleError> {
        let id = dependency.id().clone();

        if let Some(node) = self.built.get(&id) {
            return Ok(node.clone());
        }
        if let Some(position) = self.visiting.iter().position(|visiting| *visiting == id) {
            let mut chain: Vec<DependencyId> = self.visiting[position..].to_vec();
            chain.push(id);
            return Err(CycleError { chain });
        }

        let target = match self.overrides.lookup(&id) {
            Some(replacement) => {
                log::debug!("override applied for dependency '{}'", id);
                replacement
            }
            None => dependency.clone(),
        };

        self.visiting.push(id.clone());
        let params = self.build_params(target.params())?;
        self.visiting.pop();

        let slot = self.next_slot;
        self.next_slot += 1;
        let node = Arc::new(DependencyNode {
            id: id.clone(),
            slot,
            kind: target.body().kind(),
            body: target.body().clone(),
            params,
        });
        self.built.insert(id, node.clone());
        Ok(node)
    }

    /// Total number of slots allocated, entry point included.
    pub(crate) fn finish(self) -> usize {
        self.next_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(id: &str) -> Arc<Dependency> {
        Dependency::function(id, |_| async { Ok(json!(null)) }).shared()
    }

    fn node_of(params: &[NodeParam], index: usize) -> &Arc<DependencyNode> {
        match &params[index].binding {
            NodeBinding::Depends(node) => node,
            NodeBinding::Source(_) => panic!("expected a sub-dependency binding"),
        }
    }

    #[test]
    fn test_build_expands_sub_dependencies() {
        let settings = leaf("settings");
        let repo = Dependency::function("repo", |_| async { Ok(json!("repo")) })
            .param(ParamSpec::depends("settings", &settings))
            .shared();

        let registry = OverrideRegistry::new();
        let mut builder = GraphBuilder::new(&registry);
        let params = builder
            .build_params(&[ParamSpec::depends("repo", &repo)])
            .unwrap();

        let repo_node = node_of(&params, 0);
        assert_eq!(repo_node.id(), &DependencyId::new("repo"));
        assert_eq!(repo_node.params.len(), 1);
        assert_eq!(node_of(&repo_node.params, 0).id(), &DependencyId::new("settings"));
        assert_eq!(builder.finish(), 3);
    }

    #[test]
    fn test_shared_dependency_builds_one_node() {
        let paged = Dependency::constructor("paged")
            .param(ParamSpec::query("skip").int().with_default(json!(0)))
            .shared();
        let left = Dependency::function("left", |_| async { Ok(json!(1)) })
            .param(ParamSpec::depends("paged", &paged))
            .shared();
        let right = Dependency::function("right", |_| async { Ok(json!(2)) })
            .param(ParamSpec::depends("paged", &paged))
            .shared();

        let registry = OverrideRegistry::new();
        let mut builder = GraphBuilder::new(&registry);
        let params = builder
            .build_params(&[
                ParamSpec::depends("left", &left),
                ParamSpec::depends("right", &right),
            ])
            .unwrap();

        let left_paged = node_of(&node_of(&params, 0).params, 0);
        let right_paged = node_of(&node_of(&params, 1).params, 0);
        assert!(Arc::ptr_eq(left_paged, right_paged));
    }

    #[test]
    fn test_self_dependency_rejected() {
        // Declarations can only refer to already-finished Arcs, so a
        // self-cycle is staged through an override.
        let base = leaf("a");
        let registry = OverrideRegistry::new();
        let replacement = Dependency::function("a_impl", |_| async { Ok(json!(null)) })
            .param(ParamSpec::depends("again", &base))
            .shared();
        registry.register("a", replacement);

        let mut builder = GraphBuilder::new(&registry);
        let error = builder
            .build_params(&[ParamSpec::depends("a", &base)])
            .unwrap_err();
        assert_eq!(
            error.chain,
            vec![DependencyId::new("a"), DependencyId::new("a")]
        );
    }

    #[test]
    fn test_two_step_cycle_rejected() {
        let a = leaf("a");
        let b = Dependency::function("b", |_| async { Ok(json!(null)) })
            .param(ParamSpec::depends("a", &a))
            .shared();

        let registry = OverrideRegistry::new();
        // Overriding a to depend on b closes the loop a -> b -> a.
        let a_replacement = Dependency::function("a_impl", |_| async { Ok(json!(null)) })
            .param(ParamSpec::depends("b", &b))
            .shared();
        registry.register("a", a_replacement);

        let mut builder = GraphBuilder::new(&registry);
        let error = builder
            .build_params(&[ParamSpec::depends("a", &a)])
            .unwrap_err();
        assert_eq!(error.to_string(), "cyclic dependency chain: a -> b -> a");
    }

    #[test]
    fn test_override_keeps_original_identity() {
        let real = Dependency::function("token", |_| async { Ok(json!("real")) }).shared();
        let registry = OverrideRegistry::new();
        registry.register(
            "token",
            Dependency::function("token_stub", |_| async { Ok(json!("stub")) }).shared(),
        );

        let mut builder = GraphBuilder::new(&registry);
        let params = builder
            .build_params(&[ParamSpec::depends("token", &real)])
            .unwrap();
        // Cache and override key stays the declared identity.
        assert_eq!(node_of(&params, 0).id(), &DependencyId::new("token"));
    }

    #[test]
    fn test_override_applies_to_nested_occurrences() {
        let settings = leaf("settings");
        let repo = Dependency::function("repo", |_| async { Ok(json!(null)) })
            .param(ParamSpec::depends("settings", &settings))
            .shared();

        let registry = OverrideRegistry::new();
        registry.register(
            "settings",
            Dependency::function("settings_stub", |_| async { Ok(json!("stub")) }).shared(),
        );

        let mut builder = GraphBuilder::new(&registry);
        let params = builder
            .build_params(&[
                ParamSpec::depends("repo", &repo),
                ParamSpec::depends("settings", &settings),
            ])
            .unwrap();

        let nested = node_of(&node_of(&params, 0).params, 0);
        let direct = node_of(&params, 1);
        assert!(Arc::ptr_eq(nested, direct));
        assert_eq!(nested.kind(), BodyKind::Function);
    }
}
