use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::binding::{Constraints, ParamType};
use crate::errors::BodyError;
use crate::graph::body::{ConstructorBody, DependencyBody, FunctionBody, Invocation};
use crate::inputs::Location;

/// Stable, comparable identity of a dependency declaration.
///
/// Two references to the same declaration carry the same identity; the
/// identity is the cache key within a request and the override key in
/// the registry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DependencyId(Arc<str>);

impl DependencyId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DependencyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DependencyId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyId({})", self.0)
    }
}

/// Declaration of a unit of work plus the parameters it needs.
///
/// Parameters are declared in invocation order and may themselves be
/// sub-dependencies or raw-source bindings. Declarations are shared via
/// `Arc` so that one dependency can appear in several graphs and in
/// several branches of the same graph under a single identity.
pub struct Dependency {
    id: DependencyId,
    body: Arc<dyn DependencyBody>,
    params: Vec<ParamSpec>,
}

impl Dependency {
    /// Declares a function dependency backed by an async closure.
    pub fn function<F, Fut>(id: impl Into<DependencyId>, handler: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BodyError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            body: Arc::new(FunctionBody::new(handler)),
            params: Vec::new(),
        }
    }

    /// Declares a constructor dependency whose resolved value is an
    /// object built from its named parameters.
    pub fn constructor(id: impl Into<DependencyId>) -> Self {
        Self {
            id: id.into(),
            body: Arc::new(ConstructorBody),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn id(&self) -> &DependencyId {
        &self.id
    }

    /// Finishes the declaration for sharing across parameter lists.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn body(&self) -> &Arc<dyn DependencyBody> {
        &self.body
    }

    pub(crate) fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("id", &self.id)
            .field("kind", &self.body.kind())
            .field("params", &self.params.len())
            .finish()
    }
}

/// One declared parameter of a dependency or entry point.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    binding: Binding,
}

#[derive(Clone)]
pub(crate) enum Binding {
    Depends(Arc<Dependency>),
    Source(SourceSpec),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Depends(dep) => write!(f, "Depends({})", dep.id()),
            Binding::Source(spec) => write!(f, "Source({:?})", spec.lookups),
        }
    }
}

/// Raw-source binding: where to look, what type to coerce to, and which
/// constraints to apply.
#[derive(Debug, Clone)]
pub(crate) struct SourceSpec {
    pub(crate) lookups: Vec<(Location, String)>,
    pub(crate) ty: ParamType,
    pub(crate) constraints: Constraints,
    pub(crate) default: Option<Value>,
    pub(crate) optional: bool,
}

impl ParamSpec {
    /// Binds the parameter to a sub-dependency.
    pub fn depends(name: impl Into<String>, dependency: &Arc<Dependency>) -> Self {
        Self {
            name: name.into(),
            binding: Binding::Depends(dependency.clone()),
        }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::source(name, Location::Path)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::source(name, Location::Query)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::source(name, Location::Header)
    }

    pub fn cookie(name: impl Into<String>) -> Self {
        Self::source(name, Location::Cookie)
    }

    pub fn body_field(name: impl Into<String>) -> Self {
        Self::source(name, Location::Body)
    }

    fn source(name: impl Into<String>, location: Location) -> Self {
        let name = name.into();
        Self {
            binding: Binding::Source(SourceSpec {
                lookups: vec![(location, name.clone())],
                ty: ParamType::default(),
                constraints: Constraints::default(),
                default: None,
                optional: false,
            }),
            name,
        }
    }

    /// Renames the primary lookup without renaming the parameter.
    pub fn alias(self, source_name: impl Into<String>) -> Self {
        let name = source_name.into();
        self.map_source(|spec| {
            if let Some(first) = spec.lookups.first_mut() {
                first.1 = name;
            }
        })
    }

    /// Adds a query fallback tried after the earlier lookups.
    pub fn or_query(self, name: impl Into<String>) -> Self {
        self.push_lookup(Location::Query, name.into())
    }

    /// Adds a cookie fallback tried after the earlier lookups.
    pub fn or_cookie(self, name: impl Into<String>) -> Self {
        self.push_lookup(Location::Cookie, name.into())
    }

    /// Adds a header fallback tried after the earlier lookups.
    pub fn or_header(self, name: impl Into<String>) -> Self {
        self.push_lookup(Location::Header, name.into())
    }

    pub fn int(self) -> Self {
        self.map_source(|spec| spec.ty = ParamType::Int)
    }

    pub fn float(self) -> Self {
        self.map_source(|spec| spec.ty = ParamType::Float)
    }

    pub fn boolean(self) -> Self {
        self.map_source(|spec| spec.ty = ParamType::Bool)
    }

    pub fn json(self) -> Self {
        self.map_source(|spec| spec.ty = ParamType::Json)
    }

    pub fn gt(self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        self.map_source(|spec| spec.constraints.gt = Some(bound))
    }

    pub fn ge(self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        self.map_source(|spec| spec.constraints.ge = Some(bound))
    }

    pub fn lt(self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        self.map_source(|spec| spec.constraints.lt = Some(bound))
    }

    pub fn le(self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        self.map_source(|spec| spec.constraints.le = Some(bound))
    }

    pub fn min_length(self, length: usize) -> Self {
        self.map_source(|spec| spec.constraints.min_length = Some(length))
    }

    pub fn max_length(self, length: usize) -> Self {
        self.map_source(|spec| spec.constraints.max_length = Some(length))
    }

    /// Declares a default used when no lookup matches.
    pub fn with_default(self, value: Value) -> Self {
        self.map_source(|spec| spec.default = Some(value))
    }

    /// Marks the parameter optional; absent resolves to `Null`.
    pub fn optional(self) -> Self {
        self.map_source(|spec| spec.optional = true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn binding(&self) -> &Binding {
        &self.binding
    }

    // Source modifiers are meaningful only for raw-source bindings and
    // leave sub-dependency parameters untouched.
    fn map_source(mut self, apply: impl FnOnce(&mut SourceSpec)) -> Self {
        if let Binding::Source(spec) = &mut self.binding {
            apply(spec);
        }
        self
    }

    fn push_lookup(self, location: Location, name: String) -> Self {
        self.map_source(|spec| spec.lookups.push((location, name)))
    }

    #[cfg(test)]
    pub(crate) fn into_source(self) -> Option<SourceSpec> {
        match self.binding {
            Binding::Source(spec) => Some(spec),
            Binding::Depends(_) => None,
        }
    }
}
