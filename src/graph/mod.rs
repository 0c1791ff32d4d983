pub mod body;
pub mod builder;
pub mod types;

pub use body::{BodyKind, DependencyBody, Invocation};
pub use builder::DependencyNode;
pub use types::{Dependency, DependencyId, ParamSpec};

pub(crate) use builder::{GraphBuilder, NodeBinding, NodeParam};
pub(crate) use types::SourceSpec;
