pub use crate::binding::{Constraints, ErrorKind, FieldError, ParamType, ValidationReport};
pub use crate::endpoint::{Endpoint, Plan, PlanCache};
pub use crate::errors::{BodyError, CycleError, ResolveError};
pub use crate::graph::{
    BodyKind, Dependency, DependencyBody, DependencyId, DependencyNode, Invocation, ParamSpec,
};
pub use crate::inputs::{
    parse_cookie_header, parse_json_body, parse_query_string, Location, RawInputs, RawValue,
};
pub use crate::overrides::OverrideRegistry;
pub use crate::resolver::{Args, CancelToken, ResolutionContext, Scope};
