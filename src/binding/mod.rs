pub mod binder;
pub mod constraints;
pub mod report;

pub use constraints::{Constraints, ParamType};
pub use report::{ErrorKind, FieldError, ValidationReport};

pub(crate) use binder::{bind_plan, BoundValues};
