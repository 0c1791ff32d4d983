use thiserror::Error;

use crate::binding::ValidationReport;
use crate::graph::DependencyId;

fn format_chain(chain: &[DependencyId]) -> String {
    chain
        .iter()
        .map(DependencyId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A dependency chain that refers back into itself.
///
/// Detected while a graph is being built, before any request is served.
/// The chain lists the identities along the offending path, ending with
/// the identity that closed the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cyclic dependency chain: {}", format_chain(.chain))]
pub struct CycleError {
    pub chain: Vec<DependencyId>,
}

/// Failure raised by a dependency body during invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BodyError {
    message: String,
}

impl BodyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for BodyError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for BodyError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Per-request resolution failure.
///
/// `Validation` carries the aggregated report for every failing parameter
/// in the plan; the other variants abort the request immediately.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("validation failed: {0}")]
    Validation(ValidationReport),

    #[error("dependency '{dependency}' failed: {message}")]
    Execution {
        dependency: DependencyId,
        message: String,
    },

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Whether this failure is a validation report rather than an
    /// execution-level abort.
    pub fn is_validation(&self) -> bool {
        matches!(self, ResolveError::Validation(_))
    }
}
