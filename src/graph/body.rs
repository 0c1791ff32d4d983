use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::errors::BodyError;
use crate::resolver::Scope;

/// Which shape of unit of work a dependency wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Function,
    Constructor,
}

/// Resolved arguments handed to a dependency body, in declaration order,
/// plus the request scope for deferring cleanup and observing
/// cancellation.
pub struct Invocation {
    args: Vec<(String, Value)>,
    scope: Scope,
}

impl Invocation {
    pub(crate) fn new(args: Vec<(String, Value)>, scope: Scope) -> Self {
        Self { args, scope }
    }

    /// Looks an argument up by parameter name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|(arg_name, _)| arg_name == name)
            .map(|(_, value)| value)
    }

    /// Looks an argument up by declaration position.
    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.args.get(index).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn into_args(self) -> Vec<(String, Value)> {
        self.args
    }
}

/// Uniform invocation contract for dependency bodies.
///
/// The engine never inspects what a body does; it feeds resolved
/// arguments in and takes one value (or failure) out.
pub trait DependencyBody: Send + Sync {
    fn kind(&self) -> BodyKind;

    fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, Result<Value, BodyError>>;
}

type Handler =
    Box<dyn Fn(Invocation) -> BoxFuture<'static, Result<Value, BodyError>> + Send + Sync>;

/// Body backed by an async closure.
pub(crate) struct FunctionBody {
    handler: Handler,
}

impl FunctionBody {
    pub(crate) fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, BodyError>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |invocation| Box::pin(handler(invocation))),
        }
    }
}

impl DependencyBody for FunctionBody {
    fn kind(&self) -> BodyKind {
        BodyKind::Function
    }

    fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, Result<Value, BodyError>> {
        (self.handler)(invocation)
    }
}

/// Body that assembles an object from its named arguments, standing in
/// for stateful-object construction.
pub(crate) struct ConstructorBody;

impl DependencyBody for ConstructorBody {
    fn kind(&self) -> BodyKind {
        BodyKind::Constructor
    }

    fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, Result<Value, BodyError>> {
        let fields: Map<String, Value> = invocation.into_args().into_iter().collect();
        Box::pin(futures::future::ready(Ok(Value::Object(fields))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invocation(args: Vec<(String, Value)>) -> Invocation {
        Invocation::new(args, Scope::detached())
    }

    #[tokio::test]
    async fn test_function_body_invokes_handler() {
        let body = FunctionBody::new(|inv: Invocation| async move {
            let skip = inv.arg("skip").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(skip * 2))
        });
        assert_eq!(body.kind(), BodyKind::Function);

        let result = body
            .invoke(invocation(vec![("skip".to_string(), json!(21))]))
            .await
            .unwrap();
        assert_eq!(result, json!(42));
    }

    #[tokio::test]
    async fn test_constructor_body_builds_object() {
        let body = ConstructorBody;
        assert_eq!(body.kind(), BodyKind::Constructor);

        let result = body
            .invoke(invocation(vec![
                ("skip".to_string(), json!(5)),
                ("limit".to_string(), json!(100)),
            ]))
            .await
            .unwrap();
        assert_eq!(result, json!({"skip": 5, "limit": 100}));
    }

    #[tokio::test]
    async fn test_function_body_propagates_failure() {
        let body = FunctionBody::new(|_| async { Err(BodyError::new("boom")) });
        let error = body.invoke(invocation(Vec::new())).await.unwrap_err();
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_invocation_positional_access() {
        let inv = invocation(vec![
            ("a".to_string(), json!(1)),
            ("b".to_string(), json!(2)),
        ]);
        assert_eq!(inv.positional(1), Some(&json!(2)));
        assert_eq!(inv.positional(2), None);
        assert_eq!(inv.len(), 2);
    }
}
