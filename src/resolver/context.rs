use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::errors::ResolveError;
use crate::graph::DependencyId;

type Cleanup = Box<dyn FnOnce() + Send + 'static>;
pub(crate) type CachedResult = Arc<OnceCell<Result<Value, ResolveError>>>;

/// Cooperative cancellation flag threaded through a resolution.
///
/// Cancelling stops the resolver at its next checkpoint; dependency
/// bodies can observe the flag through their [`Scope`] to stop early.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Handle a dependency body uses to tie resources to the request.
///
/// Deferred cleanups run when the owning [`ResolutionContext`] is closed
/// or dropped, in reverse registration order, whether the resolution
/// succeeded, failed or was cancelled.
#[derive(Clone)]
pub struct Scope {
    cleanups: Arc<Mutex<Vec<Cleanup>>>,
    cancel: CancelToken,
}

impl Scope {
    pub fn defer(&self, cleanup: impl FnOnce() + Send + 'static) {
        self.cleanups.lock().push(Box::new(cleanup));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self {
            cleanups: Arc::new(Mutex::new(Vec::new())),
            cancel: CancelToken::new(),
        }
    }
}

/// Per-request resolution state.
///
/// Holds the memoization cache that guarantees at-most-once execution
/// per dependency identity, the cleanup stack for scoped resources, and
/// the cancellation token. Created at the start of a request, never
/// shared across requests, and torn down when the request ends.
pub struct ResolutionContext {
    cache: Mutex<HashMap<DependencyId, CachedResult>>,
    cleanups: Arc<Mutex<Vec<Cleanup>>>,
    cancel: CancelToken,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::with_cancel(CancelToken::new())
    }

    /// Builds a context driven by an externally owned cancellation
    /// token, e.g. one tied to the enclosing request's deadline.
    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            cleanups: Arc::new(Mutex::new(Vec::new())),
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Registers a cleanup directly on the context.
    pub fn defer(&self, cleanup: impl FnOnce() + Send + 'static) {
        self.cleanups.lock().push(Box::new(cleanup));
    }

    pub(crate) fn scope(&self) -> Scope {
        Scope {
            cleanups: self.cleanups.clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub(crate) fn cell(&self, id: &DependencyId) -> CachedResult {
        self.cache.lock().entry(id.clone()).or_default().clone()
    }

    /// Whether an identity has reached a terminal state in this context.
    pub fn is_resolved(&self, id: &DependencyId) -> bool {
        self.cache
            .lock()
            .get(id)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    /// Runs every pending cleanup, releasing scoped resources.
    ///
    /// Dropping the context does the same; calling it explicitly makes
    /// teardown ordering visible at the call site.
    pub fn close(&self) {
        let mut pending = {
            let mut cleanups = self.cleanups.lock();
            std::mem::take(&mut *cleanups)
        };
        while let Some(cleanup) = pending.pop() {
            cleanup();
        }
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResolutionContext {
    fn drop(&mut self) {
        self.close();
    }
}
