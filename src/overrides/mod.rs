//! Process-wide dependency override table, used chiefly by tests to
//! substitute implementations without touching calling code.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::graph::{Dependency, DependencyId};

static GLOBAL: Lazy<OverrideRegistry> = Lazy::new(OverrideRegistry::new);

/// Mutable mapping from an original dependency identity to a replacement
/// declaration.
///
/// Reads vastly outnumber writes (every graph build consults the table,
/// mutation happens only in configuration and test setup), so the map
/// sits behind a reader/writer lock. Registration affects subsequent
/// graph builds only; plans already built and cached keep the
/// declarations they were built with until they are rebuilt.
pub struct OverrideRegistry {
    map: RwLock<HashMap<DependencyId, Arc<Dependency>>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// The shared process-wide registry consulted by default builds.
    pub fn global() -> &'static OverrideRegistry {
        &GLOBAL
    }

    /// Registers a replacement for the given identity.
    pub fn register(&self, id: impl Into<DependencyId>, replacement: Arc<Dependency>) {
        let id = id.into();
        log::debug!("registering override for dependency '{}'", id);
        self.map.write().insert(id, replacement);
    }

    /// Removes one override, restoring the original declaration for
    /// subsequent builds.
    pub fn remove(&self, id: &DependencyId) -> bool {
        self.map.write().remove(id).is_some()
    }

    /// Removes every override.
    pub fn clear(&self) {
        log::debug!("clearing dependency overrides");
        self.map.write().clear();
    }

    pub fn lookup(&self, id: &DependencyId) -> Option<Arc<Dependency>> {
        self.map.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl Default for OverrideRegistry {
    fn default() -> Self {
        Self::new()
    }
}
