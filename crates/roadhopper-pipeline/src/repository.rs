//! In-memory cache of computed routes keyed by [`RouteId`].
//!
//! Routes are stored behind `Arc` so readers can keep a route alive
//! after releasing the lock. Entries are never evicted or replaced.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::types::{Route, RouteId};

/// Thread-safe, append-only route store.
#[derive(Debug, Default)]
pub struct RouteRepository {
    routes: RwLock<HashMap<RouteId, Arc<Route>>>,
}

impl RouteRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `route` and return its identifier.
    ///
    /// If a route with the same identifier is already stored, the
    /// existing entry is kept.
    pub fn add(&self, route: Route) -> RouteId {
        let id = route.id();
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.entry(id).or_insert_with(|| {
            debug!("storing route {id} ({} segments)", route.len());
            Arc::new(route)
        });
        id
    }

    /// Whether a route with `id` is stored.
    #[must_use]
    pub fn has(&self, id: &RouteId) -> bool {
        self.read().contains_key(id)
    }

    /// The route stored under `id`.
    #[must_use]
    pub fn get(&self, id: &RouteId) -> Option<Arc<Route>> {
        self.read().get(id).cloned()
    }

    /// Number of stored routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no route is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking writer cannot leave a half-inserted entry, so a
    // poisoned lock is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<RouteId, Arc<Route>>> {
        self.routes.read().unwrap_or_else(PoisonError::into_inner)
    }
}
