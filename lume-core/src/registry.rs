//! Process-wide backend registry.
//!
//! Grounded on `original_source/gfx/src/backend/Manager.cpp`'s
//! `BackendManager` singleton: a refcounted `BackendId -> implementation`
//! table guarded by one mutex, plus a second map from every live handle's
//! address to the backend that owns it. Realized here with
//! `parking_lot::RwLock` rather than a plain mutex since `lookup` (read-only,
//! hot-path) vastly outnumbers `wrap`/`unwrap` (write, only on
//! create/destroy) — the same read/write split `wgpu-hal` uses its
//! `parking_lot` dependency for.

use crate::backend::Backend;
use crate::error::{LumeError, LumeResult};
use crate::handle::{Id, RawKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifies which backend family produced a handle. Distinct from the
/// `RendererBackend` enum applications select at `Instance` creation time:
/// this one is used purely as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendId(pub(crate) u32);

struct BackendSlot {
    implementation: Arc<dyn Backend>,
    refcount: usize,
}

/// The process-wide registry. Applications never construct one directly;
/// `Registry::global()` returns the single process-wide instance.
pub struct Registry {
    backends: RwLock<HashMap<BackendId, BackendSlot>>,
    handles: RwLock<HashMap<RawKey, BackendId>>,
    next_backend_id: parking_lot::Mutex<u32>,
}

impl Registry {
    fn new() -> Self {
        Registry {
            backends: RwLock::new(HashMap::new()),
            handles: RwLock::new(HashMap::new()),
            next_backend_id: parking_lot::Mutex::new(1),
        }
    }

    pub fn global() -> &'static Registry {
        static REGISTRY: std::sync::OnceLock<Registry> = std::sync::OnceLock::new();
        REGISTRY.get_or_init(Registry::new)
    }

    /// Reserve a fresh `BackendId` for a not-yet-loaded backend implementation.
    pub fn reserve_backend_id(&self) -> BackendId {
        let mut next = self.next_backend_id.lock();
        let id = BackendId(*next);
        *next += 1;
        id
    }

    /// Install `implementation` under `id`, or bump its refcount if already
    /// loaded. Idempotent, matching `Manager.cpp`'s `loadBackend`.
    pub fn load_backend(&self, id: BackendId, implementation: Arc<dyn Backend>) {
        let mut backends = self.backends.write();
        backends
            .entry(id)
            .and_modify(|slot| slot.refcount += 1)
            .or_insert(BackendSlot {
                implementation,
                refcount: 1,
            });
    }

    /// Drop one reference to the backend under `id`; evicts it once the
    /// refcount reaches zero. Unloading an id that was never loaded is a
    /// silent no-op (destroy-on-null-handle idempotence, §7).
    pub fn unload_backend(&self, id: BackendId) {
        let mut backends = self.backends.write();
        let mut evict = false;
        if let Some(slot) = backends.get_mut(&id) {
            slot.refcount = slot.refcount.saturating_sub(1);
            evict = slot.refcount == 0;
        }
        if evict {
            backends.remove(&id);
        }
    }

    /// Register `handle` as owned by `backend`. Constant-time insert, per
    /// §4.1's `wrap`.
    pub fn wrap<T>(&self, handle: Id<T>, backend: BackendId) {
        self.handles.write().insert(handle.raw_key(), backend);
    }

    /// Remove `handle`'s association. Unwrapping an already-absent handle is
    /// a silent no-op.
    pub fn unwrap<T>(&self, handle: Id<T>) {
        self.handles.write().remove(&handle.raw_key());
    }

    /// O(1) dispatch: resolve `handle` to its owning backend implementation.
    /// An unregistered handle is the registry's sentinel error, `InvalidArgument`.
    pub fn lookup<T>(&self, handle: Id<T>) -> LumeResult<Arc<dyn Backend>> {
        let backend_id = *self
            .handles
            .read()
            .get(&handle.raw_key())
            .ok_or_else(|| LumeError::invalid("handle not registered"))?;
        self.backends
            .read()
            .get(&backend_id)
            .map(|slot| slot.implementation.clone())
            .ok_or(LumeError::BackendNotLoaded)
    }

    /// Like [`Registry::lookup`] but also returns the resolved `BackendId`,
    /// for callers (P2) that need to assert `registry.lookup(h).backend_id == b`.
    pub fn lookup_with_id<T>(&self, handle: Id<T>) -> LumeResult<(BackendId, Arc<dyn Backend>)> {
        let backend_id = *self
            .handles
            .read()
            .get(&handle.raw_key())
            .ok_or_else(|| LumeError::invalid("handle not registered"))?;
        let implementation = self
            .backends
            .read()
            .get(&backend_id)
            .map(|slot| slot.implementation.clone())
            .ok_or(LumeError::BackendNotLoaded)?;
        Ok((backend_id, implementation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests_support::NullBackend;

    struct MarkerBuf;

    #[test]
    fn load_unload_round_trips_to_absent() {
        let registry = Registry::new();
        let id = registry.reserve_backend_id();
        let backend: Arc<dyn Backend> = Arc::new(NullBackend);
        registry.load_backend(id, backend.clone());
        registry.load_backend(id, backend);
        registry.unload_backend(id);
        assert!(registry.backends.read().contains_key(&id));
        registry.unload_backend(id);
        assert!(!registry.backends.read().contains_key(&id));
    }

    #[test]
    fn lookup_unregistered_handle_is_invalid_argument() {
        let registry = Registry::new();
        let handle: Id<MarkerBuf> = Id::alloc();
        let err = registry.lookup(handle).unwrap_err();
        assert!(matches!(err, LumeError::InvalidArgument(_)));
    }

    #[test]
    fn wrap_then_lookup_resolves_backend() {
        let registry = Registry::new();
        let id = registry.reserve_backend_id();
        registry.load_backend(id, Arc::new(NullBackend));
        let handle: Id<MarkerBuf> = Id::alloc();
        registry.wrap(handle, id);
        let (resolved, _) = registry.lookup_with_id(handle).unwrap();
        assert_eq!(resolved, id);
        registry.unwrap(handle);
        assert!(registry.lookup(handle).is_err());
    }
}
