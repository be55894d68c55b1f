//! Exclusive Scope Module
//!
//! Per-id async locks for callers that embed the engines.
//!
//! The AVL and set engines take no locks: each operation is a chain of
//! store round-trips, and two chains interleaving on the same tree or set
//! corrupt its links. Callers that may issue concurrent operations hold a
//! [`ScopeGuard`] for the tree prefix or set id across each operation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-scope async mutexes
///
/// Cloning shares the registry.
#[derive(Debug, Default, Clone)]
pub struct ScopeLocks {
    scopes: Arc<Mutex<HashMap<Vec<u8>, Arc<AsyncMutex<()>>>>>,
}

/// Exclusive hold on one scope; released on drop
#[derive(Debug)]
pub struct ScopeGuard {
    scope: Vec<u8>,
    _guard: OwnedMutexGuard<()>,
}

impl ScopeGuard {
    pub fn scope(&self) -> &[u8] {
        &self.scope
    }
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `scope` is free and take it
    pub async fn acquire(&self, scope: &[u8]) -> ScopeGuard {
        let lock = self.scope_lock(scope);
        ScopeGuard {
            scope: scope.to_vec(),
            _guard: lock.lock_owned().await,
        }
    }

    /// Take `scope` only if nobody holds it
    pub fn try_acquire(&self, scope: &[u8]) -> Option<ScopeGuard> {
        let lock = self.scope_lock(scope);
        lock.try_lock_owned().ok().map(|guard| ScopeGuard {
            scope: scope.to_vec(),
            _guard: guard,
        })
    }

    /// Number of scopes currently tracked (held or awaited)
    pub fn tracked_scopes(&self) -> usize {
        let mut scopes = self.scopes.lock();
        Self::prune(&mut scopes);
        scopes.len()
    }

    fn scope_lock(&self, scope: &[u8]) -> Arc<AsyncMutex<()>> {
        let mut scopes = self.scopes.lock();
        Self::prune(&mut scopes);
        Arc::clone(scopes.entry(scope.to_vec()).or_default())
    }

    /// Drop entries nobody holds or waits on
    fn prune(scopes: &mut HashMap<Vec<u8>, Arc<AsyncMutex<()>>>) {
        scopes.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
