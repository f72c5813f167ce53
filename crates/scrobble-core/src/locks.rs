use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One async mutex per identity id.
///
/// Entries are created on first use and never removed, so memory grows with
/// the number of distinct ids seen.
#[derive(Debug, Default)]
pub struct IdentityLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(id.to_string()).or_default().clone()
    }

    /// Run `f` while holding the lock for `id`. Work for different ids runs
    /// concurrently; work for the same id runs one at a time.
    pub async fn with_lock<F, Fut, T>(&self, id: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;
        f().await
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
