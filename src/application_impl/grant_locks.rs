use crate::domain_model::GrantKey;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per (user, client) pair. Consent, issuance, rotation and
/// revocation for a pair run under it; different pairs never contend.
#[derive(Default)]
pub struct GrantLocks {
    locks: DashMap<GrantKey, Arc<Mutex<()>>>,
}

impl GrantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &GrantKey) -> OwnedMutexGuard<()> {
        // The map guard must be released before awaiting the mutex.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }
}
