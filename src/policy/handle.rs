//! Runtime-replaceable logging policy.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::policy::LoggingPolicy;

/// Shared, atomically replaceable logging policy.
#[derive(Clone)]
pub struct PolicyHandle {
    inner: Arc<ArcSwap<LoggingPolicy>>,
}

impl PolicyHandle {
    pub fn new(policy: LoggingPolicy) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(policy)),
        }
    }

    /// Current policy. Requests hold on to the snapshot they started with.
    pub fn load(&self) -> Arc<LoggingPolicy> {
        self.inner.load_full()
    }

    /// Swap in a new policy for requests that start afterwards.
    pub fn replace(&self, policy: LoggingPolicy) {
        self.inner.store(Arc::new(policy));
    }
}
