use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-family mutual exclusion around check-then-create sequences.
///
/// Only serializes commands handled by this process; other writers to the same
/// workspace are not excluded.
#[derive(Clone, Default)]
pub struct FamilyLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl FamilyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, family: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.inner.lock().await;
            slots
                .entry(family.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }
}
