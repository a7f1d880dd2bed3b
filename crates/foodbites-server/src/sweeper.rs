//! Periodic removal of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use foodbites_memory::{InMemorySessionStore, PgSessionStore};

/// The store the sweeper purges.
pub enum SweepTarget {
    Memory(Arc<InMemorySessionStore>),
    Postgres(Arc<PgSessionStore>),
}

impl SweepTarget {
    /// Purge once; returns how many sessions were removed.
    pub async fn sweep(&self) -> u64 {
        match self {
            SweepTarget::Memory(store) => store.purge_expired() as u64,
            SweepTarget::Postgres(store) => match store.purge_expired().await {
                Ok(removed) => removed,
                Err(e) => {
                    warn!(error = %e, "session sweep failed");
                    0
                }
            },
        }
    }
}

/// Run [`SweepTarget::sweep`] every `every` until the task is aborted.
pub fn spawn(target: SweepTarget, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = target.sweep().await;
            if removed > 0 {
                debug!(removed, "expired sessions swept");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodbites_types::traits::SessionStore;
    use foodbites_types::SessionState;

    #[tokio::test]
    async fn test_memory_sweep_removes_expired() {
        let store = Arc::new(InMemorySessionStore::new());
        store
            .put("gone", &SessionState::default(), Duration::from_millis(10))
            .await
            .unwrap();
        store
            .put("kept", &SessionState::default(), Duration::from_secs(600))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let target = SweepTarget::Memory(store.clone());
        assert_eq!(target.sweep().await, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_spawned_sweeper_runs() {
        let store = Arc::new(InMemorySessionStore::new());
        store
            .put("gone", &SessionState::default(), Duration::from_millis(10))
            .await
            .unwrap();

        let handle = spawn(SweepTarget::Memory(store.clone()), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        assert!(store.is_empty());
    }
}
