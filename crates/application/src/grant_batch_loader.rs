//! Request-scoped batching of grant lookups.
//!
//! Concurrent `load` calls issued from the same request are coalesced into a
//! single `GrantRepository::find_grants` round trip. A loader is built fresh
//! for every inbound request; its memo is never shared across requests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use leasewell_core::{AppError, AppResult};
use leasewell_domain::{GrantKey, RoleFeaturePermission};
use tokio::sync::{Mutex, oneshot};
use tracing::debug;

use crate::GrantRepository;

type GrantReply = oneshot::Sender<AppResult<Option<RoleFeaturePermission>>>;

#[derive(Default)]
struct PendingBatch {
    keys: Vec<GrantKey>,
    seen: HashSet<GrantKey>,
    waiters: Vec<(GrantKey, GrantReply)>,
}

/// Coalesces concurrent grant lookups into one store query.
pub struct GrantBatchLoader {
    repository: Arc<dyn GrantRepository>,
    pending: Mutex<PendingBatch>,
    resolved: Mutex<HashMap<GrantKey, Option<RoleFeaturePermission>>>,
}

impl GrantBatchLoader {
    /// Creates an empty loader for one request.
    #[must_use]
    pub fn new(repository: Arc<dyn GrantRepository>) -> Self {
        Self {
            repository,
            pending: Mutex::new(PendingBatch::default()),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the grant for one key, or `None` when the role lacks it.
    pub async fn load(&self, key: GrantKey) -> AppResult<Option<RoleFeaturePermission>> {
        if let Some(grant) = self.resolved.lock().await.get(&key) {
            return Ok(grant.clone());
        }

        let (reply, receiver) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.seen.insert(key) {
                pending.keys.push(key);
            }
            pending.waiters.push((key, reply));
        }

        // Let sibling lookups of this tick join the batch before it is sent.
        tokio::task::yield_now().await;
        self.dispatch().await;

        receiver.await.map_err(|_| {
            AppError::Internal("grant batch was dropped before it completed".to_owned())
        })?
    }

    /// Loads many keys at once. Results line up with `keys` by position.
    pub async fn load_many(
        &self,
        keys: &[GrantKey],
    ) -> AppResult<Vec<Option<RoleFeaturePermission>>> {
        join_all(keys.iter().map(|key| self.load(*key)))
            .await
            .into_iter()
            .collect()
    }

    async fn dispatch(&self) {
        let batch = std::mem::take(&mut *self.pending.lock().await);
        if batch.waiters.is_empty() {
            return;
        }

        debug!(
            keys = batch.keys.len(),
            waiters = batch.waiters.len(),
            "dispatching grant batch"
        );

        match self.repository.find_grants(&batch.keys).await {
            Ok(rows) => {
                let by_key = rows
                    .into_iter()
                    .map(|row| (row.key(), row))
                    .collect::<HashMap<_, _>>();

                {
                    let mut resolved = self.resolved.lock().await;
                    for key in &batch.keys {
                        resolved.insert(*key, by_key.get(key).cloned());
                    }
                }

                for (key, reply) in batch.waiters {
                    let _ = reply.send(Ok(by_key.get(&key).cloned()));
                }
            }
            Err(error) => {
                for (_, reply) in batch.waiters {
                    let _ = reply.send(Err(error.clone()));
                }
            }
        }
    }
}
