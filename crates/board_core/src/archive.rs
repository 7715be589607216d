use std::collections::HashSet;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use shared::domain::OrderId;

/// On-device persistence for the per-scope archived-order set. Never talks
/// to the remote backend.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn load(&self, scope: &str) -> Result<HashSet<OrderId>>;
    async fn save(&self, scope: &str, ids: &HashSet<OrderId>) -> Result<()>;
}

pub struct MissingArchiveStore;

#[async_trait]
impl ArchiveStore for MissingArchiveStore {
    async fn load(&self, scope: &str) -> Result<HashSet<OrderId>> {
        Err(anyhow!("archive store is unavailable for scope '{scope}'"))
    }

    async fn save(&self, scope: &str, _ids: &HashSet<OrderId>) -> Result<()> {
        Err(anyhow!("archive store is unavailable for scope '{scope}'"))
    }
}

#[async_trait]
impl ArchiveStore for storage::Storage {
    async fn load(&self, scope: &str) -> Result<HashSet<OrderId>> {
        self.load_archived_orders(scope).await
    }

    async fn save(&self, scope: &str, ids: &HashSet<OrderId>) -> Result<()> {
        self.save_archived_orders(scope, ids).await
    }
}
