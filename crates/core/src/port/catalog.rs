// Catalog Repository Port (queue types and counters)

use crate::domain::{Counter, CounterId, NewQueueType, QueueType, QueueTypeId};
use crate::error::Result;
use async_trait::async_trait;

/// Administrative CRUD over queue types and counters
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // Queue types
    /// Appended after the current highest sort order
    async fn create_queue_type(&self, new: &NewQueueType, created_at: i64) -> Result<QueueType>;

    async fn find_queue_type(&self, code: &str) -> Result<Option<QueueType>>;

    /// Ordered by sort order
    async fn list_queue_types(&self, active_only: bool) -> Result<Vec<QueueType>>;

    async fn update_queue_type(&self, queue_type: &QueueType) -> Result<()>;

    async fn delete_queue_type(&self, id: QueueTypeId) -> Result<()>;

    // Counters
    async fn create_counter(&self, number: &str, name: &str) -> Result<Counter>;

    async fn find_counter(&self, id: CounterId) -> Result<Option<Counter>>;

    /// Ordered by counter number
    async fn list_counters(&self) -> Result<Vec<Counter>>;

    async fn update_counter(&self, id: CounterId, name: &str, active: bool) -> Result<Counter>;

    /// Fails with `Conflict` while the counter holds a ticket
    async fn delete_counter(&self, id: CounterId) -> Result<()>;
}
