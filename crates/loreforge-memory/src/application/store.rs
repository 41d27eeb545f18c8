//! Memory store port.

use async_trait::async_trait;
use loreforge_core::error::DomainError;
use uuid::Uuid;

use crate::domain::record::MemoryRecord;

/// Persists long-term memories.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Saves `record`, replacing any memory for the same session and turn.
    async fn save_memory(&self, record: &MemoryRecord) -> Result<(), DomainError>;

    /// Returns the most recent memories of a session, newest first.
    async fn recent_memories(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, DomainError>;
}
