//! `PostgreSQL` implementation of the `MemoryStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loreforge_core::error::DomainError;
use loreforge_memory::application::store::MemoryStore;
use loreforge_memory::domain::record::MemoryRecord;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::infrastructure;

type MemoryRow = (Uuid, i64, String, Json<Vec<String>>, DateTime<Utc>);

/// PostgreSQL-backed memory store.
#[derive(Debug, Clone)]
pub struct PgMemoryStore {
    pool: PgPool,
}

impl PgMemoryStore {
    /// Creates a new `PgMemoryStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemoryStore for PgMemoryStore {
    async fn save_memory(&self, record: &MemoryRecord) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO memories (session_id, turn_number, summary, source_events, recorded_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (session_id, turn_number) DO UPDATE \
             SET summary = EXCLUDED.summary, source_events = EXCLUDED.source_events, \
                 recorded_at = EXCLUDED.recorded_at",
        )
        .bind(record.session_id)
        .bind(record.turn_number)
        .bind(&record.summary)
        .bind(Json(&record.source_events))
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| infrastructure("saving memory", &e))?;
        Ok(())
    }

    async fn recent_memories(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, DomainError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<MemoryRow> = sqlx::query_as(
            "SELECT session_id, turn_number, summary, source_events, recorded_at \
             FROM memories WHERE session_id = $1 \
             ORDER BY turn_number DESC LIMIT $2",
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("loading memories", &e))?;

        Ok(rows
            .into_iter()
            .map(
                |(session_id, turn_number, summary, Json(source_events), recorded_at)| MemoryRecord {
                    session_id,
                    turn_number,
                    summary,
                    source_events,
                    recorded_at,
                },
            )
            .collect())
    }
}
