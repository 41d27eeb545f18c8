//! Loreforge Store — `PostgreSQL` persistence.

pub mod pg_memory_store;
pub mod pg_world_state_repository;
pub mod schema;

use loreforge_core::error::DomainError;

fn infrastructure(context: &str, err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("{context}: {err}"))
}
