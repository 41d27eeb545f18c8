//! Database schema.
//!
//! Mirrors `migrations/`; kept here for tooling that bootstraps a database
//! without the migrator.

/// SQL to create the world state table.
pub const CREATE_WORLD_STATES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS world_states (
    session_id  UUID PRIMARY KEY,
    turn_number BIGINT NOT NULL,
    state       JSONB NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

/// SQL to create the memory table.
pub const CREATE_MEMORIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS memories (
    session_id    UUID NOT NULL,
    turn_number   BIGINT NOT NULL,
    summary       TEXT NOT NULL,
    source_events JSONB NOT NULL,
    recorded_at   TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (session_id, turn_number)
);
";
