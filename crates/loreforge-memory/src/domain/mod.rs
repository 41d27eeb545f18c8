//! Domain layer for the Memory context.

pub mod record;
