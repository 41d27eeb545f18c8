//! Application layer for the Narrative context.

pub mod context;
pub mod guard;
pub mod pipeline;
pub mod plot;
