//! Application layer for the Memory context.

pub mod curator;
pub mod store;
