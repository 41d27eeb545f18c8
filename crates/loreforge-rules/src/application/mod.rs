//! Application layer for the Rules context.

pub mod executor;
pub mod roster;
