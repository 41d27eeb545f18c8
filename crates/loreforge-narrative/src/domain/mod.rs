//! Domain layer for the Narrative context.

pub mod error;
pub mod report;
