//! Domain layer for the Rules context.

pub mod character;
pub mod plan;
pub mod result;
