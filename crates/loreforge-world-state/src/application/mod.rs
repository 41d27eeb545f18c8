//! Application services for the World State context.

pub mod applier;
pub mod session_locks;
