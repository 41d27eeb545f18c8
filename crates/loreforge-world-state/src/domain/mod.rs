//! Pure world-mutation logic.

pub mod commit;
pub mod description;
