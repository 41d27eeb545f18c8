//! Loreforge Memory — distills committed turns into long-term memories.

pub mod application;
pub mod domain;
