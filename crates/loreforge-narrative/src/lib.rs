//! Loreforge Narrative — runs one player turn from input to narrative.
//!
//! A turn passes through the context builder, the guard, the plot director
//! and the domain executor. When resolution proposes changes, the world
//! state applier commits them and the memory curator distills them.

pub mod application;
pub mod domain;
