//! Loreforge — World State bounded context.
//!
//! Responsible for committing a turn's proposed events to the canonical
//! world: the turn counter, the append-only event log, and the record of
//! applied turn ids.

pub mod application;
pub mod domain;
