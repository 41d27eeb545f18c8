//! Loreforge Rules — resolves approved actions into narrative consequences.
//!
//! The domain executor asks the reasoning service for a resolution plan and,
//! when the plan carries a mechanical check, runs its script in the rule
//! sandbox against the acting character's public stat view.

pub mod application;
pub mod domain;
