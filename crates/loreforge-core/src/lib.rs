//! Loreforge Core — shared turn model and collaborator ports.
//!
//! This crate defines the values that flow through a single turn, the
//! persisted world shape, and the traits every bounded context depends on.
//! It contains no infrastructure code.

pub mod cancel;
pub mod clock;
pub mod context;
pub mod delta;
pub mod directive;
pub mod error;
pub mod pending;
pub mod reasoning;
pub mod repository;
pub mod rng;
pub mod world;
