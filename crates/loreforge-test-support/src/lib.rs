//! Shared test doubles for the Loreforge narrative engine.

mod clock;
mod reasoning;
mod repository;
mod rng;

pub use clock::{FixedClock, fixed_clock};
pub use reasoning::ScriptedReasoning;
pub use repository::{FailingWorldStateRepository, InMemoryWorldStateRepository};
pub use rng::{MockRng, SequenceRng};
