//! Loreforge Sandbox — isolated evaluation of untrusted rule scripts.
//!
//! Rule scripts are small expressions such as
//! `roll(20) + abilityModifier(actor.strength)`. Every script passes a
//! fail-closed safety gate before it is parsed, and each execution gets a
//! fresh evaluation context exposing only:
//!
//! - `dice` — `Roll(sides)`, `Roll(count, sides)` and `D4`..`D100`
//! - `rules` — ability modifiers, proficiency bonuses, range checks and a
//!   few arithmetic helpers
//! - the caller's read-only variables
//!
//! Nothing persists between executions.

pub mod capabilities;
pub mod error;
mod interpreter;
mod lexer;
mod parser;
pub mod record;
pub mod safety;
pub mod sandbox;
pub mod value;

pub use error::{SandboxError, ScriptFault};
pub use record::{RecordView, ScriptRecord, ScriptVariables};
pub use sandbox::{RuleSandbox, SandboxLimits};
pub use value::{FromScriptValue, ScriptValue};
