//! The rule sandbox entry point.

use loreforge_core::cancel::CancellationToken;
use loreforge_core::rng::DeterministicRng;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::capabilities::DiceLimits;
use crate::error::{SandboxError, ScriptFault};
use crate::interpreter::Evaluation;
use crate::parser;
use crate::record::ScriptVariables;
use crate::safety;
use crate::value::{FromScriptValue, ScriptValue};

/// Resource limits for a single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    /// Maximum script length in bytes.
    pub max_script_bytes: usize,
    /// Maximum evaluation steps (statements plus expression nodes).
    pub max_steps: u64,
    /// Maximum syntax tree depth. Every nested block, parenthesis, unary
    /// operator, chained binary operator, member access and call counts.
    pub max_depth: usize,
    /// Maximum dice in a single roll.
    pub max_dice: u32,
    /// Maximum faces on a die.
    pub max_sides: u32,
    /// Maximum length in bytes of a text value built by concatenation.
    pub max_text_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_script_bytes: 4 * 1024,
            max_steps: 10_000,
            max_depth: 64,
            max_dice: 1_000,
            max_sides: 1_000,
            max_text_bytes: 4 * 1024,
        }
    }
}

/// Executes untrusted rule scripts against read-only variables.
///
/// The sandbox holds configuration only. Every call builds a fresh
/// evaluation context, so one instance may serve concurrent callers as long
/// as each brings its own RNG.
#[derive(Debug, Clone, Default)]
pub struct RuleSandbox {
    limits: SandboxLimits,
}

impl RuleSandbox {
    /// Creates a sandbox with custom limits.
    #[must_use]
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn limits(&self) -> SandboxLimits {
        self.limits
    }

    /// Runs the safety checks only; the script is never executed.
    #[must_use]
    pub fn is_safe(&self, script: &str) -> bool {
        safety::is_safe(script)
    }

    /// Executes `script` and converts its result to `T`.
    ///
    /// A result that cannot be represented as `T` degrades to
    /// `T::default()` and is logged; a successful conversion says nothing
    /// about whether the value makes sense to the caller.
    ///
    /// # Errors
    ///
    /// Returns `SandboxError::UnsafeScript` if the safety gate refuses the
    /// script, `SandboxError::Execution` on syntax, runtime or limit faults,
    /// and `SandboxError::Cancelled` if `cancellation` fires.
    pub fn execute<T: FromScriptValue>(
        &self,
        script: &str,
        variables: &ScriptVariables,
        rng: &mut dyn DeterministicRng,
        cancellation: &CancellationToken,
    ) -> Result<T, SandboxError> {
        let value = self.evaluate(script, variables, rng, cancellation)?;
        Ok(T::from_script_value(&value).unwrap_or_else(|| {
            warn!(
                script = %fingerprint(script),
                result_type = value.type_name(),
                requested = std::any::type_name::<T>(),
                "script result not convertible, using default"
            );
            T::default()
        }))
    }

    /// Executes `script` and returns its raw result.
    ///
    /// # Errors
    ///
    /// See [`RuleSandbox::execute`].
    #[instrument(skip_all, fields(script = %fingerprint(script)))]
    pub fn evaluate(
        &self,
        script: &str,
        variables: &ScriptVariables,
        rng: &mut dyn DeterministicRng,
        cancellation: &CancellationToken,
    ) -> Result<ScriptValue, SandboxError> {
        if let Err(err) = safety::check(script) {
            warn!(error = %err, "script refused by safety gate");
            return Err(err);
        }
        if cancellation.is_cancelled() {
            return Err(SandboxError::Cancelled);
        }
        if script.len() > self.limits.max_script_bytes {
            return Err(ScriptFault::LimitExceeded(format!(
                "script is {} bytes, limit is {}",
                script.len(),
                self.limits.max_script_bytes
            ))
            .into());
        }

        let program = parser::parse(script, self.limits.max_depth)?;
        let evaluation = Evaluation::new(
            variables,
            rng,
            cancellation,
            DiceLimits {
                max_dice: self.limits.max_dice,
                max_sides: self.limits.max_sides,
            },
            self.limits.max_steps,
            self.limits.max_text_bytes,
        );
        let result = evaluation.run(&program);
        match &result {
            Ok(value) => debug!(result_type = value.type_name(), "script evaluated"),
            Err(err) => debug!(error = %err, "script failed"),
        }
        result
    }
}

/// Short SHA-256 fingerprint used to correlate a script across log lines.
#[must_use]
pub fn fingerprint(script: &str) -> String {
    Sha256::digest(script.as_bytes())
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}
