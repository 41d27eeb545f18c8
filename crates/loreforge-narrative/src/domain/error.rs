//! Errors that end a turn without a narrative.

use loreforge_core::error::DomainError;
use thiserror::Error;

use super::report::TurnStage;

/// Infrastructure failures surfaced to the pipeline's caller.
///
/// Guard rejections and resolution failures are never errors; they come back
/// as narrative.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Cancellation was observed before anything was committed.
    #[error("turn cancelled during {stage}")]
    Cancelled { stage: TurnStage },

    /// The world state could not be loaded or saved.
    #[error("state commit failed: {0}")]
    Persistence(#[source] DomainError),

    /// A collaborator failed unexpectedly.
    #[error("{stage} failed: {source}")]
    Collaborator {
        stage: TurnStage,
        #[source]
        source: DomainError,
    },
}

impl TurnError {
    /// Classifies a collaborator error raised in `stage`.
    #[must_use]
    pub fn at(stage: TurnStage, err: DomainError) -> Self {
        match err {
            DomainError::Cancelled => Self::Cancelled { stage },
            source if stage == TurnStage::Apply => Self::Persistence(source),
            source => Self::Collaborator { stage, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_keeps_its_stage() {
        let err = TurnError::at(TurnStage::Direct, DomainError::Cancelled);
        assert!(matches!(err, TurnError::Cancelled { stage: TurnStage::Direct }));
        assert_eq!(err.to_string(), "turn cancelled during plot direction");
    }

    #[test]
    fn test_apply_failures_are_persistence_errors() {
        let err = TurnError::at(TurnStage::Apply, DomainError::Infrastructure("disk full".into()));
        assert!(matches!(err, TurnError::Persistence(_)));
    }

    #[test]
    fn test_other_failures_name_the_stage() {
        let err = TurnError::at(TurnStage::Resolve, DomainError::Reasoning("timeout".into()));
        assert_eq!(err.to_string(), "resolution failed: reasoning error: timeout");
    }
}
