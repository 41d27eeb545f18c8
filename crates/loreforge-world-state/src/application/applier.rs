//! The world state applier: commits a turn's delta exactly once.

use std::sync::Arc;

use loreforge_core::cancel::CancellationToken;
use loreforge_core::clock::Clock;
use loreforge_core::delta::StateDelta;
use loreforge_core::error::DomainError;
use loreforge_core::repository::WorldStateRepository;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::session_locks::SessionLocks;
use crate::domain::commit::{CommitOutcome, commit_delta};

/// Applies state deltas to the persisted world of a session.
///
/// Load, mutate and save form one critical section per session. Cancellation
/// is honored until the session lock is acquired; after that the unit runs
/// to completion on its own task even if the caller goes away.
pub struct WorldStateApplier {
    repository: Arc<dyn WorldStateRepository>,
    clock: Arc<dyn Clock>,
    locks: SessionLocks,
}

impl std::fmt::Debug for WorldStateApplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldStateApplier")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl WorldStateApplier {
    /// Creates an applier over `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn WorldStateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            locks: SessionLocks::new(),
        }
    }

    /// Commits `delta` to the world of `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Cancelled` if cancellation is observed before the
    /// unit starts, and the repository's error if loading or saving fails.
    /// A failed save leaves the persisted world untouched.
    #[instrument(skip(self, delta, cancellation), fields(turn_id = %delta.turn_id, events = delta.new_events.len()))]
    pub async fn apply(
        &self,
        session_id: Uuid,
        delta: &StateDelta,
        cancellation: &CancellationToken,
    ) -> Result<CommitOutcome, DomainError> {
        if cancellation.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let lock = self.locks.lock_for(session_id);
        let guard = tokio::select! {
            biased;
            () = cancellation.cancelled() => return Err(DomainError::Cancelled),
            guard = lock.lock_owned() => guard,
        };

        // From here on cancellation is ignored.
        let repository = Arc::clone(&self.repository);
        let clock = Arc::clone(&self.clock);
        let delta = delta.clone();
        let unit = tokio::spawn(async move {
            let _guard = guard;
            let mut world = repository.load_world_state(session_id).await?;
            let outcome = commit_delta(&mut world, &delta, clock.now());
            if let CommitOutcome::Applied { .. } = outcome {
                repository.save_world_state(&world).await?;
            }
            Ok::<_, DomainError>(outcome)
        });

        let outcome = unit
            .await
            .map_err(|e| DomainError::Infrastructure(format!("commit task failed: {e}")))??;

        match outcome {
            CommitOutcome::Applied {
                turn_number,
                appended,
            } => info!(turn_number, appended, "state delta committed"),
            CommitOutcome::AlreadyApplied { turn_number } => {
                warn!(turn_number, "state delta already applied, skipping");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use loreforge_core::delta::ProposedEvent;
    use loreforge_core::world::WorldState;
    use loreforge_test_support::{
        FailingWorldStateRepository, InMemoryWorldStateRepository, fixed_clock,
    };
    use serde_json::json;

    fn applier(repository: Arc<dyn WorldStateRepository>) -> WorldStateApplier {
        WorldStateApplier::new(repository, Arc::new(fixed_clock()))
    }

    fn world_at(session_id: Uuid, turn_number: i64) -> WorldState {
        let mut world = WorldState::new(session_id);
        world.turn_number = turn_number;
        world
    }

    fn two_event_delta() -> StateDelta {
        StateDelta::new(vec![
            ProposedEvent::new("CombatHit", json!({"damage": 4})),
            ProposedEvent::new("ItemFound", json!({"item": "potion"})),
        ])
    }

    #[tokio::test]
    async fn test_apply_persists_events_and_advances_turn_once() {
        let session_id = Uuid::new_v4();
        let repo = Arc::new(InMemoryWorldStateRepository::with_world(&world_at(session_id, 5)));
        let applier = applier(repo.clone());

        let outcome = applier
            .apply(session_id, &two_event_delta(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                turn_number: 6,
                appended: 2
            }
        );
        let world = repo.snapshot(session_id).unwrap();
        assert_eq!(world.turn_number, 6);
        assert_eq!(world.event_log.len(), 2);
        assert!(world.event_log[0].description.starts_with("CombatHit"));
        assert!(world.event_log[1].description.starts_with("ItemFound"));
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_with_same_turn_id_does_not_save_again() {
        let session_id = Uuid::new_v4();
        let repo = Arc::new(InMemoryWorldStateRepository::new());
        let applier = applier(repo.clone());
        let delta = two_event_delta();
        let token = CancellationToken::new();

        applier.apply(session_id, &delta, &token).await.unwrap();
        let before = repo.raw(session_id).unwrap();
        let outcome = applier.apply(session_id, &delta, &token).await.unwrap();

        assert_eq!(outcome, CommitOutcome::AlreadyApplied { turn_number: 1 });
        assert_eq!(repo.raw(session_id).unwrap(), before);
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_is_surfaced() {
        let session_id = Uuid::new_v4();
        let repo = Arc::new(FailingWorldStateRepository::failing_saves(world_at(session_id, 3)));
        let applier = applier(repo);

        let result = applier
            .apply(session_id, &two_event_delta(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_unit_never_loads() {
        let repo = Arc::new(InMemoryWorldStateRepository::new());
        let applier = applier(repo.clone());
        let token = CancellationToken::new();
        token.cancel();

        let result = applier.apply(Uuid::new_v4(), &two_event_delta(), &token).await;

        assert!(matches!(result, Err(DomainError::Cancelled)));
        assert_eq!(repo.load_count(), 0);
    }

    /// Yields between load and save and cancels the token mid-unit.
    struct SlowRepository {
        inner: InMemoryWorldStateRepository,
        cancel_on_load: Option<CancellationToken>,
    }

    #[async_trait]
    impl WorldStateRepository for SlowRepository {
        async fn load_world_state(&self, session_id: Uuid) -> Result<WorldState, DomainError> {
            let world = self.inner.load_world_state(session_id).await?;
            if let Some(token) = &self.cancel_on_load {
                token.cancel();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(world)
        }

        async fn save_world_state(&self, state: &WorldState) -> Result<(), DomainError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.inner.save_world_state(state).await
        }
    }

    #[tokio::test]
    async fn test_cancellation_inside_unit_is_not_honored() {
        let session_id = Uuid::new_v4();
        let token = CancellationToken::new();
        let repo = Arc::new(SlowRepository {
            inner: InMemoryWorldStateRepository::new(),
            cancel_on_load: Some(token.clone()),
        });
        let applier = applier(repo.clone());

        let outcome = applier
            .apply(session_id, &two_event_delta(), &token)
            .await
            .unwrap();

        assert!(token.is_cancelled());
        assert_eq!(outcome.turn_number(), 1);
        assert_eq!(repo.inner.snapshot(session_id).unwrap().turn_number, 1);
    }

    #[tokio::test]
    async fn test_concurrent_turns_for_one_session_are_serialized() {
        let session_id = Uuid::new_v4();
        let repo = Arc::new(SlowRepository {
            inner: InMemoryWorldStateRepository::new(),
            cancel_on_load: None,
        });
        let applier = Arc::new(applier(repo.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let applier = Arc::clone(&applier);
                tokio::spawn(async move {
                    applier
                        .apply(session_id, &two_event_delta(), &CancellationToken::new())
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let world = repo.inner.snapshot(session_id).unwrap();
        assert_eq!(world.turn_number, 4);
        assert_eq!(world.event_log.len(), 8);
        for turn in 1..=4 {
            assert_eq!(world.entries_for_turn(turn).count(), 2);
        }
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_share_state() {
        let repo = Arc::new(InMemoryWorldStateRepository::new());
        let applier = applier(repo.clone());
        let token = CancellationToken::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        applier.apply(a, &two_event_delta(), &token).await.unwrap();
        applier.apply(a, &two_event_delta(), &token).await.unwrap();
        applier.apply(b, &two_event_delta(), &token).await.unwrap();

        assert_eq!(repo.snapshot(a).unwrap().turn_number, 2);
        assert_eq!(repo.snapshot(b).unwrap().turn_number, 1);
    }
}
