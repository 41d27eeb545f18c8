//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use loreforge_core::error::DomainError;
use loreforge_core::repository::WorldStateRepository;
use loreforge_core::rng::DeterministicRng;
use loreforge_memory::application::curator::EventLogMemoryCurator;
use loreforge_memory::application::store::MemoryStore;
use loreforge_memory::domain::record::MemoryRecord;
use loreforge_narrative::application::context::WorldContextBuilder;
use loreforge_narrative::application::guard::ReasoningGuard;
use loreforge_narrative::application::pipeline::{TurnPipeline, TurnStages};
use loreforge_narrative::application::plot::ReasoningPlotDirector;
use loreforge_rules::application::executor::RulesDomainExecutor;
use loreforge_rules::application::roster::StaticRoster;
use loreforge_rules::domain::character::{AbilityScores, CharacterSheet};
use loreforge_sandbox::RuleSandbox;
use loreforge_test_support::{ScriptedReasoning, SequenceRng, fixed_clock};
use loreforge_world_state::application::applier::WorldStateApplier;
use tower::ServiceExt;
use uuid::Uuid;

use loreforge_api::state::AppState;

/// Keeps memories in a vector.
#[derive(Default)]
pub struct VecMemoryStore(pub Mutex<Vec<MemoryRecord>>);

#[async_trait]
impl MemoryStore for VecMemoryStore {
    async fn save_memory(&self, record: &MemoryRecord) -> Result<(), DomainError> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn recent_memories(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, DomainError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|m| m.session_id == session_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

pub fn brawler() -> CharacterSheet {
    CharacterSheet {
        id: Uuid::new_v4(),
        name: "Brock".to_string(),
        level: 5,
        abilities: AbilityScores {
            strength: 16,
            ..AbilityScores::default()
        },
        hit_points: 38,
        armor_class: 15,
    }
}

/// Build the full app router over in-memory collaborators, with the same
/// stage wiring as `main.rs`.
pub fn build_test_app(
    worlds: Arc<dyn WorldStateRepository>,
    reasoning: Arc<ScriptedReasoning>,
    rng: SequenceRng,
    memories: Arc<VecMemoryStore>,
) -> Router {
    let clock = Arc::new(fixed_clock());
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let pipeline = TurnPipeline::new(TurnStages {
        context_builder: Arc::new(WorldContextBuilder::new(worlds.clone(), 10)),
        guard: Arc::new(ReasoningGuard::new(reasoning.clone())),
        plot_director: Arc::new(ReasoningPlotDirector::new(reasoning.clone())),
        executor: Arc::new(RulesDomainExecutor::new(
            reasoning.clone(),
            Arc::new(StaticRoster(brawler())),
            RuleSandbox::default(),
            rng,
        )),
        applier: Arc::new(WorldStateApplier::new(worlds.clone(), clock.clone())),
        curator: Arc::new(EventLogMemoryCurator::new(
            worlds.clone(),
            reasoning,
            memories,
            clock,
        )),
    });

    loreforge_api::app(AppState::new(
        Arc::new(pipeline),
        worlds,
        Duration::from_secs(5),
    ))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}
