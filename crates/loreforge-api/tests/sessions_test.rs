//! Integration tests for the session routes.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use loreforge_core::reasoning::AgentRole;
use loreforge_core::world::WorldState;
use loreforge_test_support::{
    FailingWorldStateRepository, InMemoryWorldStateRepository, ScriptedReasoning, SequenceRng,
};
use serde_json::json;
use uuid::Uuid;

fn attack_plan() -> serde_json::Value {
    json!({
        "narrative": "Brock charges the wild Rattata.",
        "check": {
            "script": "roll(20) + abilityModifier(actor.Strength)",
            "target": 12,
            "success": {
                "narrative": "A solid hit ({total})!",
                "events": [{"type": "CombatHit", "payload": {"target": "Rattata", "damage": 6}}]
            },
            "failure": {"narrative": "The Rattata slips away ({total})."}
        }
    })
}

#[tokio::test]
async fn test_play_turn_commits_and_returns_narrative() {
    // Arrange
    let session_id = Uuid::new_v4();
    let worlds = Arc::new(InMemoryWorldStateRepository::new());
    let memories = Arc::new(common::VecMemoryStore::default());
    let reasoning = Arc::new(
        ScriptedReasoning::new()
            .respond(AgentRole::DomainExecutor, attack_plan())
            .respond(AgentRole::MemoryCurator, json!({"summary": "Brock struck a Rattata."})),
    );
    let app = common::build_test_app(
        worlds.clone(),
        reasoning,
        SequenceRng::new(vec![15]),
        memories.clone(),
    );

    // Act
    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{session_id}/turns"),
        &json!({"input": "attack the wild Rattata"}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["narrative"], "A solid hit (18)!");
    assert_eq!(json["outcome"], "completed");
    assert_eq!(json["committed_turn"], 1);
    let world = worlds.snapshot(session_id).unwrap();
    assert_eq!(world.turn_number, 1);
    assert!(world.event_log[0].description.starts_with("CombatHit"));
    let memories = memories.0.lock().unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].summary, "Brock struck a Rattata.");
}

#[tokio::test]
async fn test_rejected_turn_returns_guard_narrative() {
    let session_id = Uuid::new_v4();
    let worlds = Arc::new(InMemoryWorldStateRepository::new());
    let reasoning = Arc::new(ScriptedReasoning::new().respond(
        AgentRole::Guard,
        json!({"status": "Reject", "narrative": "The door is locked."}),
    ));
    let app = common::build_test_app(
        worlds.clone(),
        reasoning.clone(),
        SequenceRng::new(vec![]),
        Arc::new(common::VecMemoryStore::default()),
    );

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{session_id}/turns"),
        &json!({"input": "open the door"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["narrative"], "The door is locked.");
    assert_eq!(json["outcome"], "rejected");
    assert!(json["committed_turn"].is_null());
    assert_eq!(worlds.save_count(), 0);
    assert_eq!(reasoning.requests_for(AgentRole::DomainExecutor), 0);
}

#[tokio::test]
async fn test_blank_input_returns_400() {
    let app = common::build_test_app(
        Arc::new(InMemoryWorldStateRepository::new()),
        Arc::new(ScriptedReasoning::new()),
        SequenceRng::new(vec![]),
        Arc::new(common::VecMemoryStore::default()),
    );

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{}/turns", Uuid::new_v4()),
        &json!({"input": "   "}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_missing_body_field_returns_422() {
    let app = common::build_test_app(
        Arc::new(InMemoryWorldStateRepository::new()),
        Arc::new(ScriptedReasoning::new()),
        SequenceRng::new(vec![]),
        Arc::new(common::VecMemoryStore::default()),
    );

    let (status, _) = common::post_json(
        app,
        &format!("/api/v1/sessions/{}/turns", Uuid::new_v4()),
        &json!({}),
    )
    .await;

    // Axum returns 422 for deserialization failures.
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_save_failure_returns_500() {
    let session_id = Uuid::new_v4();
    let app = common::build_test_app(
        Arc::new(FailingWorldStateRepository::failing_saves(WorldState::new(session_id))),
        Arc::new(ScriptedReasoning::new().respond(AgentRole::DomainExecutor, attack_plan())),
        SequenceRng::new(vec![15]),
        Arc::new(common::VecMemoryStore::default()),
    );

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{session_id}/turns"),
        &json!({"input": "attack the wild Rattata"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "persistence_error");
}

#[tokio::test]
async fn test_reasoning_outage_during_resolution_returns_502() {
    let app = common::build_test_app(
        Arc::new(InMemoryWorldStateRepository::new()),
        Arc::new(ScriptedReasoning::new().fail(AgentRole::DomainExecutor, "upstream down")),
        SequenceRng::new(vec![]),
        Arc::new(common::VecMemoryStore::default()),
    );

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{}/turns", Uuid::new_v4()),
        &json!({"input": "attack"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "collaborator_error");
}

#[tokio::test]
async fn test_world_view_shows_committed_turns() {
    let session_id = Uuid::new_v4();
    let mut world = WorldState::new(session_id);
    world.turn_number = 7;
    world.scene.scene_id = "viridian-forest".to_string();
    let app = common::build_test_app(
        Arc::new(InMemoryWorldStateRepository::with_world(&world)),
        Arc::new(ScriptedReasoning::new()),
        SequenceRng::new(vec![]),
        Arc::new(common::VecMemoryStore::default()),
    );

    let (status, json) =
        common::get_json(app, &format!("/api/v1/sessions/{session_id}/world")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["turn_number"], 7);
    assert_eq!(json["scene"]["scene_id"], "viridian-forest");
    assert!(json.get("applied_turn_ids").is_none());
}

#[tokio::test]
async fn test_world_view_of_unknown_session_is_fresh() {
    let session_id = Uuid::new_v4();
    let app = common::build_test_app(
        Arc::new(InMemoryWorldStateRepository::new()),
        Arc::new(ScriptedReasoning::new()),
        SequenceRng::new(vec![]),
        Arc::new(common::VecMemoryStore::default()),
    );

    let (status, json) =
        common::get_json(app, &format!("/api/v1/sessions/{session_id}/world")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["turn_number"], 0);
    assert_eq!(json["session_id"], session_id.to_string());
}
