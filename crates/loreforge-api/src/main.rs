//! Loreforge API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use loreforge_api::config::AppConfig;
use loreforge_api::error::AppError;
use loreforge_api::reasoning::HttpReasoningService;
use loreforge_api::state::AppState;
use loreforge_api::telemetry;
use loreforge_core::clock::{Clock, SystemClock};
use loreforge_core::reasoning::ReasoningService;
use loreforge_core::repository::WorldStateRepository;
use loreforge_core::rng::{DeterministicRng, SeededRng};
use loreforge_memory::application::curator::EventLogMemoryCurator;
use loreforge_narrative::application::context::WorldContextBuilder;
use loreforge_narrative::application::guard::ReasoningGuard;
use loreforge_narrative::application::pipeline::{TurnPipeline, TurnStages};
use loreforge_narrative::application::plot::ReasoningPlotDirector;
use loreforge_rules::application::executor::RulesDomainExecutor;
use loreforge_rules::application::roster::{CharacterRoster, StaticRoster, YamlRoster};
use loreforge_rules::domain::character::{AbilityScores, CharacterSheet};
use loreforge_sandbox::RuleSandbox;
use loreforge_store::pg_memory_store::PgMemoryStore;
use loreforge_store::pg_world_state_repository::PgWorldStateRepository;
use loreforge_world_state::application::applier::WorldStateApplier;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

/// The character every session plays when no roster is configured.
fn default_adventurer() -> CharacterSheet {
    CharacterSheet {
        id: Uuid::nil(),
        name: "Adventurer".to_string(),
        level: 1,
        abilities: AbilityScores {
            strength: 14,
            dexterity: 13,
            constitution: 12,
            intelligence: 10,
            wisdom: 11,
            charisma: 10,
        },
        hit_points: 10,
        armor_class: 12,
    }
}

async fn load_roster(config: &AppConfig) -> Result<Arc<dyn CharacterRoster>, AppError> {
    let Some(path) = &config.roster_path else {
        return Ok(Arc::new(StaticRoster(default_adventurer())));
    };
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Config(format!("ROSTER_PATH {path} could not be read: {e}")))?;
    let roster = YamlRoster::from_yaml_str(&yaml).map_err(|e| AppError::Config(e.to_string()))?;
    tracing::info!(path = %path, sessions = roster.session_count(), "character roster loaded");
    Ok(Arc::new(roster))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    let tracer_provider = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Loreforge API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(AppError::from)?;
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(AppError::from)?;

    // Collaborators.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SeededRng::from_os()));
    let worlds: Arc<dyn WorldStateRepository> = Arc::new(PgWorldStateRepository::new(pool.clone()));
    let reasoning: Arc<dyn ReasoningService> = Arc::new(
        HttpReasoningService::new(
            config.reasoning_url.clone(),
            config.reasoning_api_key.clone(),
            config.reasoning_timeout,
        )
        .map_err(|e| AppError::Config(e.to_string()))?,
    );
    let roster = load_roster(&config).await?;

    let pipeline = TurnPipeline::new(TurnStages {
        context_builder: Arc::new(WorldContextBuilder::new(
            worlds.clone(),
            config.recent_event_window,
        )),
        guard: Arc::new(ReasoningGuard::new(reasoning.clone())),
        plot_director: Arc::new(ReasoningPlotDirector::new(reasoning.clone())),
        executor: Arc::new(RulesDomainExecutor::new(
            reasoning.clone(),
            roster,
            RuleSandbox::default(),
            rng,
        )),
        applier: Arc::new(WorldStateApplier::new(worlds.clone(), clock.clone())),
        curator: Arc::new(EventLogMemoryCurator::new(
            worlds.clone(),
            reasoning,
            Arc::new(PgMemoryStore::new(pool)),
            clock,
        )),
    });

    let app = loreforge_api::app(AppState::new(
        Arc::new(pipeline),
        worlds,
        config.turn_timeout,
    ));

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    if let Some(provider) = tracer_provider {
        provider.shutdown()?;
    }
    Ok(())
}
