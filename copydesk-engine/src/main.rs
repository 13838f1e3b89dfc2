//! copydesk-engine - Generation-and-Gating Pipeline service
//!
//! Turns topic ideas into quality-gated articles:
//! intake dedup → draft → contributor style → humanize → link insertion →
//! quality scoring → persistence, with an interval-driven scheduler handling
//! auto-approval and risk-gated automatic publication.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use copydesk_common::config::{default_config_path, load_toml_config};
use copydesk_common::events::EventBus;

use copydesk_engine::config::{resolve_config, resolve_publish_credential};
use copydesk_engine::scheduler::PublishScheduler;
use copydesk_engine::services::{
    DraftClient, GenerationOrchestrator, HumanizerClient, LinkWeaverClient, PublisherClient,
    ShortcodePolicy,
};
use copydesk_engine::AppState;

const SCHEDULER_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting copydesk-engine");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config();
    info!("Data directory: {}", config.data_dir.display());

    let db_pool = copydesk_engine::db::init_database_pool(&config.database_path()).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(1000);

    // External service clients
    let draft_client = DraftClient::new(config.draft_service_url.clone())
        .map_err(|e| anyhow::anyhow!("Draft client init failed: {}", e))?;
    let humanizer_client = HumanizerClient::new(config.humanizer_service_url.clone())
        .map_err(|e| anyhow::anyhow!("Humanizer client init failed: {}", e))?;
    let link_client = LinkWeaverClient::new(config.link_service_url.clone())
        .map_err(|e| anyhow::anyhow!("Link client init failed: {}", e))?;

    let orchestrator = Arc::new(GenerationOrchestrator::new(
        db_pool.clone(),
        event_bus.clone(),
        draft_client,
        humanizer_client,
        link_client,
    ));

    // Publisher needs endpoint + credential; without either, auto-publish is
    // disabled and everything else keeps running
    let toml_config = default_config_path()
        .filter(|p| p.exists())
        .and_then(|p| load_toml_config(&p).ok())
        .unwrap_or_default();
    let publisher = match &config.publish_endpoint_url {
        Some(endpoint_url) => match resolve_publish_credential(&db_pool, &toml_config).await {
            Ok(credential) => {
                match PublisherClient::new(endpoint_url.clone(), credential, ShortcodePolicy::default())
                {
                    Ok(client) => Some(Arc::new(client)),
                    Err(e) => {
                        warn!("Publisher client init failed, auto-publish disabled: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("No publish credential, auto-publish disabled: {}", e);
                None
            }
        },
        None => {
            warn!("No publish endpoint configured, auto-publish disabled");
            None
        }
    };

    let scheduler = Arc::new(PublishScheduler::new(
        db_pool.clone(),
        event_bus.clone(),
        orchestrator,
        publisher,
    ));
    scheduler.start(Duration::from_secs(SCHEDULER_INTERVAL_SECS));

    let state = AppState::new(db_pool, event_bus);
    let app = copydesk_engine::build_router(state);

    let addr = format!("127.0.0.1:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
