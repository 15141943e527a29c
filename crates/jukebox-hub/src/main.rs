mod api;
mod autoplay;
mod browse;
mod browse_registry;
mod catalog;
mod command_controller;
mod config;
mod error;
mod events;
mod models;
mod openapi;
mod relay_transport;
mod render;
mod session_manager;
mod settings_store;
mod state;
mod subsonic;
mod transport;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web, middleware::Logger};
use actix_web::dev::ServerHandle;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::browse_registry::BrowseRegistry;
use crate::command_controller::CommandController;
use crate::events::EventBus;
use crate::relay_transport::RelayTransport;
use crate::session_manager::PlaybackSessionManager;
use crate::settings_store::{SettingsStore, spawn_settings_persister};
use crate::state::AppState;
use crate::subsonic::SubsonicClient;

const BROWSE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "jukebox-hub")]
struct Args {
    /// HTTP bind address, e.g. 0.0.0.0:8090
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,

    /// Server config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn resolve_config_path(arg: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join("config.toml")))
        .filter(|path| path.exists())
        .ok_or_else(|| anyhow::anyhow!("config file is required; use --config"))
}

fn spawn_browse_purger(controller: Arc<CommandController>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(BROWSE_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let registry = controller.browse_registry();
            let purged = registry.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = registry.len(), "purged expired browse surfaces");
            }
        }
    })
}

/// Ctrl-C handler: ask the server for a graceful stop so shutdown work after
/// `run()` still happens. Runs on the signal thread.
fn shutdown_on_signal(handle: ServerHandle) -> impl Fn() + Send + 'static {
    move || {
        tracing::info!("shutdown requested");
        // The stop command is sent eagerly; the returned future only awaits completion.
        let _ = handle.stop(true);
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,actix_web=info,jukebox_hub=info")
        }))
        .init();

    let config_path = resolve_config_path(args.config)?;
    let cfg = config::ServerConfig::load(&config_path)?;
    let bind = match args.bind {
        Some(addr) => addr,
        None => config::bind_from_config(&cfg)?,
    };
    let settings_path = config::settings_path_from_config(&cfg, config_path.parent());
    let relays = config::relays_from_config(&cfg)?;
    tracing::info!(
        bind = %bind,
        config = %config_path.display(),
        settings = %settings_path.display(),
        subsonic = %cfg.subsonic.url,
        "starting jukebox-hub"
    );
    tracing::info!(
        count = relays.len(),
        communities = ?relays.iter().map(|r| r.community.0).collect::<Vec<_>>(),
        "loaded relays from config"
    );
    if relays.is_empty() {
        tracing::warn!("no configured relays; playback will be refused for every community");
    }

    let catalog = Arc::new(SubsonicClient::new(&cfg.subsonic)?);
    let transport = Arc::new(RelayTransport::new(&relays));
    let events = EventBus::new();

    let (sessions, session_rx) = PlaybackSessionManager::new(catalog.clone(), events.clone());
    let sessions = Arc::new(sessions);
    let store = Arc::new(SettingsStore::new(settings_path));
    match store.load() {
        Ok(records) => sessions.restore_settings(records),
        Err(err) => tracing::warn!(
            path = %store.path().display(),
            error = %err,
            "failed to load community settings; using defaults"
        ),
    }
    tokio::spawn(sessions.clone().run_events(session_rx));
    spawn_settings_persister(store.clone(), sessions.clone(), &events);

    let controller = Arc::new(CommandController::new(
        sessions.clone(),
        catalog,
        transport,
        BrowseRegistry::new(config::browse_ttl_from_config(&cfg)),
    ));
    spawn_browse_purger(controller.clone());

    let state = web::Data::new(AppState::new(controller, events));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default().exclude("/health").exclude("/events"))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .service(api::health::health)
            .service(api::play)
            .service(api::search)
            .service(api::stop)
            .service(api::queue)
            .service(api::queue_clear)
            .service(api::skip)
            .service(api::autoplay)
            .service(api::status)
            .service(api::browse_page)
            .service(api::browse_select)
            .service(api::browse_enqueue_all)
            .service(api::events_stream)
    })
    .bind(bind)?
    .disable_signals()
    .run();
    ctrlc::set_handler(shutdown_on_signal(server.handle())).context("install ctrl-c handler")?;
    server.await?;

    if let Err(err) = store.save_snapshot(&sessions).await {
        tracing::warn!(error = %err, "failed to save community settings at shutdown");
    }
    tracing::info!("jukebox-hub stopped");
    Ok(())
}
