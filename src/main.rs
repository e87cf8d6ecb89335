//! Ambulance Dispatch
//!
//! Decision engine and backend for an emergency ambulance dispatch
//! simulator: resolves the caller's zone, scores symptom severity, picks an
//! ambulance and a receiving hospital and estimates the travel time.
//!
//! ⚠️ DISCLAIMER:
//! This system is a simulator, NOT a clinical triage tool.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog;
mod config;
mod dispatch;
mod error;
mod eta;
mod geometry;
mod handlers;
mod models;
mod selection;
mod severity;
mod simulator;
mod state;
mod validation;
mod websocket;
mod zones;

use crate::config::Settings;
use crate::simulator::FleetSimulator;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv::dotenv().ok();

    // Logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ambulance_dispatch=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();

    // Load configuration
    let settings = Settings::from_env().context("Failed to load configuration")?;
    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);

    info!("Starting ambulance dispatch backend");
    info!("Binding server to {}", bind_address);

    // City catalog and fleet
    let (catalog, fleet, requests) = match &settings.dispatch.catalog_path {
        Some(path) => {
            info!(path = %path, "Loading catalog");
            let (catalog, fleet) = catalog::load_catalog(path)
                .with_context(|| format!("Failed to load catalog from {}", path))?
                .into_parts();
            (catalog, fleet, Vec::new())
        }
        None => {
            info!("No CATALOG_PATH set, using the built-in demo city");
            let (catalog, fleet) = catalog::demo().into_parts();
            (catalog, fleet, catalog::demo_emergencies())
        }
    };

    // Shared application state
    let app_state = Arc::new(RwLock::new(
        AppState::new(catalog, fleet, settings.dispatch.containment)
            .with_traffic_simulation(settings.dispatch.traffic_simulation)
            .with_requests(requests),
    ));

    // ---------------------------------------------------------------------
    // Fleet simulator background task
    // IMPORTANT: use actix_rt::spawn (NOT tokio::spawn)
    // ---------------------------------------------------------------------
    if settings.simulation.enabled {
        let simulator = FleetSimulator::new(settings.simulation.tick_ms)
            .context("Failed to initialize fleet simulator")?;
        let simulator_state = app_state.clone();

        actix_rt::spawn(async move {
            simulator.run(simulator_state).await;
        });
    } else {
        warn!("Fleet simulation disabled, emergencies only advance through the API");
    }

    // ---------------------------------------------------------------------
    // HTTP + WebSocket server
    // ---------------------------------------------------------------------
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}
