//! HTTP request handlers
//!
//! Implements REST API endpoints for the dispatch service.

use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dispatch::{DispatchOutcome, DispatchRequest};
use crate::error::AppError;
use crate::eta::{eta, sample_traffic_factor, FREE_FLOW};
use crate::models::{EmergencyInput, EmergencyRequest, HealthCheck, Point, RequestStatus};
use crate::severity::{severity_score, SeverityLevel};
use crate::validation::{
    validate_emergency_input, validate_pagination, validate_point, validate_severity_score,
    validate_symptom_ids, validate_traffic_factor,
};
use crate::state::AppState;
use crate::websocket::WsSession;
use crate::zones::zone_for;

type SharedState = web::Data<Arc<RwLock<AppState>>>;

/// Configure all application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .service(
        web::scope("/api")
            // Health check
            .route("/health", web::get().to(health_check))
            // Reference data
            .route("/zones", web::get().to(list_zones))
            .route("/zones/locate", web::get().to(locate_zone))
            .route("/hospitals/{id}", web::get().to(get_hospital))
            .route("/hospitals/{id}/discharge", web::post().to(discharge_patient))
            .route("/ambulances", web::get().to(list_ambulances))
            .route("/symptoms", web::get().to(list_symptoms))
            .route("/symptoms/{id}", web::get().to(get_symptom))
            // Engine calculators
            .route("/severity", web::post().to(score_severity))
            .route("/eta", web::post().to(estimate_eta))
            .route("/dispatch/preview", web::post().to(preview_dispatch))
            // Emergency lifecycle
            .route("/emergencies", web::post().to(create_emergency))
            .route("/emergencies", web::get().to(list_emergencies))
            .route("/emergencies/{id}", web::get().to(get_emergency))
            .route("/emergencies/{id}", web::delete().to(abandon_emergency))
            .route("/emergencies/{id}/status", web::post().to(update_emergency_status)),
    )
    // WebSocket endpoint
    .route("/ws", web::get().to(websocket_handler));
}

/// Health check endpoint
///
/// GET /api/health
pub async fn health_check(state: SharedState) -> Result<HttpResponse, AppError> {
    let state = state.read().await;

    let health = HealthCheck {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        active_emergencies: state.active_request_count(),
        available_ambulances: state.available_ambulance_count(),
        total_dispatches: state.total_dispatches(),
        connected_clients: state.client_count(),
    };

    Ok(HttpResponse::Ok().json(health))
}

/// GET /api/zones
pub async fn list_zones(state: SharedState) -> Result<HttpResponse, AppError> {
    let state = state.read().await;
    Ok(HttpResponse::Ok().json(&state.catalog().zones))
}

#[derive(Debug, Deserialize)]
pub struct LocateQuery {
    pub x: f64,
    pub y: f64,
}

/// Resolve the zone containing a point
///
/// GET /api/zones/locate?x=22&y=18
pub async fn locate_zone(
    state: SharedState,
    query: web::Query<LocateQuery>,
) -> Result<HttpResponse, AppError> {
    let location = Point::new(query.x, query.y);
    validate_point(&location)?;

    let state = state.read().await;
    let zone = zone_for(&location, &state.catalog().zones, state.containment())
        .ok_or_else(|| AppError::NotFound(format!("No zone covers location {}", location)))?;

    Ok(HttpResponse::Ok().json(zone))
}

/// GET /api/hospitals/{id}
pub async fn get_hospital(
    state: SharedState,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let hospital_id = path.into_inner();
    let state = state.read().await;
    let hospital = state
        .hospital(&hospital_id)
        .ok_or_else(|| AppError::NotFound(format!("Hospital {} not found", hospital_id)))?;

    Ok(HttpResponse::Ok().json(hospital))
}

/// Free one bed at a hospital
///
/// POST /api/hospitals/{id}/discharge
pub async fn discharge_patient(
    state: SharedState,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let hospital_id = path.into_inner();
    let hospital = state.write().await.discharge(&hospital_id)?;

    info!(hospital_id = %hospital_id, available = hospital.available, "Patient discharged");

    Ok(HttpResponse::Ok().json(hospital))
}

/// GET /api/ambulances
pub async fn list_ambulances(state: SharedState) -> Result<HttpResponse, AppError> {
    let state = state.read().await;
    Ok(HttpResponse::Ok().json(state.fleet()))
}

/// GET /api/symptoms
pub async fn list_symptoms(state: SharedState) -> Result<HttpResponse, AppError> {
    let state = state.read().await;
    Ok(HttpResponse::Ok().json(state.catalog().symptoms.all()))
}

/// GET /api/symptoms/{id}
pub async fn get_symptom(
    state: SharedState,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let symptom_id = path.into_inner();
    let state = state.read().await;
    let symptom = state
        .catalog()
        .symptoms
        .get(&symptom_id)
        .ok_or_else(|| AppError::NotFound(format!("Symptom {} not found", symptom_id)))?;

    Ok(HttpResponse::Ok().json(symptom))
}

#[derive(Debug, Deserialize)]
pub struct SeverityInput {
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeverityResponse {
    pub score: u8,
    pub level: SeverityLevel,
}

/// Score a symptom selection
///
/// POST /api/severity
pub async fn score_severity(body: web::Json<SeverityInput>) -> Result<HttpResponse, AppError> {
    validate_symptom_ids(&body.symptoms)?;

    let score = severity_score(&body.symptoms);

    Ok(HttpResponse::Ok().json(SeverityResponse {
        score,
        level: SeverityLevel::from_score(score),
    }))
}

#[derive(Debug, Deserialize)]
pub struct EtaInput {
    pub from: Point,
    pub to: Point,
    pub traffic_factor: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EtaResponse {
    pub minutes: u32,
    pub traffic_factor: f64,
}

/// POST /api/eta
pub async fn estimate_eta(body: web::Json<EtaInput>) -> Result<HttpResponse, AppError> {
    validate_point(&body.from)?;
    validate_point(&body.to)?;
    let traffic_factor = body.traffic_factor.unwrap_or(FREE_FLOW);
    validate_traffic_factor(traffic_factor)?;

    Ok(HttpResponse::Ok().json(EtaResponse {
        minutes: eta(&body.from, &body.to, traffic_factor),
        traffic_factor,
    }))
}

/// Advisory decision against the live snapshot; never commits anything
///
/// POST /api/dispatch/preview
pub async fn preview_dispatch(
    state: SharedState,
    body: web::Json<DispatchRequest>,
) -> Result<HttpResponse, AppError> {
    if let Some(location) = &body.location {
        validate_point(location)?;
    }
    if let Some(score) = body.severity_score {
        validate_severity_score(score)?;
    }
    validate_symptom_ids(&body.symptoms)?;

    let state = state.read().await;
    let outcome = DispatchOutcome::from(state.preview(&body, FREE_FLOW));

    Ok(HttpResponse::Ok().json(outcome))
}

/// Book an ambulance: decide and reserve in one step
///
/// POST /api/emergencies
pub async fn create_emergency(
    state: SharedState,
    body: web::Json<EmergencyInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);

    info!(
        correlation_id = %correlation_id,
        "Received ambulance booking request"
    );

    validate_emergency_input(&body)?;

    let reservation = {
        let mut state = state.write().await;
        let traffic_factor = if state.traffic_simulation() {
            sample_traffic_factor(&mut rand::thread_rng())
        } else {
            FREE_FLOW
        };
        state.reserve(body.into_inner(), traffic_factor).map_err(|e| {
            warn!(correlation_id = %correlation_id, error = %e, "Dispatch failed");
            e
        })?
    };

    info!(
        correlation_id = %correlation_id,
        request_id = %reservation.request.id,
        "Ambulance dispatched"
    );

    Ok(HttpResponse::Created().json(reservation))
}

/// Query parameters for the emergency log
#[derive(Debug, Deserialize)]
pub struct EmergencyQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub active: Option<bool>,
}

#[derive(Serialize)]
struct PaginatedResponse<T> {
    data: Vec<T>,
    page: u32,
    limit: u32,
    total: u32,
    total_pages: u32,
}

/// GET /api/emergencies?page=1&limit=100&active=true
pub async fn list_emergencies(
    state: SharedState,
    query: web::Query<EmergencyQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = validate_pagination(query.page, query.limit)?;

    let state = state.read().await;
    let requests: Vec<&EmergencyRequest> = state
        .requests_newest_first()
        .into_iter()
        .filter(|r| query.active.map_or(true, |active| r.status.is_active() == active))
        .collect();

    // Apply pagination; an offset past usize is simply past the end
    let total = requests.len();
    let start = (page as usize - 1)
        .checked_mul(limit as usize)
        .unwrap_or(usize::MAX);

    let paginated: Vec<&EmergencyRequest> = requests
        .iter()
        .skip(start)
        .take(limit as usize)
        .copied()
        .collect();

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: paginated,
        page,
        limit,
        total: total as u32,
        total_pages: ((total as f64) / (limit as f64)).ceil() as u32,
    }))
}

#[derive(Serialize)]
struct EmergencyView<'a> {
    #[serde(flatten)]
    request: &'a EmergencyRequest,
    progress: u8,
}

/// GET /api/emergencies/{id}
pub async fn get_emergency(
    state: SharedState,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    let state = state.read().await;
    let request = state
        .request(&request_id)
        .ok_or_else(|| AppError::NotFound(format!("Emergency {} not found", request_id)))?;

    Ok(HttpResponse::Ok().json(EmergencyView {
        request,
        progress: request.status.progress(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

/// POST /api/emergencies/{id}/status
pub async fn update_emergency_status(
    state: SharedState,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    let updated = state.write().await.advance_request(&request_id, body.status)?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Roll back a dispatch that has not left yet
///
/// DELETE /api/emergencies/{id}
pub async fn abandon_emergency(
    state: SharedState,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    let abandoned = state.write().await.abandon_request(&request_id)?;
    Ok(HttpResponse::Ok().json(abandoned))
}

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: SharedState,
) -> Result<HttpResponse, actix_web::Error> {
    let client_id = Uuid::new_v4().to_string();

    info!(client_id = %client_id, "WebSocket connection request");

    // Register client
    {
        let mut state = state.write().await;
        state.add_client(client_id.clone());
    }

    let ws_session = WsSession::new(client_id, state.get_ref().clone());

    actix_web_actors::ws::start(ws_session, &req, stream)
}

/// Extract or generate correlation ID from request headers
fn extract_correlation_id(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Correlation-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
