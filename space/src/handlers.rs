use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use common::protocol::{
    ExceptionResponse, OkResponse, RegisterRequest, RegisterResponse, SolutionResponse,
    SpaceStateRequest, StatusResponse, SubmitJobRequest, SubmitJobResponse,
};
use common::{SharedState, SpaceLink};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::remote::HttpComputer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/jobs", post(submit_job))
        .route("/api/v1/solution", get(get_solution))
        .route("/api/v1/exception", get(get_exception))
        .route("/api/v1/register", post(register_node))
        .route("/api/v1/state", post(update_state))
        .route("/api/v1/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Arranca un job nuevo con el scheduler por defecto. Solo puede haber
// uno activo: el anterior se para.
async fn submit_job(
    State(state): State<AppState>,
    Json(req): Json<SubmitJobRequest>,
) -> Json<SubmitJobResponse> {
    let job_id = uuid::Uuid::new_v4().to_string();
    info!("job '{}' aceptado con id {}", req.name, job_id);

    let initial_state = req.initial_state.unwrap_or_else(SharedState::blank);
    state.space.set_job_with_state(req.task, initial_state).await;

    Json(SubmitJobResponse {
        job_id,
        name: req.name,
        submitted_at: Utc::now(),
    })
}

// Extrae la siguiente solución terminal. Long-poll: la respuesta no sale
// hasta que haya una.
async fn get_solution(State(state): State<AppState>) -> Result<Json<SolutionResponse>, StatusCode> {
    match state.space.get_solution().await {
        Ok(result) => Ok(Json(SolutionResponse { result })),
        Err(e) => {
            warn!("error sirviendo una solución: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Igual que /solution pero para la cola de excepciones de aplicación.
async fn get_exception(State(state): State<AppState>) -> Result<Json<ExceptionResponse>, StatusCode> {
    match state.space.get_exception().await {
        Ok(error) => Ok(Json(ExceptionResponse { error })),
        Err(e) => {
            warn!("error sirviendo una excepción: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Registra un computer remoto: se construye su handle HTTP y el space
// hace el resto (asignar id, cablear el proxy, forzarle el estado).
async fn register_node(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, StatusCode> {
    let computer = HttpComputer::new(state.http.clone(), req.node_url.clone());

    match state.space.clone().register(Arc::new(computer), req.capabilities).await {
        Ok(node_id) => {
            info!(
                "computer registrado: {} desde {} ({}) con {}",
                node_id, req.node_url, req.hostname, req.capabilities
            );
            Ok(Json(RegisterResponse { node_id }))
        }
        Err(e) => {
            warn!("registro fallido desde {}: {e}", req.node_url);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

// Propuesta de fusión de estado que sube un computer.
async fn update_state(
    State(state): State<AppState>,
    Json(req): Json<SpaceStateRequest>,
) -> Result<Json<OkResponse>, StatusCode> {
    match SpaceLink::update_state(state.space.as_ref(), req.originator_id, req.state).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            warn!("propuesta de estado rechazada: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Instantánea del progreso del scheduler activo.
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse { status: state.space.status_string() })
}
