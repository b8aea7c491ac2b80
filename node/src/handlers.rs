use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::protocol::{AddTaskRequest, AssignRequest, CollectResponse, NodeStateRequest, OkResponse};
use common::{ComputeNode, Computer};
use tracing::warn;

use crate::remote::HttpSpaceLink;

#[derive(Clone)]
pub struct AppState {
    pub node: Arc<ComputeNode>,
    pub space_url: String,
    pub http: reqwest::Client,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks", post(add_task))
        .route("/api/v1/collect", post(collect_result))
        .route("/api/v1/state", post(update_state))
        .route("/api/v1/assign", post(assign_space))
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Encola una tarea. Con el buffer lleno la respuesta se retiene hasta
// que se libere hueco: el que llama siente la contrapresión.
async fn add_task(
    State(state): State<AppState>,
    Json(req): Json<AddTaskRequest>,
) -> Result<Json<OkResponse>, StatusCode> {
    match state.node.add_task(req.task).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            warn!("no se pudo encolar la tarea: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Long-poll: la respuesta sale cuando el computer produce el siguiente
// resultado, parcial o terminal.
async fn collect_result(State(state): State<AppState>) -> Result<Json<CollectResponse>, StatusCode> {
    match state.node.collect_result().await {
        Ok(result) => Ok(Json(CollectResponse { result })),
        Err(e) => {
            warn!("no se pudo recoger un resultado: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn update_state(
    State(state): State<AppState>,
    Json(req): Json<NodeStateRequest>,
) -> Result<Json<OkResponse>, StatusCode> {
    match state.node.update_state(req.state, req.force).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            warn!("no se pudo actualizar el estado: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Cableado único del registro: con el id asignado ya se puede construir
// el enlace de vuelta al space para subir propuestas de estado.
async fn assign_space(
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<OkResponse>, StatusCode> {
    let link = HttpSpaceLink::new(state.http.clone(), state.space_url.clone());
    match state.node.assign_space(Arc::new(link), req.assigned_id).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            warn!("no se pudo cablear el space: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
