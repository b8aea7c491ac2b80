use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capabilities::Capabilities;
use crate::result::TaskResult;
use crate::state::SharedState;
use crate::task::Task;

/// Id que el space le asigna a cada computer registrado.
pub type NodeId = u64;

/* --------- Superficie HTTP del space --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobRequest {
    pub name: String,
    pub task: Task,
    /// Estado compartido inicial; sin él se arranca en blanco.
    pub initial_state: Option<SharedState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub name: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// URL base donde el computer sirve su contrato.
    pub node_url: String,
    pub hostname: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub node_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceStateRequest {
    pub originator_id: NodeId,
    pub state: SharedState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionResponse {
    pub result: TaskResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/* --------- Superficie HTTP del computer --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTaskRequest {
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectResponse {
    pub result: TaskResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStateRequest {
    pub state: SharedState,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRequest {
    pub assigned_id: NodeId,
}
