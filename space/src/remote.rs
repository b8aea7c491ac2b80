use std::sync::Arc;

use async_trait::async_trait;
use common::protocol::{AddTaskRequest, AssignRequest, CollectResponse, NodeStateRequest};
use common::{Computer, GridError, SharedState, SpaceLink, Task, TaskResult};

/// Handle reqwest hacia un computer remoto que sirve su contrato por
/// HTTP. Cualquier error de red o status no-2xx se devuelve como fallo
/// de transporte: eso es lo que hace que el proxy dé por muerto al
/// computer.
pub struct HttpComputer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpComputer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport(e: reqwest::Error) -> GridError {
    GridError::Transport(e.to_string())
}

fn ensure_ok(resp: &reqwest::Response) -> Result<(), GridError> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(GridError::Transport(format!("el computer respondió {}", resp.status())))
    }
}

#[async_trait]
impl Computer for HttpComputer {
    async fn add_task(&self, task: Task) -> Result<(), GridError> {
        // la respuesta tarda lo que tarde en liberarse el buffer del
        // computer: esa espera es la contrapresión
        let resp = self
            .client
            .post(self.url("/api/v1/tasks"))
            .json(&AddTaskRequest { task })
            .send()
            .await
            .map_err(transport)?;
        ensure_ok(&resp)
    }

    async fn collect_result(&self) -> Result<TaskResult, GridError> {
        let resp = self
            .client
            .post(self.url("/api/v1/collect"))
            .send()
            .await
            .map_err(transport)?;
        ensure_ok(&resp)?;
        let collected: CollectResponse = resp.json().await.map_err(transport)?;
        Ok(collected.result)
    }

    async fn update_state(&self, state: SharedState, force: bool) -> Result<(), GridError> {
        let resp = self
            .client
            .post(self.url("/api/v1/state"))
            .json(&NodeStateRequest { state, force })
            .send()
            .await
            .map_err(transport)?;
        ensure_ok(&resp)
    }

    async fn assign_space(&self, _link: Arc<dyn SpaceLink>, assigned_id: u64) -> Result<(), GridError> {
        // el computer remoto ya conoce la URL del space (él inició el
        // registro): por el cable solo viaja el id asignado
        let resp = self
            .client
            .post(self.url("/api/v1/assign"))
            .json(&AssignRequest { assigned_id })
            .send()
            .await
            .map_err(transport)?;
        ensure_ok(&resp)
    }
}
