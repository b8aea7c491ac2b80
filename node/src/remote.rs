use async_trait::async_trait;
use common::protocol::SpaceStateRequest;
use common::{GridError, SharedState, SpaceLink};

/// Handle reqwest hacia el space donde este computer está registrado.
/// Solo sube propuestas de fusión de estado.
pub struct HttpSpaceLink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpaceLink {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }
}

#[async_trait]
impl SpaceLink for HttpSpaceLink {
    async fn update_state(&self, originator_id: u64, state: SharedState) -> Result<(), GridError> {
        let resp = self
            .client
            .post(format!("{}/api/v1/state", self.base_url))
            .json(&SpaceStateRequest { originator_id, state })
            .send()
            .await
            .map_err(|e| GridError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(GridError::Transport(format!("el space respondió {}", resp.status())))
        }
    }
}
