use std::sync::Arc;

use common::Space;

/// Estado compartido de los handlers HTTP: el space y un cliente HTTP
/// reutilizable para construir los handles de computers remotos.
#[derive(Clone)]
pub struct AppState {
    pub space: Arc<Space>,
    pub http: reqwest::Client,
}
