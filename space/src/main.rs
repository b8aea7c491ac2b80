mod handlers;
mod remote;
mod state;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use common::{ops, BlankMerger, Space};
use tokio::net::TcpListener;
use tracing::info;

use crate::state::AppState;

/// Coordinador del grid: arranca un computer local en-space y sirve el
/// contrato HTTP para clientes y workers remotos.
#[derive(Parser)]
#[command(name = "space")]
#[command(about = "Coordinador del grid de cómputo")]
struct Cli {
    /// Puerto HTTP donde escucha el space
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Hilos del computer local; 0 = paralelismo de la máquina
    #[arg(long, default_value_t = 0)]
    local_threads: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "space=debug,common=info,axum=info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    // los operadores de demostración; una instalación real registra aquí
    // los suyos
    let space = Space::start(cli.local_threads, ops::demo_registry(), Arc::new(BlankMerger)).await;

    let app = handlers::build_router(AppState { space, http: reqwest::Client::new() });

    let listener = TcpListener::bind(("0.0.0.0", cli.port)).await?;
    info!("space escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
