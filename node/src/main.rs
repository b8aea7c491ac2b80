mod handlers;
mod remote;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use common::protocol::{RegisterRequest, RegisterResponse};
use common::{ops, BlankMerger, Capabilities, ComputeNode};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::handlers::AppState;

const REGISTER_RETRY: Duration = Duration::from_secs(1);

/// Computer remoto: sirve su contrato por HTTP y se registra contra el
/// space, reintentando a ritmo fijo hasta que el space aparezca.
#[derive(Parser)]
#[command(name = "node")]
#[command(about = "Computer remoto del grid")]
struct Cli {
    /// Puerto HTTP donde este computer sirve su contrato
    #[arg(long, default_value_t = 8081)]
    port: u16,

    /// URL base del space; también se puede dar con SPACE_URL
    #[arg(long)]
    space_url: Option<String>,

    /// URL con la que anunciarse al space; por defecto http://<hostname>:<puerto>
    #[arg(long)]
    node_url: Option<String>,

    /// Hilos del pool; 0 = paralelismo de la máquina
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Tamaño del buffer de prefetch; 0 = valor por defecto
    #[arg(long, default_value_t = 0)]
    buffer: usize,

    /// Anunciarse como computer de corta duración
    #[arg(long, default_value_t = false)]
    short_running: bool,
}

/// - En Docker: SPACE_URL=http://space:8080
/// - En local: por defecto http://localhost:8080
fn space_base_url(cli: &Cli) -> String {
    cli.space_url
        .clone()
        .or_else(|| std::env::var("SPACE_URL").ok())
        .unwrap_or_else(|| "http://localhost:8080".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "node=debug,common=info,axum=info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let space_url = space_base_url(&cli);

    let hostname = hostname::get().unwrap_or_default().to_string_lossy().to_string();
    let advertised = cli.node_url.clone().unwrap_or_else(|| {
        let host = if hostname.is_empty() { "localhost" } else { hostname.as_str() };
        format!("http://{}:{}", host, cli.port)
    });

    let caps = Capabilities::new(cli.threads, cli.buffer, false, !cli.short_running);
    let node = ComputeNode::new(caps, ops::demo_registry(), Arc::new(BlankMerger));

    // el servidor va primero: el space llama de vuelta a /assign durante
    // el registro
    let app = handlers::build_router(AppState {
        node: node.clone(),
        space_url: space_url.clone(),
        http: reqwest::Client::new(),
    });
    let listener = TcpListener::bind(("0.0.0.0", cli.port)).await?;
    info!("computer sirviendo en {}", listener.local_addr()?);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("el servidor del computer terminó: {e}");
        }
    });

    // registro con reintento a ritmo fijo
    let client = reqwest::Client::new();
    let register_url = format!("{space_url}/api/v1/register");
    let request = RegisterRequest {
        node_url: advertised.clone(),
        hostname,
        capabilities: caps,
    };

    let node_id = loop {
        match client.post(&register_url).json(&request).send().await {
            Ok(resp) if resp.status().is_success() => {
                let RegisterResponse { node_id } = resp.json().await?;
                break node_id;
            }
            Ok(resp) => warn!(
                "el space rechazó el registro ({}), se reintenta en {:?}",
                resp.status(),
                REGISTER_RETRY
            ),
            Err(e) => warn!("no se llega al space en {space_url}: {e}, se reintenta en {:?}", REGISTER_RETRY),
        }
        sleep(REGISTER_RETRY).await;
    };

    info!("computer registrado como {node_id} anunciado en {advertised}");
    info!("  capacidades: {caps}");

    tokio::signal::ctrl_c().await?;
    info!("apagando el computer {node_id}");
    Ok(())
}
