use anyhow::Result;
use clap::{Parser, Subcommand};
use common::protocol::{
    ExceptionResponse, SolutionResponse, StatusResponse, SubmitJobRequest, SubmitJobResponse,
};
use common::{ops, Outcome};
use reqwest::Client;
use std::env;

/// Igual que en el computer:
/// - En Docker: SPACE_URL=http://space:8080
/// - En local: por defecto http://localhost:8080
fn space_base_url() -> String {
    env::var("SPACE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para hablar con el space")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Envía un job de demostración que calcula fib(n)
    Submit {
        #[arg(value_name = "N")]
        n: u64,

        /// Prioridad de la tarea raíz
        #[arg(long, default_value_t = 0)]
        priority: i32,

        /// Marca el job para el computer local del space (sin workers
        /// remotos no hay quien ejecute un job remoto)
        #[arg(long, default_value_t = false)]
        local: bool,
    },
    /// Espera la siguiente solución terminal y la imprime
    Solution,
    /// Espera la siguiente excepción de aplicación y la imprime
    Exception,
    /// Imprime el progreso del scheduler activo
    Status,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = space_base_url();

    match cli.command {
        Commands::Submit { n, priority, local } => {
            let url = format!("{}/api/v1/jobs", base_url);

            let task = ops::fib_job(n).with_priority(priority).with_on_space(local);
            let req = SubmitJobRequest {
                name: format!("fib({n})"),
                task,
                initial_state: None,
            };

            let resp = client.post(&url).json(&req).send().await?;
            let job: SubmitJobResponse = resp.json().await?;

            println!("Job aceptado:");
            println!("  id: {}", job.job_id);
            println!("  nombre: {}", job.name);
            println!("  enviado: {}", job.submitted_at);
        }

        Commands::Solution => {
            let url = format!("{}/api/v1/solution", base_url);
            println!("Esperando la siguiente solución...");

            let resp = client.get(&url).send().await?;
            if resp.status().is_success() {
                let SolutionResponse { result } = resp.json().await?;
                match result.outcome {
                    Outcome::Value(value) => println!("Solución: {value}"),
                    other => println!("Solución inesperada: {other:?}"),
                }
                println!("  camino crítico: {:.1} ms", result.critical_length_ms);
                println!("  runtime total observado: {:.1} ms", result.run_time_ms);
            } else {
                println!("Error pidiendo la solución (status {})", resp.status());
            }
        }

        Commands::Exception => {
            let url = format!("{}/api/v1/exception", base_url);
            println!("Esperando la siguiente excepción...");

            let resp = client.get(&url).send().await?;
            if resp.status().is_success() {
                let ExceptionResponse { error } = resp.json().await?;
                println!("Excepción: {error}");
            } else {
                println!("Error pidiendo la excepción (status {})", resp.status());
            }
        }

        Commands::Status => {
            let url = format!("{}/api/v1/status", base_url);
            let resp = client.get(&url).send().await?;

            if resp.status().is_success() {
                let StatusResponse { status } = resp.json().await?;
                println!("{status}");
            } else {
                println!("Error consultando /api/v1/status (status {})", resp.status());
            }
        }
    }

    Ok(())
}
