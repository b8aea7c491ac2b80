use thiserror::Error;

/// Errores del motor de coordinación.
#[derive(Debug, Error)]
pub enum GridError {
    /// El proxy ya pasó a su estado terminal; la tarea no se pierde,
    /// pero quien la asignó tiene que reencolarla él mismo.
    #[error("proxy {0} detenido: su computer ya no es accesible")]
    ProxyStopped(u64),

    /// Fallo de transporte hablando con un proceso remoto.
    #[error("error de transporte: {0}")]
    Transport(String),

    /// Un canal interno se cerró porque el otro extremo terminó.
    #[error("canal interno '{0}' cerrado")]
    ChannelClosed(&'static str),

    /// Operación que necesita un job activo y todavía no hay ninguno.
    #[error("no hay job activo en el space")]
    NoActiveJob,

    /// El payload de una tarea no se pudo interpretar.
    #[error("payload inválido en tarea '{task}': {reason}")]
    BadPayload { task: String, reason: String },
}
