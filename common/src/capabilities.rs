use std::fmt;

use serde::{Deserialize, Serialize};

/// Capacidades inmutables de un computer. El scheduler las consulta para
/// decidir asignación; el propio computer las usa para dimensionar sus
/// colas y su pool de hilos.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capabilities {
    pub num_threads: usize,

    /// Tamaño del buffer de prefetch: cuántas tareas acepta encoladas
    /// antes de que `add_task` empiece a bloquear al coordinador.
    pub buffer_size: usize,

    /// Corre pegado al space, sin salto de red.
    pub on_space: bool,

    /// Longevidad prevista del proceso.
    pub long_running: bool,
}

impl Capabilities {
    pub const DEFAULT_BUFFER_SIZE: usize = 5;

    /// Con 0 hilos se usa el paralelismo disponible de la máquina; con
    /// buffer 0 se usa el tamaño por defecto.
    pub fn new(desired_threads: usize, desired_buffer: usize, on_space: bool, long_running: bool) -> Self {
        let num_threads = if desired_threads > 0 {
            desired_threads
        } else {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        };
        let buffer_size = if desired_buffer > 0 {
            desired_buffer
        } else {
            Self::DEFAULT_BUFFER_SIZE
        };

        Self { num_threads, buffer_size, on_space, long_running }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hilos, buffer {}{}{}",
            self.num_threads,
            self.buffer_size,
            if self.on_space { ", en-space" } else { "" },
            if self.long_running { ", larga duración" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let caps = Capabilities::new(0, 0, false, true);
        assert!(caps.num_threads >= 1);
        assert_eq!(caps.buffer_size, Capabilities::DEFAULT_BUFFER_SIZE);
        assert!(caps.long_running);
    }
}
