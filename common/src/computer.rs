use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GridError;
use crate::result::TaskResult;
use crate::state::SharedState;
use crate::task::Task;

/// Contrato remoto que un computer expone a su coordinador.
///
/// Cualquier transporte petición/respuesta vale mientras las llamadas
/// puedan bloquear y un corte de conexión se distinga como error: el
/// computer local lo implementa en proceso y los binarios lo llevan
/// sobre HTTP.
#[async_trait]
pub trait Computer: Send + Sync {
    /// Encola una tarea. Se queda esperando si el buffer del computer
    /// está lleno: ese bloqueo es la contrapresión hacia el coordinador.
    async fn add_task(&self, task: Task) -> Result<(), GridError>;

    /// Extrae el siguiente resultado producido, parcial o terminal.
    /// Bloquea hasta que haya uno.
    async fn collect_result(&self) -> Result<TaskResult, GridError>;

    /// Con `force` reemplaza el estado local sin mirar; sin `force` lo
    /// fusiona con la política del computer.
    async fn update_state(&self, state: SharedState, force: bool) -> Result<(), GridError>;

    /// Cableado único hecho por el coordinador al registrar: entrega el
    /// handle de vuelta al space y el id asignado.
    async fn assign_space(&self, link: Arc<dyn SpaceLink>, assigned_id: u64) -> Result<(), GridError>;
}

/// Contrato mínimo que el coordinador expone a un computer ya registrado:
/// proponerle una fusión de estado.
#[async_trait]
pub trait SpaceLink: Send + Sync {
    async fn update_state(&self, originator_id: u64, state: SharedState) -> Result<(), GridError>;
}
