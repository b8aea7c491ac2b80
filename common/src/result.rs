use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::{Task, TaskUid};

/* --------- Desenlace de una ejecución --------- */

/// Exactamente una variante activa: o un valor, o un lote de tareas
/// nuevas, o una excepción de aplicación. Las tres cosas no conviven en
/// un mismo resultado.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    Value(Value),
    /// Lote no vacío de tareas hijas a registrar y planificar.
    Tasks(Vec<Task>),
    Exception(String),
}

/// Resultado de una ejecución de tarea, con su contabilidad.
///
/// Una tarea despachada produce exactamente un resultado terminal
/// (`task_completed = true`), que puede ir precedido de cero o más
/// resultados parciales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub outcome: Outcome,

    /// UID de la tarea que produjo este resultado.
    pub creator_uid: TaskUid,

    /// Tiempo de ejecución medido en el computer, en ms.
    pub run_time_ms: f64,

    /// Camino de ancestros más largo que llevó hasta este resultado, en ms.
    pub critical_length_ms: f64,

    /// Terminal o parcial.
    pub task_completed: bool,
}

impl TaskResult {
    pub fn value(value: Value) -> Self {
        Self::terminal(Outcome::Value(value))
    }

    pub fn tasks(tasks: Vec<Task>) -> Self {
        debug_assert!(!tasks.is_empty(), "un lote de tareas nuevas no puede ser vacío");
        Self::terminal(Outcome::Tasks(tasks))
    }

    pub fn exception(error: impl Into<String>) -> Self {
        Self::terminal(Outcome::Exception(error.into()))
    }

    fn terminal(outcome: Outcome) -> Self {
        Self {
            outcome,
            creator_uid: 0,
            run_time_ms: 0.0,
            critical_length_ms: 0.0,
            task_completed: true,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self.outcome, Outcome::Value(_))
    }

    pub fn is_tasks(&self) -> bool {
        matches!(self.outcome, Outcome::Tasks(_))
    }

    pub fn is_exception(&self) -> bool {
        matches!(self.outcome, Outcome::Exception(_))
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.outcome {
            Outcome::Value(v) => format!("valor {v}"),
            Outcome::Tasks(ts) => format!("{} tareas nuevas", ts.len()),
            Outcome::Exception(e) => format!("excepción '{e}'"),
        };
        write!(
            f,
            "resultado de [{}]: {}{}",
            self.creator_uid,
            kind,
            if self.task_completed { "" } else { " (parcial)" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_are_terminal_by_default() {
        assert!(TaskResult::value(json!(42)).task_completed);
        assert!(TaskResult::exception("se rompió").task_completed);
    }

    #[test]
    fn outcome_has_exactly_one_active_kind() {
        let result = TaskResult::value(json!(1));
        assert!(result.is_value());
        assert!(!result.is_tasks());
        assert!(!result.is_exception());
    }
}
