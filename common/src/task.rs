use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::Outcome;
use crate::state::SharedState;

/// Identificador de tarea, único dentro de un scheduler.
///
/// En `target_uid` un valor negativo es una referencia local dentro de un
/// lote recién generado: -1 apunta al primer elemento del lote, -2 al
/// segundo, etc. El scheduler la resuelve al registrar el lote.
pub type TaskUid = i64;

/// UID reservado para el sumidero sintético de soluciones.
pub const SOLUTION_UID: TaskUid = 0;

/* --------- Tarea: nodo del DAG --------- */

/// Una unidad de cómputo con sus slots de entrada declarados y una única
/// arista de salida hacia `(target_uid, target_port)`.
///
/// El fan-out no se modela con varias aristas: una tarea que necesita
/// alimentar a varios consumidores genera tareas hijas nuevas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Asignado por el scheduler al registrar; 0 mientras no esté registrada.
    pub uid: TaskUid,

    /// Nombre legible, solo para trazas.
    pub name: String,

    /// Operador a ejecutar; el nodo lo resuelve por nombre en su TaskRegistry.
    pub op: String,

    /// Parámetros opacos del operador.
    pub params: Value,

    /// Slots de entrada; la aridad queda fijada al crear la tarea.
    pub inputs: Vec<Option<Value>>,

    pub target_uid: TaskUid,
    pub target_port: usize,

    /// Mayor valor = se asigna antes.
    pub priority: i32,

    /// Tiene que correr en el computer local del space.
    pub on_space: bool,

    /// Ejecución acotada o abierta; lo consultan schedulers específicos.
    pub long_running: bool,

    /// Camino de ancestros más largo conocido hasta esta tarea, en ms.
    pub critical_length_ms: f64,
}

impl Task {
    pub fn new(name: impl Into<String>, op: impl Into<String>, params: Value, num_inputs: usize) -> Self {
        Self {
            uid: 0,
            name: name.into(),
            op: op.into(),
            params,
            inputs: vec![None; num_inputs],
            target_uid: SOLUTION_UID,
            target_port: 0,
            priority: 0,
            on_space: false,
            long_running: false,
            critical_length_ms: 0.0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_on_space(mut self, on_space: bool) -> Self {
        self.on_space = on_space;
        self
    }

    pub fn with_long_running(mut self, long_running: bool) -> Self {
        self.long_running = long_running;
        self
    }

    /// Lista para ejecutar: todos los slots declarados tienen valor.
    /// Función pura del estado actual de las entradas.
    pub fn is_ready(&self) -> bool {
        self.inputs.iter().all(|slot| slot.is_some())
    }

    /// Escribe el valor de un resultado aguas arriba en el slot `port`.
    /// El índice siempre viene de la aridad declarada al crear la tarea.
    pub fn set_input(&mut self, port: usize, value: Value) {
        self.inputs[port] = Some(value);
    }

    pub fn set_target(&mut self, uid: TaskUid, port: usize) {
        self.target_uid = uid;
        self.target_port = port;
    }

    /// Acumula el camino más largo conocido hasta esta tarea. Monótono:
    /// un padre con un camino más corto no lo reduce.
    pub fn add_critical_length_of_parent(&mut self, path_ms: f64) {
        if path_ms > self.critical_length_ms {
            self.critical_length_ms = path_ms;
        }
    }

    pub fn input(&self, port: usize) -> Option<&Value> {
        self.inputs.get(port).and_then(|slot| slot.as_ref())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tarea[{}] '{}' ({})", self.uid, self.name, self.op)
    }
}

/* --------- Ejecución: el contrato entre tarea y anfitrión --------- */

/// Contexto que el computer pasa al ejecutor. Es la única vía que tiene
/// el código de una tarea para interactuar con su anfitrión.
pub trait TaskContext {
    /// Emite un resultado parcial antes de terminar.
    fn partial(&mut self, outcome: Outcome);

    /// Propone una actualización del estado compartido.
    fn update_state(&mut self, proposed: SharedState);

    /// Mensaje de progreso para las trazas del computer.
    fn progress(&mut self, message: &str);
}

/// Ejecutor de un operador, registrado por nombre. Corre en un hilo de
/// bloqueo del computer, por eso es síncrono.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, task: &Task, state: &SharedState, ctx: &mut dyn TaskContext) -> Outcome;
}

impl<F> TaskExecutor for F
where
    F: Fn(&Task, &SharedState, &mut dyn TaskContext) -> Outcome + Send + Sync,
{
    fn execute(&self, task: &Task, state: &SharedState, ctx: &mut dyn TaskContext) -> Outcome {
        self(task, state, ctx)
    }
}

/// Registro op -> ejecutor que cada computer consulta al despachar.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    ops: HashMap<String, Arc<dyn TaskExecutor>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, op: impl Into<String>, executor: Arc<dyn TaskExecutor>) {
        self.ops.insert(op.into(), executor);
    }

    pub fn get(&self, op: &str) -> Option<Arc<dyn TaskExecutor>> {
        self.ops.get(op).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn readiness_is_monotone_under_input_writes() {
        let mut task = Task::new("join", "add", json!({}), 2);
        assert!(!task.is_ready());

        task.set_input(0, json!(3));
        assert!(!task.is_ready());

        task.set_input(1, json!(4));
        assert!(task.is_ready());

        // una escritura posterior no puede deshacer la preparación
        task.set_input(0, json!(5));
        assert!(task.is_ready());
    }

    #[test]
    fn task_without_inputs_is_ready_from_creation() {
        let task = Task::new("semilla", "fib", json!({"n": 5}), 0);
        assert!(task.is_ready());
    }

    #[test]
    fn critical_length_keeps_the_longest_parent_path() {
        let mut task = Task::new("join", "add", json!({}), 2);
        task.add_critical_length_of_parent(12.0);
        task.add_critical_length_of_parent(7.5);
        assert_eq!(task.critical_length_ms, 12.0);

        task.add_critical_length_of_parent(30.0);
        assert_eq!(task.critical_length_ms, 30.0);
    }

    #[test]
    fn registry_resolves_executors_by_op_name() {
        let mut registry = TaskRegistry::new();
        registry.register(
            "echo",
            Arc::new(|task: &Task, _state: &SharedState, _ctx: &mut dyn TaskContext| {
                Outcome::Value(task.params.clone())
            }),
        );

        assert!(registry.get("echo").is_some());
        assert!(registry.get("desconocido").is_none());
    }
}
