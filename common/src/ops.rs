use std::sync::Arc;

use serde_json::{json, Value};

use crate::result::Outcome;
use crate::state::SharedState;
use crate::task::{Task, TaskContext, TaskExecutor, TaskRegistry};

/// Operadores de demostración: fibonacci por descomposición en
/// subtareas. Sirven para el cliente de ejemplo y para probar el motor
/// de punta a punta, porque ejercitan todo: generación de lotes,
/// referencias locales negativas, puertos múltiples y el sumidero de
/// soluciones.
pub const OP_FIB: &str = "fib";
pub const OP_ADD: &str = "add";

/// Registro con los operadores de demostración ya dados de alta.
pub fn demo_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register(OP_FIB, Arc::new(FibExecutor));
    registry.register(OP_ADD, Arc::new(AddExecutor));
    registry
}

/// Tarea raíz para calcular fib(n).
pub fn fib_job(n: u64) -> Task {
    Task::new(format!("fib({n})"), OP_FIB, json!({ "n": n }), 0)
}

/// Con n < 2 devuelve n directamente; si no, genera el lote
/// `[fib(n-1), fib(n-2), suma]` donde las dos hojas alimentan a la suma
/// del propio lote (referencia local -3) y la suma hereda la arista de
/// salida del padre.
pub struct FibExecutor;

impl TaskExecutor for FibExecutor {
    fn execute(&self, task: &Task, _state: &SharedState, ctx: &mut dyn TaskContext) -> Outcome {
        let Some(n) = task.params.get("n").and_then(Value::as_i64) else {
            return Outcome::Exception(format!("falta el parámetro 'n' en {task}"));
        };

        if n < 2 {
            return Outcome::Value(json!(n.max(0)));
        }

        ctx.progress(&format!("fib({n}) se parte en subtareas"));

        let mut left = fib_subtask(n - 1, task);
        left.set_target(-3, 0);
        let mut right = fib_subtask(n - 2, task);
        right.set_target(-3, 1);

        let mut join = Task::new(format!("suma<fib({n})>"), OP_ADD, json!({}), 2)
            .with_priority(task.priority)
            .with_on_space(task.on_space);
        join.set_target(task.target_uid, task.target_port);

        Outcome::Tasks(vec![left, right, join])
    }
}

fn fib_subtask(n: i64, parent: &Task) -> Task {
    Task::new(format!("fib({n})"), OP_FIB, json!({ "n": n }), 0)
        .with_priority(parent.priority)
        .with_on_space(parent.on_space)
}

/// Suma todos los puertos de entrada.
pub struct AddExecutor;

impl TaskExecutor for AddExecutor {
    fn execute(&self, task: &Task, _state: &SharedState, _ctx: &mut dyn TaskContext) -> Outcome {
        let mut sum = 0i64;
        for (port, slot) in task.inputs.iter().enumerate() {
            match slot.as_ref().and_then(Value::as_i64) {
                Some(value) => sum += value,
                None => {
                    return Outcome::Exception(format!("puerto {port} sin valor numérico en {task}"))
                }
            }
        }
        Outcome::Value(json!(sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopContext;

    impl TaskContext for NoopContext {
        fn partial(&mut self, _outcome: Outcome) {}
        fn update_state(&mut self, _proposed: SharedState) {}
        fn progress(&mut self, _message: &str) {}
    }

    #[test]
    fn fib_base_case_returns_a_value() {
        let outcome = FibExecutor.execute(&fib_job(1), &SharedState::blank(), &mut NoopContext);
        match outcome {
            Outcome::Value(v) => assert_eq!(v, json!(1)),
            other => panic!("se esperaba un valor, llegó {other:?}"),
        }
    }

    #[test]
    fn fib_recursive_case_spawns_a_batch_wired_to_its_join() {
        let mut parent = fib_job(6).with_priority(3).with_on_space(true);
        parent.set_target(17, 2);

        let outcome = FibExecutor.execute(&parent, &SharedState::blank(), &mut NoopContext);
        let Outcome::Tasks(batch) = outcome else {
            panic!("fib(6) debería generar subtareas");
        };
        assert_eq!(batch.len(), 3);

        // las hojas apuntan a la suma del lote, puertos 0 y 1
        assert_eq!(batch[0].target_uid, -3);
        assert_eq!(batch[0].target_port, 0);
        assert_eq!(batch[1].target_uid, -3);
        assert_eq!(batch[1].target_port, 1);

        // la suma hereda la arista de salida y los atributos del padre
        assert_eq!(batch[2].target_uid, 17);
        assert_eq!(batch[2].target_port, 2);
        assert_eq!(batch[2].inputs.len(), 2);
        assert!(batch.iter().all(|t| t.priority == 3 && t.on_space));
    }

    #[test]
    fn add_sums_every_input_port() {
        let mut task = Task::new("suma", OP_ADD, json!({}), 3);
        task.set_input(0, json!(1));
        task.set_input(1, json!(2));
        task.set_input(2, json!(4));

        let outcome = AddExecutor.execute(&task, &SharedState::blank(), &mut NoopContext);
        match outcome {
            Outcome::Value(v) => assert_eq!(v, json!(7)),
            other => panic!("se esperaba un valor, llegó {other:?}"),
        }
    }

    #[test]
    fn add_with_a_missing_port_is_an_application_exception() {
        let mut task = Task::new("suma", OP_ADD, json!({}), 2);
        task.set_input(0, json!(1));

        let outcome = AddExecutor.execute(&task, &SharedState::blank(), &mut NoopContext);
        assert!(matches!(outcome, Outcome::Exception(_)));
    }
}
