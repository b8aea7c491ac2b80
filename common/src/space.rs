use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::computer::{Computer, SpaceLink};
use crate::error::GridError;
use crate::node::ComputeNode;
use crate::proxy::{Proxy, ProxyEvents};
use crate::result::TaskResult;
use crate::scheduler::{DefaultScheduler, ProxyMap, Scheduler};
use crate::state::{SharedState, StateMerger};
use crate::task::{Task, TaskRegistry};

const FORCE_STATE: bool = true;
const SUGGEST_STATE: bool = false;

/// El computer local trabaja pegado al scheduler, no necesita prefetch.
const LOCAL_BUFFER_SIZE: usize = 1;

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Coordinador: es el dueño del pool de proxies, arranca un computer
/// local en-space, cablea el scheduler con los proxies y expone al
/// cliente las colas de soluciones y excepciones.
pub struct Space {
    proxies: ProxyMap,
    proxy_id_pool: AtomicU64,
    scheduler: Mutex<Option<Arc<dyn Scheduler>>>,

    state: Mutex<SharedState>,
    merger: Arc<dyn StateMerger>,

    solutions_tx: mpsc::UnboundedSender<TaskResult>,
    solutions_rx: AsyncMutex<mpsc::UnboundedReceiver<TaskResult>>,
    exceptions_tx: mpsc::UnboundedSender<String>,
    exceptions_rx: AsyncMutex<mpsc::UnboundedReceiver<String>>,
}

impl Space {
    /// Crea el space, registra su computer local y arranca el impresor
    /// de progreso. El computer local garantiza que siempre hay con qué
    /// avanzar, aunque no se conecte ningún worker remoto.
    pub async fn start(local_threads: usize, registry: TaskRegistry, merger: Arc<dyn StateMerger>) -> Arc<Space> {
        let (solutions_tx, solutions_rx) = mpsc::unbounded_channel();
        let (exceptions_tx, exceptions_rx) = mpsc::unbounded_channel();

        let space = Arc::new(Self {
            proxies: Arc::new(RwLock::new(HashMap::new())),
            proxy_id_pool: AtomicU64::new(0),
            scheduler: Mutex::new(None),
            state: Mutex::new(SharedState::blank()),
            merger: merger.clone(),
            solutions_tx,
            solutions_rx: AsyncMutex::new(solutions_rx),
            exceptions_tx,
            exceptions_rx: AsyncMutex::new(exceptions_rx),
        });

        let local_spec = Capabilities::new(local_threads, LOCAL_BUFFER_SIZE, true, false);
        let local_node = ComputeNode::new(local_spec, registry, merger);
        if let Err(e) = space.clone().register(local_node, local_spec).await {
            // el computer local es en-proceso, esto no debería poder pasar
            warn!("no se pudo registrar el computer local: {e}");
        }

        tokio::spawn(status_loop(space.clone()));
        space
    }

    /// Registra un computer: le asigna id, le entrega el handle del
    /// space, construye su proxy, le fuerza el estado actual y lo
    /// publica en el pool compartido.
    pub async fn register(self: Arc<Self>, computer: Arc<dyn Computer>, spec: Capabilities) -> Result<u64, GridError> {
        let proxy_id = self.proxy_id_pool.fetch_add(1, Ordering::SeqCst);

        computer.assign_space(self.clone(), proxy_id).await?;

        let proxy = Proxy::start(computer, spec, proxy_id, self.clone());
        info!("registrando {proxy}");

        proxy.update_state(self.current_state(), FORCE_STATE).await;
        self.proxies.write().unwrap().insert(proxy_id, proxy);
        Ok(proxy_id)
    }

    /// Job con estado en blanco y el scheduler por defecto.
    pub async fn set_job(&self, task: Task) {
        self.set_job_with(task, SharedState::blank(), Arc::new(DefaultScheduler::new())).await;
    }

    /// Job con estado inicial y el scheduler por defecto.
    pub async fn set_job_with_state(&self, task: Task, initial_state: SharedState) {
        self.set_job_with(task, initial_state, Arc::new(DefaultScheduler::new())).await;
    }

    /// Arranca un job: reemplaza el estado compartido, lo fuerza en cada
    /// proxy registrado, para el scheduler anterior si lo había y arranca
    /// el nuevo con el pool vivo y los sumideros. Un job activo por space.
    pub async fn set_job_with(&self, task: Task, initial_state: SharedState, scheduler: Arc<dyn Scheduler>) {
        info!("nuevo job: {task}");
        {
            *self.state.lock().unwrap() = initial_state.clone();
        }

        let all: Vec<Arc<Proxy>> = self.proxies.read().unwrap().values().cloned().collect();
        for proxy in all {
            proxy.update_state(initial_state.clone(), FORCE_STATE).await;
        }

        let previous = self.scheduler.lock().unwrap().replace(scheduler.clone());
        if let Some(previous) = previous {
            previous.stop();
        }

        scheduler
            .start(
                initial_state,
                self.proxies.clone(),
                self.solutions_tx.clone(),
                self.exceptions_tx.clone(),
            )
            .await;
        scheduler.set_job(task).await;
    }

    /// Siguiente resultado terminal; bloquea hasta que haya uno.
    pub async fn get_solution(&self) -> Result<TaskResult, GridError> {
        self.solutions_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(GridError::ChannelClosed("solutions"))
    }

    /// Siguiente excepción de aplicación; bloquea hasta que haya una.
    pub async fn get_exception(&self) -> Result<String, GridError> {
        self.exceptions_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(GridError::ChannelClosed("exceptions"))
    }

    pub fn current_state(&self) -> SharedState {
        self.state.lock().unwrap().clone()
    }

    pub fn status_string(&self) -> String {
        match self.scheduler.lock().unwrap().clone() {
            Some(scheduler) => scheduler.status_string(),
            None => "sin job activo".to_string(),
        }
    }

    pub fn num_proxies(&self) -> usize {
        self.proxies.read().unwrap().len()
    }
}

#[async_trait]
impl SpaceLink for Space {
    /// Propuesta de fusión que llega de un computer. Solo si la fusión
    /// cambió el estado del space se reenvía, como sugerencia, a todos
    /// los proxies menos al que la originó, para no devolverle el eco.
    async fn update_state(&self, originator_id: u64, proposed: SharedState) -> Result<(), GridError> {
        let changed = {
            let mut current = self.state.lock().unwrap();
            match self.merger.merge(&current, &proposed) {
                Some(new_state) => {
                    *current = new_state;
                    true
                }
                None => false,
            }
        };
        debug!(
            "<={originator_id}= {proposed} ({})",
            if changed { "actualizado" } else { "conservado" }
        );

        if !changed {
            return Ok(());
        }

        let scheduler = self.scheduler.lock().unwrap().clone();
        if let Some(scheduler) = scheduler {
            scheduler.update_state(self.current_state()).await;
        }

        let others: Vec<Arc<Proxy>> = self
            .proxies
            .read()
            .unwrap()
            .values()
            .filter(|p| p.id() != originator_id)
            .cloned()
            .collect();
        for proxy in others {
            proxy.update_state(proposed.clone(), SUGGEST_STATE).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ProxyEvents for Space {
    async fn process_result(&self, result: TaskResult) {
        let scheduler = self.scheduler.lock().unwrap().clone();
        match scheduler {
            Some(scheduler) => scheduler.process_result(result).await,
            None => warn!("resultado sin job activo, se descarta: {result}"),
        }
    }

    async fn on_proxy_error(&self, proxy_id: u64, leftover: Vec<Task>) {
        info!("expulsando al proxy {proxy_id}; vuelven {} tareas", leftover.len());
        let scheduler = self.scheduler.lock().unwrap().clone();
        match scheduler {
            Some(scheduler) => scheduler.reschedule_tasks(leftover).await,
            None => {
                if !leftover.is_empty() {
                    warn!("no hay scheduler para reencolar {} tareas", leftover.len());
                }
            }
        }
        self.proxies.write().unwrap().remove(&proxy_id);
    }
}

/// Cada cierto tiempo deja en el log el progreso del scheduler, solo
/// cuando cambió desde la última vez.
async fn status_loop(space: Arc<Space>) {
    let mut last = String::new();
    loop {
        tokio::time::sleep(STATUS_INTERVAL).await;
        if space.scheduler.lock().unwrap().is_none() {
            continue;
        }
        let status = space.status_string();
        if status != last {
            info!("{status}");
            last = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::result::Outcome;
    use crate::state::{BlankMerger, MaxMerger};
    use serde_json::json;

    /// Computer de mentira que apunta las actualizaciones de estado.
    struct RecordingComputer {
        updates: Mutex<Vec<(SharedState, bool)>>,
    }

    impl RecordingComputer {
        fn new() -> Arc<Self> {
            Arc::new(Self { updates: Mutex::new(Vec::new()) })
        }

        fn updates(&self) -> Vec<(SharedState, bool)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Computer for RecordingComputer {
        async fn add_task(&self, _task: Task) -> Result<(), GridError> {
            Ok(())
        }

        async fn collect_result(&self) -> Result<TaskResult, GridError> {
            std::future::pending().await
        }

        async fn update_state(&self, state: SharedState, force: bool) -> Result<(), GridError> {
            self.updates.lock().unwrap().push((state, force));
            Ok(())
        }

        async fn assign_space(&self, _link: Arc<dyn SpaceLink>, _assigned_id: u64) -> Result<(), GridError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn a_fibonacci_job_runs_end_to_end_on_the_local_computer() {
        let space = Space::start(2, ops::demo_registry(), Arc::new(BlankMerger)).await;

        space.set_job(ops::fib_job(7).with_on_space(true)).await;

        let solution = tokio::time::timeout(Duration::from_secs(15), space.get_solution())
            .await
            .expect("el job debería terminar")
            .unwrap();

        assert!(solution.task_completed);
        match solution.outcome {
            Outcome::Value(v) => assert_eq!(v, json!(13)),
            other => panic!("se esperaba fib(7) = 13, llegó {other:?}"),
        }
        // el camino crítico sale del encadenado real de tareas
        assert!(solution.critical_length_ms >= 0.0);
    }

    #[tokio::test]
    async fn an_unknown_op_surfaces_on_the_exception_queue() {
        let space = Space::start(1, ops::demo_registry(), Arc::new(BlankMerger)).await;

        space
            .set_job(Task::new("rompe", "no-existe", json!({}), 0).with_on_space(true))
            .await;

        let error = tokio::time::timeout(Duration::from_secs(10), space.get_exception())
            .await
            .expect("la excepción debería llegar")
            .unwrap();
        assert!(error.contains("operador desconocido"), "llegó: {error}");
    }

    #[tokio::test]
    async fn state_changes_are_echoed_to_everyone_but_the_originator() {
        let space = Space::start(1, TaskRegistry::new(), Arc::new(MaxMerger)).await;

        let c1 = RecordingComputer::new();
        let c2 = RecordingComputer::new();
        let caps = Capabilities::new(1, 1, false, true);
        let id1 = space.clone().register(c1.clone(), caps).await.unwrap();
        let id2 = space.clone().register(c2.clone(), caps).await.unwrap();

        // al registrarse cada uno recibió un único push forzado
        assert_eq!(c1.updates().len(), 1);
        assert!(c1.updates()[0].1, "el push de registro va forzado");

        // una propuesta que sí cambia el estado del space
        SpaceLink::update_state(space.as_ref(), id1, SharedState(json!(5)))
            .await
            .unwrap();

        // c2 recibe la sugerencia, c1 (el originador) no recibe eco
        let c2_updates = c2.updates();
        assert_eq!(c2_updates.len(), 2);
        assert_eq!(c2_updates[1], (SharedState(json!(5)), false));
        assert_eq!(c1.updates().len(), 1);

        // repetir la misma propuesta no cambia nada y no propaga nada
        SpaceLink::update_state(space.as_ref(), id2, SharedState(json!(5)))
            .await
            .unwrap();
        assert_eq!(c1.updates().len(), 1);
        assert_eq!(c2.updates().len(), 2);
    }

    #[tokio::test]
    async fn the_local_computer_is_registered_at_startup() {
        let space = Space::start(1, TaskRegistry::new(), Arc::new(BlankMerger)).await;
        assert_eq!(space.num_proxies(), 1);
        assert_eq!(space.status_string(), "sin job activo");
    }
}
