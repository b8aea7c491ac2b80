use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::computer::{Computer, SpaceLink};
use crate::error::GridError;
use crate::result::{Outcome, TaskResult};
use crate::state::{SharedState, StateMerger};
use crate::task::{Task, TaskContext, TaskRegistry, TaskUid};

/// Computer: ejecuta tareas sobre un pool fijo de hilos.
///
/// Dos colas: la de entrada es acotada (el tamaño del buffer de prefetch
/// de sus capacidades), así que `add_task` bloquea al coordinador cuando
/// está llena; la de salida es ilimitada. Esa cota es todo el control de
/// concurrencia del computer: solo los workers leen la cola de entrada y
/// solo la llamada remota escribe en ella.
pub struct ComputeNode {
    caps: Capabilities,
    tasks_tx: mpsc::Sender<Task>,
    results_rx: AsyncMutex<mpsc::UnboundedReceiver<TaskResult>>,
    shared: Arc<NodeShared>,
}

/// Lo que comparten los workers, el reenviador de estado y la fachada RPC.
struct NodeShared {
    state: Mutex<SharedState>,
    merger: Arc<dyn StateMerger>,
    link: Mutex<Option<(u64, Arc<dyn SpaceLink>)>>,
    proposals_tx: mpsc::UnboundedSender<SharedState>,
}

impl NodeShared {
    /// Fusiona en local y, solo si la fusión cambió algo, encola el
    /// estado resultante para reportarlo al space.
    fn merge_and_report(&self, proposed: SharedState) {
        let merged = {
            let mut current = self.state.lock().unwrap();
            match self.merger.merge(&current, &proposed) {
                Some(new_state) => {
                    *current = new_state.clone();
                    Some(new_state)
                }
                None => None,
            }
        };

        if let Some(new_state) = merged {
            let _ = self.proposals_tx.send(new_state);
        }
    }
}

impl ComputeNode {
    /// Arranca los hilos del pool y el reenviador de estado. Hay que
    /// llamarlo dentro de un runtime de tokio.
    pub fn new(caps: Capabilities, registry: TaskRegistry, merger: Arc<dyn StateMerger>) -> Arc<Self> {
        let (tasks_tx, tasks_rx) = mpsc::channel(caps.buffer_size.max(1));
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (proposals_tx, proposals_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(NodeShared {
            state: Mutex::new(SharedState::blank()),
            merger,
            link: Mutex::new(None),
            proposals_tx,
        });

        tokio::spawn(forward_proposals(shared.clone(), proposals_rx));

        let tasks_rx = Arc::new(AsyncMutex::new(tasks_rx));
        for worker_id in 0..caps.num_threads {
            tokio::spawn(worker_loop(
                worker_id,
                tasks_rx.clone(),
                results_tx.clone(),
                registry.clone(),
                shared.clone(),
            ));
        }

        Arc::new(Self {
            caps,
            tasks_tx,
            results_rx: AsyncMutex::new(results_rx),
            shared,
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn current_state(&self) -> SharedState {
        self.shared.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl Computer for ComputeNode {
    async fn add_task(&self, task: Task) -> Result<(), GridError> {
        debug!("--> {task}");
        self.tasks_tx
            .send(task)
            .await
            .map_err(|_| GridError::ChannelClosed("tasks"))
    }

    async fn collect_result(&self) -> Result<TaskResult, GridError> {
        let mut results = self.results_rx.lock().await;
        let result = results.recv().await.ok_or(GridError::ChannelClosed("results"))?;
        debug!("<-- {result}");
        Ok(result)
    }

    async fn update_state(&self, state: SharedState, force: bool) -> Result<(), GridError> {
        debug!("--> {state}{}", if force { " (forzado)" } else { "" });
        let mut current = self.shared.state.lock().unwrap();
        if force {
            *current = state;
        } else if let Some(new_state) = self.shared.merger.merge(&current, &state) {
            *current = new_state;
        }
        Ok(())
    }

    async fn assign_space(&self, link: Arc<dyn SpaceLink>, assigned_id: u64) -> Result<(), GridError> {
        *self.shared.link.lock().unwrap() = Some((assigned_id, link));
        Ok(())
    }
}

/// Saca propuestas de estado ya fusionadas y las sube al space.
async fn forward_proposals(shared: Arc<NodeShared>, mut proposals: mpsc::UnboundedReceiver<SharedState>) {
    while let Some(state) = proposals.recv().await {
        let link = shared.link.lock().unwrap().clone();
        match link {
            Some((id, link)) => {
                debug!("<-- {state}");
                if let Err(e) = link.update_state(id, state).await {
                    warn!("no se pudo reportar el estado al space: {e}");
                }
            }
            None => warn!("el computer no sabe en qué space está registrado"),
        }
    }
}

/// Un hilo del pool: saca una tarea, la ejecuta en un hilo de bloqueo
/// con una instantánea del estado, y empuja el resultado terminal.
async fn worker_loop(
    worker_id: usize,
    tasks_rx: Arc<AsyncMutex<mpsc::Receiver<Task>>>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
    registry: TaskRegistry,
    shared: Arc<NodeShared>,
) {
    loop {
        let task = { tasks_rx.lock().await.recv().await };
        let Some(task) = task else { break };

        let creator_uid = task.uid;
        let critical_length_ms = task.critical_length_ms;
        debug!("hilo {worker_id}: ejecuta {task}");

        let state_snapshot = shared.state.lock().unwrap().clone();
        let registry = registry.clone();
        let results = results_tx.clone();
        let ctx_shared = shared.clone();

        let joined = tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let mut ctx = WorkerContext {
                worker_id,
                creator_uid,
                critical_length_ms,
                started,
                results,
                shared: ctx_shared,
            };

            let outcome = match registry.get(&task.op) {
                Some(executor) => executor.execute(&task, &state_snapshot, &mut ctx),
                None => Outcome::Exception(format!("operador desconocido '{}' en {}", task.op, task)),
            };

            TaskResult {
                outcome,
                creator_uid,
                run_time_ms: elapsed_ms(started),
                critical_length_ms,
                task_completed: true,
            }
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(e) => TaskResult {
                outcome: Outcome::Exception(format!("pánico ejecutando la tarea {creator_uid}: {e}")),
                creator_uid,
                run_time_ms: 0.0,
                critical_length_ms,
                task_completed: true,
            },
        };

        debug!("hilo {worker_id}: produce {result}");
        if results_tx.send(result).is_err() {
            break;
        }
    }
}

/// Contexto entregado al ejecutor; vive dentro del hilo de bloqueo.
struct WorkerContext {
    worker_id: usize,
    creator_uid: TaskUid,
    critical_length_ms: f64,
    started: Instant,
    results: mpsc::UnboundedSender<TaskResult>,
    shared: Arc<NodeShared>,
}

impl TaskContext for WorkerContext {
    fn partial(&mut self, outcome: Outcome) {
        let result = TaskResult {
            outcome,
            creator_uid: self.creator_uid,
            run_time_ms: elapsed_ms(self.started),
            critical_length_ms: self.critical_length_ms,
            task_completed: false,
        };
        let _ = self.results.send(result);
    }

    fn update_state(&mut self, proposed: SharedState) {
        self.shared.merge_and_report(proposed);
    }

    fn progress(&mut self, message: &str) {
        info!("hilo {}: {}", self.worker_id, message);
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
