use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::capabilities::Capabilities;
use crate::computer::Computer;
use crate::error::GridError;
use crate::result::TaskResult;
use crate::state::SharedState;
use crate::task::{Task, TaskUid};

/// Eventos que el proxy devuelve a su dueño (el space).
#[async_trait]
pub trait ProxyEvents: Send + Sync {
    /// Cada resultado recogido, parcial o terminal.
    async fn process_result(&self, result: TaskResult);

    /// El proxy murió: aquí van las tareas en vuelo que nunca se
    /// llegaron a recoger, para que alguien las reencole.
    async fn on_proxy_error(&self, proxy_id: u64, leftover: Vec<Task>);
}

/// Handle del coordinador para un computer concreto.
///
/// Dos lazos dedicados: el despachador saca tareas de la cola asignada y
/// las manda por `add_task`; el recolector se queda bloqueado en
/// `collect_result` y reenvía cada resultado al scheduler. Un fallo de
/// transporte en cualquiera de los dos detiene el proxy exactamente una
/// vez y entrega su registro de tareas en vuelo para reasignación; el
/// proxy nunca reintenta una llamada remota.
pub struct Proxy {
    id: u64,
    caps: Capabilities,
    computer: Arc<dyn Computer>,
    assigned_tx: mpsc::UnboundedSender<Task>,

    /// Tareas despachadas cuyo resultado terminal aún no volvió.
    /// Es la unidad de recuperación cuando el computer se cae.
    task_registry: Arc<Mutex<HashMap<TaskUid, Task>>>,

    running: Arc<Mutex<bool>>,

    /// Despachadas y todavía sin resultado terminal; los parciales no
    /// liberan hueco.
    num_queued: Arc<AtomicI64>,
    num_dispatched: Arc<AtomicU64>,
    num_collected: Arc<AtomicU64>,
}

impl Proxy {
    /// Construye el proxy y arranca sus dos lazos.
    pub fn start(computer: Arc<dyn Computer>, caps: Capabilities, id: u64, events: Arc<dyn ProxyEvents>) -> Arc<Self> {
        let (assigned_tx, assigned_rx) = mpsc::unbounded_channel();

        let proxy = Arc::new(Self {
            id,
            caps,
            computer,
            assigned_tx,
            task_registry: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(Mutex::new(true)),
            num_queued: Arc::new(AtomicI64::new(0)),
            num_dispatched: Arc::new(AtomicU64::new(0)),
            num_collected: Arc::new(AtomicU64::new(0)),
        });

        tokio::spawn(dispatcher_loop(proxy.clone(), assigned_rx, events.clone()));
        tokio::spawn(collector_loop(proxy.clone(), events));

        proxy
    }

    /// Encola una tarea hacia el computer. Si el proxy ya se detuvo el
    /// que llama tiene que reencolarla él mismo: esta es la única señal
    /// de que el proxy murió sin andar consultando.
    pub fn assign_task(&self, task: Task) -> Result<(), GridError> {
        if !self.is_running() {
            return Err(GridError::ProxyStopped(self.id));
        }
        self.assigned_tx.send(task).map_err(|_| GridError::ProxyStopped(self.id))
    }

    /// Manda el estado al computer. Un fallo aquí solo se avisa: la
    /// caída real se detectará en el despacho o la recogida.
    pub async fn update_state(&self, state: SharedState, force: bool) {
        if !self.is_running() {
            return;
        }
        debug!("==> proxy {}: {state}{}", self.id, if force { " (forzado)" } else { "" });
        if let Err(e) = self.computer.update_state(state, force).await {
            warn!("no se pudo mandar el estado al proxy {}: {e}", self.id);
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock().unwrap()
    }

    /// Despachadas sin resultado terminal todavía.
    pub fn num_queued(&self) -> i64 {
        self.num_queued.load(Ordering::SeqCst)
    }

    /// Lleno cuando lo encolado cubre el buffer de prefetch más un hueco
    /// por hilo del computer.
    pub fn is_buffer_full(&self) -> bool {
        self.num_queued() >= (self.caps.buffer_size + self.caps.num_threads) as i64
    }

    pub fn num_dispatched(&self) -> u64 {
        self.num_dispatched.load(Ordering::SeqCst)
    }

    pub fn num_collected(&self) -> u64 {
        self.num_collected.load(Ordering::SeqCst)
    }

    /// Transición terminal, exactamente una vez: marca el proxy como
    /// detenido y entrega todo el registro en vuelo.
    async fn stop_with_error(&self, events: &Arc<dyn ProxyEvents>) {
        let leftover: Vec<Task> = {
            let mut running = self.running.lock().unwrap();
            if !*running {
                return;
            }
            *running = false;
            let mut registry = self.task_registry.lock().unwrap();
            registry.drain().map(|(_, task)| task).collect()
        };

        warn!("proxy {} detenido; devuelve {} tareas en vuelo", self.id, leftover.len());
        events.on_proxy_error(self.id, leftover).await;
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy {} ({})", self.id, self.caps)
    }
}

/// Saca tareas asignadas, las apunta en el registro en vuelo y las manda
/// al computer. Un error de transporte detiene el proxy y termina el lazo.
async fn dispatcher_loop(proxy: Arc<Proxy>, mut assigned_rx: mpsc::UnboundedReceiver<Task>, events: Arc<dyn ProxyEvents>) {
    while let Some(task) = assigned_rx.recv().await {
        if !proxy.is_running() {
            break;
        }

        proxy.task_registry.lock().unwrap().insert(task.uid, task.clone());
        proxy.num_queued.fetch_add(1, Ordering::SeqCst);
        debug!("={}=> {task}", proxy.id);

        if let Err(e) = proxy.computer.add_task(task).await {
            warn!("fallo despachando al proxy {}: {e}", proxy.id);
            proxy.stop_with_error(&events).await;
            break;
        }
        proxy.num_dispatched.fetch_add(1, Ordering::SeqCst);
    }
}

/// Se queda bloqueado en `collect_result`; un terminal saca la tarea del
/// registro en vuelo y libera su hueco, un parcial no. Todo resultado se
/// reenvía al scheduler.
async fn collector_loop(proxy: Arc<Proxy>, events: Arc<dyn ProxyEvents>) {
    while proxy.is_running() {
        match proxy.computer.collect_result().await {
            Ok(result) => {
                if result.task_completed {
                    proxy.task_registry.lock().unwrap().remove(&result.creator_uid);
                    proxy.num_queued.fetch_sub(1, Ordering::SeqCst);
                }
                debug!("<== {}- {result}", proxy.id);
                proxy.num_collected.fetch_add(1, Ordering::SeqCst);
                events.process_result(result).await;
            }
            Err(e) => {
                warn!("fallo recogiendo del proxy {}: {e}", proxy.id);
                proxy.stop_with_error(&events).await;
                break;
            }
        }
    }
}
