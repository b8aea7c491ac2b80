use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::proxy::Proxy;
use crate::result::{Outcome, TaskResult};
use crate::state::SharedState;
use crate::task::{Task, TaskUid, SOLUTION_UID};

/// Pool vivo de proxies del space. El scheduler lo recibe por referencia
/// compartida: un proxy registrado o expulsado después de arrancar se ve
/// sin recablear nada.
pub type ProxyMap = Arc<RwLock<HashMap<u64, Arc<Proxy>>>>;

/* --------- Contrato de scheduler --------- */

/// Política de asignación enchufable. Decide qué proxy recibe qué tarea
/// y encamina los resultados por las aristas del DAG.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Arranca los lazos del scheduler. No debe bloquear: cualquier
    /// proceso largo va en tareas aparte.
    async fn start(
        &self,
        initial_state: SharedState,
        proxies: ProxyMap,
        solutions: mpsc::UnboundedSender<TaskResult>,
        exceptions: mpsc::UnboundedSender<String>,
    );

    /// Fija la tarea raíz del job; su salida queda apuntando al sumidero
    /// de soluciones.
    async fn set_job(&self, task: Task);

    /// Procesa un resultado que trajo un proxy.
    async fn process_result(&self, result: TaskResult);

    /// Reencola un lote de tareas huérfanas de un proxy caído, tal cual.
    async fn reschedule_tasks(&self, tasks: Vec<Task>);

    /// El space avisa de que el estado compartido cambió.
    async fn update_state(&self, state: SharedState);

    /// Instantánea legible del progreso.
    fn status_string(&self) -> String;

    fn stop(&self);
}

/* --------- Pool de tareas listas, ordenado por prioridad --------- */

struct PoolEntry {
    task: Task,
    seq: u64,
}

impl PartialEq for PoolEntry {
    fn eq(&self, other: &Self) -> bool {
        self.task.priority == other.task.priority && self.seq == other.seq
    }
}

impl Eq for PoolEntry {}

impl PartialOrd for PoolEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PoolEntry {
    // mayor prioridad primero; a igual prioridad, orden de llegada
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.task
            .priority
            .cmp(&other.task.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Montículo de tareas listas con despertar por señal: el consumidor no
/// sondea, espera a que alguien empuje.
struct TaskPool {
    heap: Mutex<BinaryHeap<PoolEntry>>,
    available: Notify,
    seq: AtomicU64,
}

impl TaskPool {
    fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            available: Notify::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn push(&self, task: Task) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.heap.lock().unwrap().push(PoolEntry { task, seq });
        self.available.notify_one();
    }

    fn try_pop(&self) -> Option<Task> {
        self.heap.lock().unwrap().pop().map(|entry| entry.task)
    }

    async fn pop(&self) -> Task {
        loop {
            let notified = self.available.notified();
            if let Some(task) = self.try_pop() {
                return task;
            }
            notified.await;
        }
    }

    fn len(&self) -> usize {
        self.heap.lock().unwrap().len()
    }
}

/* --------- Scheduler por defecto --------- */

/// Lo que queda cableado al arrancar: el pool de proxies y los sumideros
/// del space.
struct Ctx {
    proxies: ProxyMap,
    solutions: mpsc::UnboundedSender<TaskResult>,
    exceptions: mpsc::UnboundedSender<String>,
}

/// Registro de tareas vivas más la contabilidad agregada. Todo lo que
/// toca `process_result` vive bajo este único mutex.
struct Inner {
    registered: HashMap<TaskUid, Task>,
    total_runtime_ms: f64,
}

/// Scheduler por prioridades con dos pools separados por localidad: el
/// corto (tareas en-space) y el largo (tareas para workers remotos).
///
/// Ciclo de vida de una tarea: sin registrar -> esperando entradas ->
/// en pool (lista) -> despachada -> resuelta. Una tarea que aún no está
/// lista se queda aparcada en el registro y se vuelve a ofrecer al sorter
/// cuando llega la escritura de entrada que la completa.
pub struct DefaultScheduler {
    inner: Arc<Mutex<Inner>>,
    uid_pool: AtomicI64,

    waiting_tx: mpsc::UnboundedSender<TaskUid>,
    waiting_rx: Mutex<Option<mpsc::UnboundedReceiver<TaskUid>>>,
    waiting_len: Arc<AtomicI64>,

    short_pool: Arc<TaskPool>,
    long_pool: Arc<TaskPool>,

    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    ctx: Mutex<Option<Arc<Ctx>>>,
}

impl Default for DefaultScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultScheduler {
    pub fn new() -> Self {
        let (waiting_tx, waiting_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Mutex::new(Inner { registered: HashMap::new(), total_runtime_ms: 0.0 })),
            uid_pool: AtomicI64::new(SOLUTION_UID + 1),
            waiting_tx,
            waiting_rx: Mutex::new(Some(waiting_rx)),
            waiting_len: Arc::new(AtomicI64::new(0)),
            short_pool: Arc::new(TaskPool::new()),
            long_pool: Arc::new(TaskPool::new()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            ctx: Mutex::new(None),
        }
    }

    /// Registra una tarea: le asigna uid, la mete en el registro y la
    /// ofrece al sorter.
    pub fn schedule(&self, task: Task) {
        let mut inner = self.inner.lock().unwrap();
        self.schedule_locked(&mut inner, task);
    }

    fn schedule_locked(&self, inner: &mut Inner, mut task: Task) {
        task.uid = self.uid_pool.fetch_add(1, Ordering::SeqCst);
        let uid = task.uid;
        inner.registered.insert(uid, task);
        self.offer(uid);
    }

    /// Ofrece un uid al sorter para que decida si ya está listo.
    fn offer(&self, uid: TaskUid) {
        self.waiting_len.fetch_add(1, Ordering::SeqCst);
        let _ = self.waiting_tx.send(uid);
    }

    fn current_ctx(&self) -> Option<Arc<Ctx>> {
        self.ctx.lock().unwrap().clone()
    }

    #[cfg(test)]
    fn registered_task(&self, uid: TaskUid) -> Option<Task> {
        self.inner.lock().unwrap().registered.get(&uid).cloned()
    }
}

#[async_trait]
impl Scheduler for DefaultScheduler {
    async fn start(
        &self,
        _initial_state: SharedState,
        proxies: ProxyMap,
        solutions: mpsc::UnboundedSender<TaskResult>,
        exceptions: mpsc::UnboundedSender<String>,
    ) {
        *self.ctx.lock().unwrap() = Some(Arc::new(Ctx { proxies: proxies.clone(), solutions, exceptions }));
        self.running.store(true, Ordering::SeqCst);

        let waiting_rx = self.waiting_rx.lock().unwrap().take();
        let Some(waiting_rx) = waiting_rx else {
            warn!("el scheduler ya se arrancó una vez, se ignora");
            return;
        };

        tokio::spawn(sorter_loop(
            waiting_rx,
            self.waiting_len.clone(),
            self.inner.clone(),
            self.short_pool.clone(),
            self.long_pool.clone(),
            self.running.clone(),
            self.shutdown.clone(),
        ));

        tokio::spawn(assigner_loop(
            self.short_pool.clone(),
            proxies.clone(),
            true,
            self.running.clone(),
            self.shutdown.clone(),
        ));
        tokio::spawn(assigner_loop(
            self.long_pool.clone(),
            proxies,
            false,
            self.running.clone(),
            self.shutdown.clone(),
        ));
    }

    async fn set_job(&self, mut task: Task) {
        task.set_target(SOLUTION_UID, 0);
        self.schedule(task);
    }

    /// Único tramo serializado del scheduler: muta el registro de tareas
    /// y el acumulado de runtime desde los recolectores de varios proxies
    /// a la vez.
    async fn process_result(&self, result: TaskResult) {
        let Some(ctx) = self.current_ctx() else {
            warn!("resultado recibido sin scheduler arrancado, se descarta");
            return;
        };

        let TaskResult { outcome, creator_uid, run_time_ms, critical_length_ms, task_completed } = result;

        let mut inner = self.inner.lock().unwrap();
        inner.total_runtime_ms += run_time_ms;
        let parent_path_ms = critical_length_ms + run_time_ms;

        match outcome {
            Outcome::Value(value) => {
                let Some(origin) = inner.registered.get(&creator_uid) else {
                    warn!("resultado de una tarea desconocida [{creator_uid}], se descarta");
                    return;
                };
                let (target_uid, target_port) = (origin.target_uid, origin.target_port);

                if target_uid == SOLUTION_UID {
                    // valor terminal: se sella con el camino crítico y el
                    // runtime total observado por el coordinador
                    let terminal = TaskResult {
                        outcome: Outcome::Value(value),
                        creator_uid: SOLUTION_UID,
                        run_time_ms: inner.total_runtime_ms,
                        critical_length_ms: parent_path_ms,
                        task_completed: true,
                    };
                    info!("solución publicada: {terminal}");
                    let _ = ctx.solutions.send(terminal);
                } else {
                    match inner.registered.get_mut(&target_uid) {
                        Some(target) => {
                            target.set_input(target_port, value);
                            target.add_critical_length_of_parent(parent_path_ms);
                            if target.is_ready() {
                                // la escritura que la completó la despierta
                                self.offer(target_uid);
                            }
                        }
                        None => warn!("el destino [{target_uid}] ya no está registrado, valor perdido"),
                    }
                }
            }

            Outcome::Tasks(mut batch) => {
                // primera pasada: uid nuevo y camino crítico heredado
                for task in batch.iter_mut() {
                    task.uid = self.uid_pool.fetch_add(1, Ordering::SeqCst);
                    task.add_critical_length_of_parent(parent_path_ms);
                }

                // segunda pasada: un target negativo es una referencia
                // dentro del propio lote (-1 es el primer elemento)
                for i in 0..batch.len() {
                    let target = batch[i].target_uid;
                    if target < 0 {
                        let index = (-target) as usize - 1;
                        if index < batch.len() {
                            let real_uid = batch[index].uid;
                            let port = batch[i].target_port;
                            batch[i].set_target(real_uid, port);
                        } else {
                            warn!("referencia local {target} fuera del lote de {} tareas", batch.len());
                        }
                    }
                }

                for task in batch {
                    let uid = task.uid;
                    debug!("tarea nueva registrada: {task}");
                    inner.registered.insert(uid, task);
                    self.offer(uid);
                }
            }

            Outcome::Exception(error) => {
                // una excepción de aplicación no toca el DAG
                warn!("excepción de la tarea [{creator_uid}]: {error}");
                let _ = ctx.exceptions.send(error);
            }
        }

        if task_completed {
            inner.registered.remove(&creator_uid);
        }
    }

    async fn reschedule_tasks(&self, tasks: Vec<Task>) {
        if tasks.is_empty() {
            return;
        }
        info!("reencolando {} tareas huérfanas", tasks.len());
        let mut inner = self.inner.lock().unwrap();
        for task in tasks {
            let uid = task.uid;
            inner.registered.insert(uid, task);
            self.offer(uid);
        }
    }

    async fn update_state(&self, state: SharedState) {
        // la política por defecto no reacciona al estado compartido
        debug!("scheduler: {state} recibido");
    }

    fn status_string(&self) -> String {
        let registered = self.inner.lock().unwrap().registered.len();

        let mut out = format!(
            "{} remotas en pool, {} locales en pool, {} por ordenar, {} registradas | computers:",
            self.long_pool.len(),
            self.short_pool.len(),
            self.waiting_len.load(Ordering::SeqCst).max(0),
            registered,
        );

        if let Some(ctx) = self.current_ctx() {
            for proxy in ctx.proxies.read().unwrap().values() {
                out.push_str(&format!(
                    " [{}: {}/{} ({} en vuelo)]",
                    proxy.id(),
                    proxy.num_dispatched(),
                    proxy.num_collected(),
                    proxy.num_queued(),
                ));
            }
        }
        out
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }
}

/// Saca uids ofrecidos y mueve al pool que toque las tareas que ya están
/// listas; las que no, se quedan registradas hasta que una escritura de
/// entrada las vuelva a ofrecer.
async fn sorter_loop(
    mut waiting_rx: mpsc::UnboundedReceiver<TaskUid>,
    waiting_len: Arc<AtomicI64>,
    inner: Arc<Mutex<Inner>>,
    short_pool: Arc<TaskPool>,
    long_pool: Arc<TaskPool>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        let uid = tokio::select! {
            uid = waiting_rx.recv() => match uid {
                Some(uid) => uid,
                None => break,
            },
            _ = shutdown.notified() => break,
        };
        if !running.load(Ordering::SeqCst) {
            break;
        }
        waiting_len.fetch_sub(1, Ordering::SeqCst);

        let ready_task = {
            let inner = inner.lock().unwrap();
            inner.registered.get(&uid).filter(|task| task.is_ready()).cloned()
        };
        let Some(task) = ready_task else { continue };

        if task.on_space {
            short_pool.push(task);
        } else {
            long_pool.push(task);
        }
    }
}

/// Asigna tareas de un pool a los proxies de su localidad. Elige el
/// proxy elegible menos cargado con hueco en el buffer; si el proxy se
/// detuvo justo antes, la tarea vuelve al pool en vez de perderse.
async fn assigner_loop(
    pool: Arc<TaskPool>,
    proxies: ProxyMap,
    want_on_space: bool,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        let task = tokio::select! {
            task = pool.pop() => task,
            _ = shutdown.notified() => break,
        };
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let candidate = {
            let map = proxies.read().unwrap();
            map.values()
                .filter(|p| p.capabilities().on_space == want_on_space && p.is_running() && !p.is_buffer_full())
                .min_by_key(|p| p.num_queued())
                .cloned()
        };

        match candidate {
            Some(proxy) => {
                if proxy.assign_task(task.clone()).is_err() {
                    pool.push(task);
                }
            }
            None => {
                // sin proxy elegible ahora mismo: devuelve la tarea y
                // vuelve a mirar en un rato
                pool.push(task);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::computer::Computer;
    use crate::error::GridError;
    use crate::proxy::ProxyEvents;
    use serde_json::json;

    struct NullEvents;

    #[async_trait]
    impl ProxyEvents for NullEvents {
        async fn process_result(&self, _result: TaskResult) {}
        async fn on_proxy_error(&self, _proxy_id: u64, _leftover: Vec<Task>) {}
    }

    /// Computer que apunta lo que le llega y nunca produce resultados.
    struct SinkComputer {
        added: Mutex<Vec<Task>>,
    }

    impl SinkComputer {
        fn new() -> Arc<Self> {
            Arc::new(Self { added: Mutex::new(Vec::new()) })
        }

        fn added_uids(&self) -> Vec<TaskUid> {
            self.added.lock().unwrap().iter().map(|t| t.uid).collect()
        }
    }

    #[async_trait]
    impl Computer for SinkComputer {
        async fn add_task(&self, task: Task) -> Result<(), GridError> {
            self.added.lock().unwrap().push(task);
            Ok(())
        }

        async fn collect_result(&self) -> Result<TaskResult, GridError> {
            std::future::pending().await
        }

        async fn update_state(&self, _state: SharedState, _force: bool) -> Result<(), GridError> {
            Ok(())
        }

        async fn assign_space(
            &self,
            _link: Arc<dyn crate::computer::SpaceLink>,
            _assigned_id: u64,
        ) -> Result<(), GridError> {
            Ok(())
        }
    }

    type Sinks = (
        mpsc::UnboundedReceiver<TaskResult>,
        mpsc::UnboundedReceiver<String>,
    );

    async fn started_scheduler(proxies: ProxyMap) -> (DefaultScheduler, Sinks) {
        let scheduler = DefaultScheduler::new();
        let (sol_tx, sol_rx) = mpsc::unbounded_channel();
        let (exc_tx, exc_rx) = mpsc::unbounded_channel();
        scheduler.start(SharedState::blank(), proxies, sol_tx, exc_tx).await;
        (scheduler, (sol_rx, exc_rx))
    }

    fn empty_proxies() -> ProxyMap {
        Arc::new(RwLock::new(HashMap::new()))
    }

    async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
        let waited = tokio::time::timeout(Duration::from_secs(3), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "esperando: {what}");
    }

    #[tokio::test]
    async fn spawned_batch_resolves_negative_back_references() {
        let (scheduler, _sinks) = started_scheduler(empty_proxies()).await;
        scheduler.set_job(Task::new("raíz", "fib", json!({"n": 5}), 0)).await;

        let mut left = Task::new("left", "fib", json!({"n": 4}), 0);
        left.set_target(-3, 0);
        let mut right = Task::new("right", "fib", json!({"n": 3}), 0);
        right.set_target(-3, 1);
        let mut join = Task::new("join", "add", json!({}), 2);
        join.set_target(SOLUTION_UID, 0);

        scheduler
            .process_result(TaskResult {
                outcome: Outcome::Tasks(vec![left, right, join]),
                creator_uid: 1,
                run_time_ms: 4.0,
                critical_length_ms: 6.0,
                task_completed: true,
            })
            .await;

        // el lote recibió los uids 2, 3 y 4; -3 apunta al tercero
        let left = scheduler.registered_task(2).expect("left registrada");
        let right = scheduler.registered_task(3).expect("right registrada");
        let join = scheduler.registered_task(4).expect("join registrada");

        assert_eq!(left.target_uid, join.uid);
        assert_eq!(left.target_port, 0);
        assert_eq!(right.target_uid, join.uid);
        assert_eq!(right.target_port, 1);

        // el camino crítico del padre se hereda
        assert_eq!(left.critical_length_ms, 10.0);

        // la raíz terminó y sale del registro
        assert!(scheduler.registered_task(1).is_none());
    }

    #[tokio::test]
    async fn value_for_the_solution_sink_publishes_one_terminal_result() {
        let (scheduler, (mut sol_rx, _exc_rx)) = started_scheduler(empty_proxies()).await;
        scheduler.set_job(Task::new("raíz", "fib", json!({"n": 1}), 0)).await;

        scheduler
            .process_result(TaskResult {
                outcome: Outcome::Value(json!(99)),
                creator_uid: 1,
                run_time_ms: 5.0,
                critical_length_ms: 7.0,
                task_completed: true,
            })
            .await;

        let terminal = sol_rx.recv().await.expect("debería haber una solución");
        assert_eq!(terminal.creator_uid, SOLUTION_UID);
        assert!(terminal.task_completed);
        assert_eq!(terminal.critical_length_ms, 12.0);
        assert_eq!(terminal.run_time_ms, 5.0);
        match terminal.outcome {
            Outcome::Value(v) => assert_eq!(v, json!(99)),
            other => panic!("se esperaba un valor, llegó {other:?}"),
        }

        assert!(scheduler.registered_task(1).is_none());
        assert!(sol_rx.try_recv().is_err(), "exactamente una solución");
    }

    #[tokio::test]
    async fn application_exceptions_go_to_the_exception_queue() {
        let (scheduler, (mut sol_rx, mut exc_rx)) = started_scheduler(empty_proxies()).await;
        scheduler.set_job(Task::new("raíz", "fib", json!({}), 0)).await;

        scheduler
            .process_result(TaskResult {
                outcome: Outcome::Exception("división por cero".into()),
                creator_uid: 1,
                run_time_ms: 1.0,
                critical_length_ms: 0.0,
                task_completed: true,
            })
            .await;

        assert_eq!(exc_rx.recv().await.unwrap(), "división por cero");
        assert!(sol_rx.try_recv().is_err(), "una excepción no produce solución");
    }

    #[tokio::test]
    async fn ready_tasks_reach_an_eligible_proxy() {
        let computer = SinkComputer::new();
        let proxy = Proxy::start(
            computer.clone(),
            Capabilities::new(1, 5, true, false),
            0,
            Arc::new(NullEvents),
        );
        let proxies = empty_proxies();
        proxies.write().unwrap().insert(0, proxy);

        let (scheduler, _sinks) = started_scheduler(proxies).await;
        scheduler
            .set_job(Task::new("semilla", "fib", json!({"n": 2}), 0).with_on_space(true))
            .await;

        wait_until("la semilla se despacha", || computer.added_uids() == vec![1]).await;
    }

    #[tokio::test]
    async fn a_two_port_task_is_dispatched_only_after_both_inputs() {
        let computer = SinkComputer::new();
        let proxy = Proxy::start(
            computer.clone(),
            Capabilities::new(2, 8, true, false),
            0,
            Arc::new(NullEvents),
        );
        let proxies = empty_proxies();
        proxies.write().unwrap().insert(0, proxy);

        let (scheduler, _sinks) = started_scheduler(proxies).await;
        scheduler
            .set_job(Task::new("raíz", "fib", json!({"n": 9}), 0).with_on_space(true))
            .await;
        wait_until("la raíz se despacha", || computer.added_uids().len() == 1).await;

        // la raíz genera dos hojas y un join de dos puertos
        let mut left = Task::new("left", "fib", json!({"n": 1}), 0).with_on_space(true);
        left.set_target(-3, 0);
        let mut right = Task::new("right", "fib", json!({"n": 1}), 0).with_on_space(true);
        right.set_target(-3, 1);
        let join = Task::new("join", "add", json!({}), 2).with_on_space(true);

        scheduler
            .process_result(TaskResult {
                outcome: Outcome::Tasks(vec![left, right, join]),
                creator_uid: 1,
                run_time_ms: 1.0,
                critical_length_ms: 0.0,
                task_completed: true,
            })
            .await;

        // las hojas (uids 2 y 3) se despachan; el join (uid 4) espera
        wait_until("las hojas se despachan", || computer.added_uids().len() == 3).await;
        assert!(!computer.added_uids().contains(&4), "el join no puede salir sin entradas");

        // primera entrada: sigue sin estar listo
        scheduler
            .process_result(TaskResult {
                outcome: Outcome::Value(json!(1)),
                creator_uid: 2,
                run_time_ms: 1.0,
                critical_length_ms: 1.0,
                task_completed: true,
            })
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!computer.added_uids().contains(&4), "con un solo puerto escrito no sale");

        // segunda entrada: ahora sí
        scheduler
            .process_result(TaskResult {
                outcome: Outcome::Value(json!(1)),
                creator_uid: 3,
                run_time_ms: 1.0,
                critical_length_ms: 1.0,
                task_completed: true,
            })
            .await;
        wait_until("el join se despacha", || computer.added_uids().contains(&4)).await;
    }

    #[tokio::test]
    async fn rescheduled_tasks_keep_their_uids() {
        let (scheduler, _sinks) = started_scheduler(empty_proxies()).await;

        let mut orphan = Task::new("huérfana", "fib", json!({}), 0);
        orphan.uid = 42;
        scheduler.reschedule_tasks(vec![orphan]).await;

        let recovered = scheduler.registered_task(42).expect("reencolada con su uid");
        assert_eq!(recovered.uid, 42);
    }

    #[tokio::test]
    async fn higher_priority_tasks_leave_the_pool_first() {
        let pool = TaskPool::new();
        pool.push(Task::new("baja", "op", json!({}), 0).with_priority(1));
        pool.push(Task::new("alta", "op", json!({}), 0).with_priority(9));
        pool.push(Task::new("media", "op", json!({}), 0).with_priority(5));

        assert_eq!(pool.try_pop().unwrap().name, "alta");
        assert_eq!(pool.try_pop().unwrap().name, "media");
        assert_eq!(pool.try_pop().unwrap().name, "baja");
        assert!(pool.try_pop().is_none());
    }
}
