//! Motor de coordinación maestro/worker sobre un DAG de tareas.
//!
//! El space acepta un DAG de tareas, lo reparte entre computers
//! heterogéneos a través de proxies, recoge resultados, recablea las
//! aristas del DAG según van llegando valores y publica los terminales
//! en una cola visible para el cliente. La política de asignación es un
//! `Scheduler` enchufable; ortogonalmente circula un estado compartido
//! que converge por fusiones de la aplicación.

pub mod capabilities;
pub mod computer;
pub mod error;
pub mod node;
pub mod ops;
pub mod protocol;
pub mod proxy;
pub mod result;
pub mod scheduler;
pub mod space;
pub mod state;
pub mod task;

pub use capabilities::Capabilities;
pub use computer::{Computer, SpaceLink};
pub use error::GridError;
pub use node::ComputeNode;
pub use proxy::{Proxy, ProxyEvents};
pub use result::{Outcome, TaskResult};
pub use scheduler::{DefaultScheduler, ProxyMap, Scheduler};
pub use space::Space;
pub use state::{BlankMerger, MaxMerger, SharedState, StateMerger};
pub use task::{Task, TaskContext, TaskExecutor, TaskRegistry, TaskUid, SOLUTION_UID};
