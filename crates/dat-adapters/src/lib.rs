//! dat-adapters: frontera con los conectores y la cola de trabajo.
//!
//! - `registry`: conectores registrados al arrancar, indexados por
//!   `(actor_type, module_name, actor_name)`.
//! - `dispatch`: capacidad `TaskDispatcher` inyectada (fire-and-forget).
//! - `orchestra`: arma la configuración de una conexión y dispara runs.
pub mod dispatch;
pub mod orchestra;
pub mod registry;

pub use dispatch::{DispatchError, InMemoryDispatcher, StdoutDispatcher, SubmittedTask, TaskDispatcher};
pub use orchestra::{ConnectionOrchestrator, DispatchSettings, OrchestraConfig, OrchestraError, DEFAULT_WORKER_QUEUE,
                    DEFAULT_WORKER_TASK};
pub use registry::{CheckStatus, ConnectionStatus, Connector, ConnectorError, ConnectorKey, ConnectorRegistry,
                   ConnectorSpecification, StaticConnector};
