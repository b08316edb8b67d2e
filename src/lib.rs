//! datflow
//!
//! Crate raíz de la aplicación:
//! - `config`: `AppConfig` (base de datos opcional y cola del worker).
//! - `errors`: `AppError`, el error que ven los binarios.
//! - `snapshot`: volcado JSON del catálogo y los logs para trabajar offline.
//! - `app`: ensamblado del servicio de ejecuciones y el orquestador.
//!
//! Lo usan `main.rs` (demo) y el crate `dat-cli`.

pub mod app;
pub mod config;
pub mod errors;
pub mod snapshot;

pub use app::App;
pub use config::AppConfig;
pub use errors::AppError;
pub use snapshot::Snapshot;
