//! Errores de la capa de aplicación.
pub mod app_error;

pub use app_error::AppError;
