//! Error types surfaced to HTTP clients.

pub mod app_error;

pub use app_error::{AppError, AppResult};
