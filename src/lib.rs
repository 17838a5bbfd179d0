//! driving_school Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod assembly;
pub mod auth;
pub mod domain;
pub mod handlers;
pub mod jobs;
pub mod store;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{Amount, AmountError, Balance, DomainError, OperationContext};
pub use domain::{LedgerEngine, PlanCatalog, Student};
