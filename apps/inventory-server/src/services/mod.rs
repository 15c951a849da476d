//! Services behind the facade.
//!
//! - [`inventory_service`] - item catalog, stock changes and their audit
//! - [`auth_service`] - caller identity, role checks, password changes
//! - [`health_service`] - store probe

pub mod auth_service;
pub mod health_service;
pub mod inventory_service;

pub use auth_service::{load_authenticator, AuthService};
pub use health_service::{HealthReport, HealthService, HEALTHY_MESSAGE};
pub use inventory_service::{InventoryService, Outcome, StockSet};
