//! # Inventory Server
//!
//! HTTP front of the hardware-store inventory back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Inventory Server                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  routes        │  │  facade        │  │  services                  ││
//! │  │                │  │                │  │                            ││
//! │  │ • POST  invoke │─►│ • Basic auth   │─►│ • InventoryService         ││
//! │  │ • GET   catalog│  │ • role gate    │  │ • AuthService              ││
//! │  │ • request id   │  │ • Envelope     │  │ • HealthService            ││
//! │  └────────────────┘  └────────────────┘  └─────────────┬──────────────┘│
//! │                                                         │               │
//! │  ┌──────────────────────────────────────────────────────▼────────────┐  │
//! │  │                 ferreteria-db (SQLite, WAL)                        │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ServerConfig`]. Environment variables use the
//! `INVENTORY__` prefix, e.g. `INVENTORY__SERVER__PORT=9090`.

use std::sync::Arc;

use ferreteria_core::Authenticator;
use ferreteria_db::Database;

pub mod auth;
pub mod config;
pub mod error;
pub mod facade;
pub mod routes;
pub mod services;
pub mod telemetry;

// Re-exports
pub use config::ServerConfig;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use facade::{Envelope, Facade};
pub use routes::build_router;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub facade: Facade,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, authenticator: Arc<Authenticator>, config: ServerConfig) -> Self {
        AppState {
            facade: Facade::new(db, authenticator),
            config: Arc::new(config),
        }
    }
}
