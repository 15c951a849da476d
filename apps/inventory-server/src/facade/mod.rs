//! # Service Facade
//!
//! Turns one request into one envelope.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  credentials ──► authenticate ──────────── fail ──► AUTH      (401)     │
//! │                       │                                                 │
//! │  body ──────────► {"operation", "args"} ── bad ───► VALIDATION (200)    │
//! │                       │                                                 │
//! │                  Operation::from_str ───── unknown ► FORBIDDEN (403)    │
//! │                       │                                                 │
//! │                  role >= required ? ────── no ────► FORBIDDEN (403)    │
//! │                       │                                                 │
//! │                  dispatch (own task) ───── panic ─► INTERNAL   (200)    │
//! │                       │                                                 │
//! │                  Envelope { successful, message, payload, warnings }    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The dispatch task is aborted if the request future is dropped (client
//! gone), which drops any open stock transaction and rolls it back.

pub mod args;
pub mod envelope;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, field, info, info_span, Instrument, Span};

use ferreteria_core::{Authenticator, Operation, User};
use ferreteria_db::Database;

use crate::auth::Credentials;
use crate::error::{ServiceError, ServiceResult};
use crate::services::{AuthService, HealthService, InventoryService};

pub use args::Args;
pub use envelope::{Envelope, ItemDto, MovementDto, Payload};

/// Per-request inputs that don't come from the body.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Deserialize)]
struct FacadeRequest {
    operation: String,
    #[serde(default)]
    args: Map<String, Value>,
}

/// The single entry point for every operation.
#[derive(Debug, Clone)]
pub struct Facade {
    inventory: InventoryService,
    auth: AuthService,
    health: HealthService,
}

impl Facade {
    pub fn new(db: Database, authenticator: Arc<Authenticator>) -> Self {
        Facade {
            inventory: InventoryService::new(db.clone()),
            auth: AuthService::new(authenticator, db.clone()),
            health: HealthService::new(db),
        }
    }

    /// Handles one request body and always produces an envelope.
    pub async fn handle(&self, ctx: RequestContext, body: &[u8]) -> Envelope {
        let span = info_span!(
            "facade",
            request_id = %ctx.request_id,
            operation = field::Empty,
            caller = field::Empty,
        );

        async move {
            match self.run(ctx, body).await {
                Ok(envelope) => {
                    info!(warnings = envelope.warnings.len(), "{}", envelope.message);
                    envelope
                }
                Err(err) => {
                    if err.is_fault() {
                        error!(error = %err, code = err.code(), "Operation failed");
                    } else {
                        info!(code = err.code(), "{}", err);
                    }
                    Envelope::error(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, ctx: RequestContext, body: &[u8]) -> ServiceResult<Envelope> {
        let user = self.auth.authenticate(ctx.credentials.as_ref())?;
        Span::current().record("caller", user.username.as_str());

        let request: FacadeRequest = serde_json::from_slice(body)
            .map_err(|e| ServiceError::InvalidArgument(format!("request body: {e}")))?;
        Span::current().record("operation", request.operation.as_str());

        // unknown names are denied, never dispatched
        let operation: Operation = request.operation.parse().map_err(|_| {
            ServiceError::Forbidden {
                username: user.username.clone(),
                operation: request.operation.clone(),
            }
        })?;
        self.auth.authorize(&user, operation)?;

        let facade = self.clone();
        let args = Args::new(request.args);
        let task = AbortOnDrop(tokio::spawn(
            async move { facade.dispatch(operation, args, user).await }.instrument(Span::current()),
        ));
        task.join().await
    }

    async fn dispatch(&self, op: Operation, args: Args, user: User) -> ServiceResult<Envelope> {
        debug!(operation = %op, "Dispatching");
        let svc = &self.inventory;
        let caller = user.username.as_str();

        let envelope = match op {
            Operation::InsertItem => {
                let outcome = svc.register_item(&args.item_draft()?).await?;
                Envelope::ok("Item registered successfully", Some(Payload::item(&outcome.value)))
                    .with_warnings(outcome.warnings)
            }
            Operation::UpdateItem => {
                let outcome = svc
                    .update_item(&args.item_draft()?, args.opt_str("reason")?, caller)
                    .await?;
                Envelope::ok("Item updated successfully", Some(Payload::item(&outcome.value)))
                    .with_warnings(outcome.warnings)
            }
            Operation::RetireItem => {
                let item = svc.retire_item(args.i64("id")?).await?;
                Envelope::ok("Item retired successfully", Some(Payload::item(&item)))
            }
            Operation::SetStock => {
                let outcome = svc
                    .set_stock(
                        args.i64("id")?,
                        args.i64("newStock")?,
                        args.opt_str("reason")?,
                        caller,
                    )
                    .await?;
                let message = if outcome.value.changed {
                    "Stock set successfully"
                } else {
                    "Stock unchanged"
                };
                Envelope::ok(message, Some(Payload::item(&outcome.value.item)))
                    .with_warnings(outcome.warnings)
            }
            Operation::AdjustStock => {
                let outcome = svc
                    .adjust_stock(
                        args.i64("id")?,
                        args.i64("delta")?,
                        args.opt_str("reason")?,
                        caller,
                    )
                    .await?;
                Envelope::ok("Stock adjusted successfully", Some(Payload::item(&outcome.value)))
                    .with_warnings(outcome.warnings)
            }
            Operation::RegisterEntry => {
                let outcome = svc
                    .register_entry(
                        args.i64("id")?,
                        args.i64("quantity")?,
                        args.opt_str("reason")?,
                        caller,
                    )
                    .await?;
                Envelope::ok("Entry registered successfully", Some(Payload::item(&outcome.value)))
                    .with_warnings(outcome.warnings)
            }
            Operation::RegisterExit => {
                let outcome = svc
                    .register_exit(
                        args.i64("id")?,
                        args.i64("quantity")?,
                        args.opt_str("reason")?,
                        caller,
                    )
                    .await?;
                Envelope::ok("Exit registered successfully", Some(Payload::item(&outcome.value)))
                    .with_warnings(outcome.warnings)
            }
            Operation::GetByCode => {
                let item = svc.get_by_code(&args.str("code")?).await?;
                Envelope::ok("Item found", Some(Payload::item(&item)))
            }
            Operation::GetById => {
                let item = svc.get_by_id(args.i64("id")?).await?;
                Envelope::ok("Item found", Some(Payload::item(&item)))
            }
            Operation::SearchByName => {
                let items = svc.search_by_name(&args.str("name")?).await?;
                Envelope::ok(format!("{} items found", items.len()), Some(Payload::items(&items)))
            }
            Operation::ListAll => {
                let items = svc.list_all().await?;
                Envelope::ok(format!("{} active items", items.len()), Some(Payload::items(&items)))
            }
            Operation::ListCategories => {
                let categories = svc.list_categories().await?;
                Envelope::ok(
                    format!("{} categories", categories.len()),
                    Some(Payload::Categories(categories)),
                )
            }
            Operation::ListSuppliers => {
                let suppliers = svc.list_suppliers().await?;
                Envelope::ok(
                    format!("{} suppliers", suppliers.len()),
                    Some(Payload::Suppliers(suppliers)),
                )
            }
            Operation::ListLowStock => {
                let items = svc.list_low_stock().await?;
                Envelope::ok(
                    format!("{} items at or below minimum stock", items.len()),
                    Some(Payload::items(&items)),
                )
            }
            Operation::ListMovements => {
                let movements = svc.list_movements(args.i64("itemId")?).await?;
                Envelope::ok(
                    format!("{} movements", movements.len()),
                    Some(Payload::movements(&movements)),
                )
            }
            Operation::HealthCheck => {
                let report = self.health.check().await?;
                Envelope::ok(report.message.clone(), Some(Payload::Health(report)))
            }
            Operation::ChangePassword => {
                self.auth
                    .change_password(
                        caller,
                        &args.str("currentPassword")?,
                        &args.str("newPassword")?,
                    )
                    .await?;
                Envelope::ok("Password changed successfully", None)
            }
        };

        Ok(envelope)
    }
}

/// Aborts the task when dropped before completion.
struct AbortOnDrop<T>(JoinHandle<T>);

impl AbortOnDrop<ServiceResult<Envelope>> {
    async fn join(mut self) -> ServiceResult<Envelope> {
        match (&mut self.0).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(ServiceError::Internal("operation panicked".to_string())),
            Err(e) => Err(ServiceError::Internal(format!("operation cancelled: {e}"))),
        }
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
