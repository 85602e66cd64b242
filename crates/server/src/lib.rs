//! HTTP service behind `/{server_id}/backoffice`.
//!
//! The backoffice provisions and wipes tenants of a shared homeserver test
//! harness: it bootstraps an admin account, lists users and rooms, bulk
//! creates fixtures and resets a tenant to an empty state.

use std::sync::{Arc, OnceLock};

use salvo::prelude::*;

pub mod backoffice;
pub mod config;
pub mod hoops;
pub mod logging;
pub mod routing;
pub mod store;

mod error;
pub use error::AppError;

pub use backoffice_core as core;
pub use backoffice_core::MatrixError;
pub use backoffice_data as data;

use crate::config::AdminConfig;
use crate::store::BackofficeStore;

pub type AppResult<T> = Result<T, AppError>;
pub type JsonResult<T> = Result<Json<T>, AppError>;

pub fn json_ok<T>(data: T) -> JsonResult<T> {
    Ok(Json(data))
}

/// Everything a handler needs besides the request itself.
#[derive(Clone)]
pub struct BackofficeState {
    pub store: Arc<dyn BackofficeStore>,
    pub admin: AdminConfig,
}

impl BackofficeState {
    pub fn new(store: Arc<dyn BackofficeStore>, admin: AdminConfig) -> Self {
        Self { store, admin }
    }
}

static STATE: OnceLock<BackofficeState> = OnceLock::new();

pub fn init_state(state: BackofficeState) -> AppResult<()> {
    STATE
        .set(state)
        .map_err(|_| AppError::internal("backoffice state is already initialized"))
}

pub fn state() -> AppResult<&'static BackofficeState> {
    STATE
        .get()
        .ok_or_else(|| AppError::internal("backoffice state is not initialized"))
}
