//! # Checkout Error Types
//!
//! The error taxonomy the checkout pipeline exposes to callers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (normalization, validation)  ──┐                            │
//! │                                            ├──► CheckoutError           │
//! │  DbError (storage)                      ──┘     │                       │
//! │                                                  ▼                      │
//! │  Plus checkout-specific cases the caller must distinguish:             │
//! │    SessionNotFound   → wrong or stale session id                       │
//! │    SessionClosed     → cashier must open a new session                 │
//! │    OrderNumberCollision → retry budget exhausted, caller retries       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use kasa_core::CoreError;
use kasa_db::DbError;

/// Errors from the checkout pipeline.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No session with this id exists.
    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    /// The session exists but is closed; orders require an OPEN session.
    #[error("Session {0} is closed")]
    SessionClosed(i64),

    /// Order number generation collided twice in a row.
    ///
    /// The generator embeds a second-resolution timestamp and a
    /// nanosecond-derived disambiguator, so this is vanishingly rare;
    /// one in-place retry is attempted before surfacing it.
    #[error("Order number collision: {0}")]
    OrderNumberCollision(String),

    /// Cart normalization or validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
