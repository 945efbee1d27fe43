//! # kasa-checkout: Checkout Orchestration for Kasa POS
//!
//! The glue between the pure pricing engine and the database: sessions,
//! the order pipeline, and the export payload for the downstream sync.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                ★ kasa-checkout (THIS CRATE) ★                           │
//! │                                                                         │
//! │   CheckoutService                                                       │
//! │     open_session ──► create_order ──► close_session                     │
//! │          │                │                                             │
//! │          │                ├── kasa-core:  normalize + price_cart        │
//! │          │                ├── kasa-db:    catalog, rules, persistence   │
//! │          │                └── export:     order_export_json             │
//! │          │                                                              │
//! │          └── per-session async mutex: orders on one session are         │
//! │              serialized, different sessions run in parallel             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service owns all clock reads and all I/O sequencing; the pricing
//! pass itself stays pure and receives one snapshot instant.

pub mod error;
pub mod export;
pub mod service;

pub use error::{CheckoutError, CheckoutResult};
pub use export::order_export_json;
pub use service::{CheckoutService, CreateOrderRequest, CreatedOrder};
