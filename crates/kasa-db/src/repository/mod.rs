//! # Repository Module
//!
//! Database repository implementations for Kasa POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Checkout Service                                                      │
//! │       │                                                                 │
//! │       │  db.orders().insert_with_lines(&order, &lines)                 │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── insert_with_lines(&self, order, lines)    ← one transaction       │
//! │  ├── get_by_order_number(&self, number)                                │
//! │  └── list_by_session(&self, session_id)                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Easy to test against an in-memory database                          │
//! │  • Row ↔ domain mapping lives next to the queries that need it         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and catalog resolution
//! - [`rule::RuleRepository`] - Loyalty and promotion rule storage
//! - [`order::OrderRepository`] - Atomic order+lines persistence
//! - [`session::SessionRepository`] - Session lifecycle and running totals

pub mod order;
pub mod product;
pub mod rule;
pub mod session;
