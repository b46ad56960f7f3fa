//! # voz-db: Database Layer for VozVentas
//!
//! This crate provides database access for the conversational sales engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VozVentas Data Flow                              │
//! │                                                                         │
//! │  voz-engine (handle_turn)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                      voz-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │  SaleWriter  │    │    │
//! │  │   │   (pool.rs)   │    │ product, sale │    │ (writer.rs)  │    │    │
//! │  │   │               │    │ price, method │    │              │    │    │
//! │  │   │ SqlitePool    │◄───│ customer      │◄───│ one tx per   │    │    │
//! │  │   │ + migrations  │    │               │    │ created sale │    │    │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys ON)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Tenant-scoped repositories
//! - [`writer`] - The transactional sale writer (header + items + payments)
//!
//! ## Tenant Scoping
//!
//! Every read and write is constrained by `tenant_id` at the query layer.
//! This is the system's sole authorization boundary - the row-level-security
//! equivalent. A sale that exists but belongs to another tenant is
//! indistinguishable from a sale that does not exist.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod writer;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use writer::{CreatedSale, SaleWriter};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::method::PaymentMethodRepository;
pub use repository::price::PriceLedger;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleDetail, SaleEdit, SaleRepository};
