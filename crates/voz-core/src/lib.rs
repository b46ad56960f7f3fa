//! # voz-core: Pure Business Logic for VozVentas
//!
//! This crate is the **heart** of the conversational sales engine. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VozVentas Architecture                            │
//! │                                                                         │
//! │  Caller (HTTP layer, CLI, tests)                                        │
//! │       │  utterance + session context + tenant id                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    voz-engine (turn orchestrator)               │    │
//! │  └───────┬─────────────────────┬───────────────────────┬──────────┘    │
//! │          │                     │                       │               │
//! │  ┌───────▼────────┐   ┌────────▼────────┐   ┌──────────▼─────────┐     │
//! │  │  ★ voz-core ★  │   │     voz-db      │   │     voz-oracle     │     │
//! │  │                │   │  SQLite writes  │   │  LLM extraction    │     │
//! │  │  validation    │   │  price ledger   │   │  prompt building   │     │
//! │  │  session state │   │  repositories   │   │  JSON parsing      │     │
//! │  │  method match  │   │                 │   │                    │     │
//! │  │                │   │                 │   │                    │     │
//! │  │  NO I/O        │   │                 │   │                    │     │
//! │  └────────────────┘   └─────────────────┘   └────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SaleItem, Payment, Product, ...)
//! - [`money`] - Money and Quantity fixed-point types (no floating point!)
//! - [`error`] - Domain error types and the extraction rejection taxonomy
//! - [`extraction`] - Oracle reply contract and the extraction validator
//! - [`methods`] - Payment-method resolution with the synonym table
//! - [`session`] - Conversation session state and ordinal resolution
//! - [`text`] - Text normalization helpers shared by matching code
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: Monetary values are cents (i64); quantities are
//!    thousandths (i64) so bulk goods ("medio kilo") stay exact
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use voz_core::money::{Money, Quantity};
//!
//! // Create money from cents (never from floats in business code!)
//! let unit_price = Money::from_cents(30000); // $300.00
//!
//! // 3 units of $300 = $900
//! let qty = Quantity::from_units(3);
//! assert_eq!(unit_price.times_quantity(qty).cents(), 90000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod extraction;
pub mod methods;
pub mod money;
pub mod session;
pub mod text;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use voz_core::Money` instead of
// `use voz_core::money::Money`

pub use error::{RejectReason, ValidationError};
pub use extraction::{NormalizedSale, RawExtraction};
pub use money::{Money, Quantity};
pub use session::SessionContext;
pub use types::*;
