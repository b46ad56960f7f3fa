//! # Domain Types
//!
//! Core domain types used throughout VozVentas.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │      Sale       │   │    SaleItem     │   │     Payment     │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  sale_id (FK)   │   │  sale_id (FK)   │        │
//! │  │  daily_seq      │──►│  product_id?    │   │  method_id (FK) │        │
//! │  │  total_cents    │   │  quantity_milli │   │  amount_cents   │        │
//! │  │  voided flag    │   │  subtotal_cents │   └─────────────────┘        │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │     Product     │   │   PriceEntry    │   │  PaymentMethod  │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  name (unique   │──►│  valid_from     │   │  canonical name │        │
//! │  │  per tenant)    │   │  valid_until?   │   │  (resolution    │        │
//! │  │  auto_created   │   │  (null = open)  │   │   target)       │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every sale has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `daily_seq`: per-tenant, per-day ordinal - human-friendly ("la venta 2")

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Quantity};

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction (the header row).
///
/// Voided sales are immutable: edits and repeat cancellations are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    /// Per-tenant, per-UTC-calendar-day strictly increasing ordinal.
    /// Assigned at creation, never reused.
    pub daily_seq: i64,
    /// UTC calendar day of `occurred_at`; the partition key for `daily_seq`.
    pub sale_date: NaiveDate,
    pub total_cents: i64,
    pub customer_id: Option<String>,
    /// Marks a sale recorded with known-missing detail (e.g. payment pending).
    pub incomplete: bool,
    /// Soft cancellation. Voided sales are never hard-deleted.
    pub voided: bool,
    pub note: Option<String>,
    /// When the sale happened (may be dictated: "ayer vendí...").
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// `product_id` is null only when resolution was deferred and the line keeps
/// an informational literal name; `name_snapshot` is always populated so the
/// sale reads correctly even if the product is renamed later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity in thousandths; fractional for bulk goods.
    pub quantity_milli: i64,
    /// unit price × quantity, rounded to cents.
    pub subtotal_cents: i64,
    /// Presentation descriptor ("docena", "caja").
    pub unit_label: Option<String>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the quantity.
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a sale.
/// A sale can have multiple payments for split tender ("mitad y mitad").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    /// Always a resolved method - unresolved phrases abort the sale write.
    pub method_id: String,
    pub amount_cents: i64,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A tenant-scoped product. Name is unique per tenant, case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub available: bool,
    /// True when the product was registered implicitly during sale
    /// extraction rather than explicitly catalogued.
    pub auto_created: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Price History Entry
// =============================================================================

/// A time-bounded record of a product's unit price.
///
/// Invariant: at most one entry per product has `valid_until = None` at any
/// time. Activating a new price closes the previous open entry in the same
/// transaction. Entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceEntry {
    pub id: String,
    pub product_id: String,
    pub unit_price_cents: i64,
    pub valid_from: DateTime<Utc>,
    /// None = currently active.
    pub valid_until: Option<DateTime<Utc>>,
}

impl PriceEntry {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// True when this is the product's active price.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.valid_until.is_none()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// A tenant-scoped payment-method catalog entry; the resolution target for
/// free-text payment phrases ("mp", "qr", "efectivo").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethod {
    pub id: String,
    pub tenant_id: String,
    /// Canonical name, e.g. "MercadoPago", "Billetera Digital".
    pub name: String,
    pub active: bool,
}

// =============================================================================
// Customer
// =============================================================================

/// A tenant-scoped customer, created on first unmatched mention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// The tenant catalog context handed to the oracle so it can match existing
/// names instead of inventing identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub products: Vec<CatalogProduct>,
    /// Canonical payment-method names available to this tenant.
    pub payment_methods: Vec<String>,
}

/// One product line in the catalog snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub name: String,
    /// Current price in cents, when the product has price history.
    pub current_price_cents: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_item_accessors() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: Some("p1".to_string()),
            name_snapshot: "Empanada".to_string(),
            unit_price_cents: 30000,
            quantity_milli: 3000,
            subtotal_cents: 90000,
            unit_label: None,
        };
        assert_eq!(item.unit_price().cents(), 30000);
        assert_eq!(item.quantity().milli(), 3000);
        assert_eq!(item.subtotal(), item.unit_price().times_quantity(item.quantity()));
    }

    #[test]
    fn test_price_entry_open() {
        let entry = PriceEntry {
            id: "e1".to_string(),
            product_id: "p1".to_string(),
            unit_price_cents: 25000,
            valid_from: Utc::now(),
            valid_until: None,
        };
        assert!(entry.is_open());
    }
}
