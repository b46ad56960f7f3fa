//! # Extraction Contract & Validator
//!
//! The oracle reply contract ([`RawExtraction`]) and the business-rule
//! validator that decides whether a reply may touch the database.
//!
//! ## Validation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Oracle JSON reply                                                      │
//! │       │ serde (strict shape; parse failure = total extraction failure)  │
//! │       ▼                                                                 │
//! │  RawExtraction (floats, free text - untrusted)                          │
//! │       │ validate()                                                      │
//! │       │   1. found_sale declared?                                       │
//! │       │   2. at least one line item?                                    │
//! │       │   3. every item: qty > 0, price > 0, non-empty name?            │
//! │       │   4. total > 0 and == Σ subtotals (exact cents)?                │
//! │       │   5. payments (if any) sum == total (exact cents)?              │
//! │       ▼                                                                 │
//! │  NormalizedSale (fixed-point, trimmed - trusted)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Transaction writer (voz-db)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rejection Is Final
//! A failed rule short-circuits to `Err(RejectReason)`. Rejected extractions
//! are never persisted and never coerced: a total mismatch is NOT fixed by
//! re-summing, a zero quantity is NOT bumped to one. The oracle asserted a
//! transaction happened; if its own numbers don't reconcile, the only safe
//! answer is "no transaction recognized".

use serde::{Deserialize, Serialize};

use crate::error::RejectReason;
use crate::money::{Money, Quantity};

// =============================================================================
// Oracle Reply Contract
// =============================================================================

/// The oracle's raw structured reply for one utterance.
///
/// Field shapes mirror the JSON contract the prompt demands. Everything here
/// is untrusted input: floats, unresolved names, possibly inconsistent sums.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExtraction {
    /// The oracle's judgment that the utterance describes a completed sale
    /// (as opposed to a question, hypothetical, or request for help).
    pub found_sale: bool,

    #[serde(default)]
    pub items: Vec<RawItem>,

    /// Declared sale total, in currency units.
    #[serde(default)]
    pub total: Option<f64>,

    /// Per-method payment amounts. Split-payment phrases ("mitad y mitad")
    /// arrive already expanded into explicit amounts.
    #[serde(default)]
    pub payments: Vec<RawPayment>,

    /// Customer mention, verbatim.
    #[serde(default)]
    pub customer: Option<String>,

    /// Free-text note dictated with the sale.
    #[serde(default)]
    pub note: Option<String>,

    /// The oracle's conversational reply, passed through for the caller's
    /// acknowledgment prose. Never inspected by the validator.
    #[serde(default)]
    pub reply: Option<String>,
}

/// One line item as extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub product: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Presentation descriptor ("docena", "caja").
    #[serde(default)]
    pub unit_label: Option<String>,
}

/// One payment as extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPayment {
    /// Free-text method phrase; resolved later against the catalog.
    pub method: String,
    pub amount: f64,
}

// =============================================================================
// Normalized Output
// =============================================================================

/// A validated, fixed-point sale ready for the transaction writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSale {
    pub total: Money,
    pub items: Vec<NormalizedItem>,
    pub payments: Vec<NormalizedPayment>,
    pub customer: Option<String>,
    pub note: Option<String>,
}

/// A validated line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    /// unit_price × quantity, rounded to cents.
    pub subtotal: Money,
    pub unit_label: Option<String>,
}

/// A validated payment, method phrase still unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPayment {
    pub method_phrase: String,
    pub amount: Money,
}

// =============================================================================
// Validator
// =============================================================================

/// Validates an oracle reply and normalizes it to fixed-point.
///
/// ## Rules
/// Evaluated in order; the first failure short-circuits. See the module
/// docs for the full pipeline.
///
/// ## Example
/// ```rust
/// use voz_core::extraction::{validate, RawExtraction, RawItem};
///
/// let raw = RawExtraction {
///     found_sale: true,
///     items: vec![RawItem {
///         product: "Empanada".to_string(),
///         quantity: 3.0,
///         unit_price: 300.0,
///         unit_label: None,
///     }],
///     total: Some(900.0),
///     ..Default::default()
/// };
///
/// let sale = validate(&raw).unwrap();
/// assert_eq!(sale.total.cents(), 90000);
/// assert_eq!(sale.items[0].subtotal.cents(), 90000);
/// ```
pub fn validate(raw: &RawExtraction) -> Result<NormalizedSale, RejectReason> {
    // Rule 1: the oracle must have declared sale data
    if !raw.found_sale {
        return Err(RejectReason::NoSaleData);
    }

    // Rule 2: at least one line item
    if raw.items.is_empty() {
        return Err(RejectReason::NoLineItems);
    }

    // Rule 3: per-item field rules, normalizing as we go
    let mut items = Vec::with_capacity(raw.items.len());
    for (index, item) in raw.items.iter().enumerate() {
        let product_name = item.product.trim();
        if product_name.is_empty() {
            return Err(RejectReason::InvalidLineItem { index, field: "product".to_string() });
        }

        let quantity = Quantity::from_decimal(item.quantity);
        if !quantity.is_positive() {
            return Err(RejectReason::InvalidLineItem { index, field: "quantity".to_string() });
        }

        let unit_price = Money::from_decimal(item.unit_price);
        if !unit_price.is_positive() {
            return Err(RejectReason::InvalidLineItem { index, field: "unit_price".to_string() });
        }

        items.push(NormalizedItem {
            product_name: product_name.to_string(),
            quantity,
            unit_price,
            subtotal: unit_price.times_quantity(quantity),
            unit_label: item.unit_label.as_deref().map(|l| l.trim().to_string()),
        });
    }

    // Rule 4: total declared, positive, and exactly the sum of subtotals
    let total = match raw.total {
        Some(t) => Money::from_decimal(t),
        None => return Err(RejectReason::TotalNotPositive),
    };
    if !total.is_positive() {
        return Err(RejectReason::TotalNotPositive);
    }

    let computed: Money = items.iter().map(|i| i.subtotal).sum();
    if computed != total {
        return Err(RejectReason::TotalMismatch {
            declared_cents: total.cents(),
            computed_cents: computed.cents(),
        });
    }

    // Rule 5: payments, when declared, must sum exactly to the total
    let mut payments = Vec::with_capacity(raw.payments.len());
    for (index, payment) in raw.payments.iter().enumerate() {
        let amount = Money::from_decimal(payment.amount);
        if !amount.is_positive() {
            return Err(RejectReason::PaymentNotPositive { index });
        }
        payments.push(NormalizedPayment {
            method_phrase: payment.method.trim().to_string(),
            amount,
        });
    }

    if !payments.is_empty() {
        let paid: Money = payments.iter().map(|p| p.amount).sum();
        if paid != total {
            return Err(RejectReason::PaymentSumMismatch {
                total_cents: total.cents(),
                payments_cents: paid.cents(),
            });
        }
    }

    Ok(NormalizedSale {
        total,
        items,
        payments,
        customer: raw
            .customer
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        note: raw
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product: &str, quantity: f64, unit_price: f64) -> RawItem {
        RawItem {
            product: product.to_string(),
            quantity,
            unit_price,
            unit_label: None,
        }
    }

    fn empanadas() -> RawExtraction {
        RawExtraction {
            found_sale: true,
            items: vec![item("Empanada", 3.0, 300.0)],
            total: Some(900.0),
            payments: vec![RawPayment {
                method: "MercadoPago".to_string(),
                amount: 900.0,
            }],
            customer: None,
            note: None,
            reply: None,
        }
    }

    #[test]
    fn test_accepts_well_formed_sale() {
        let sale = validate(&empanadas()).unwrap();
        assert_eq!(sale.total.cents(), 90000);
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].quantity.milli(), 3000);
        assert_eq!(sale.items[0].subtotal.cents(), 90000);
        assert_eq!(sale.payments[0].amount.cents(), 90000);
    }

    #[test]
    fn test_rejects_non_sale_reply() {
        let raw = RawExtraction { found_sale: false, ..Default::default() };
        assert_eq!(validate(&raw).unwrap_err(), RejectReason::NoSaleData);
    }

    #[test]
    fn test_rejects_empty_items() {
        let raw = RawExtraction {
            found_sale: true,
            total: Some(100.0),
            ..Default::default()
        };
        assert_eq!(validate(&raw).unwrap_err(), RejectReason::NoLineItems);
    }

    #[test]
    fn test_rejects_bad_item_fields() {
        let mut raw = empanadas();
        raw.items[0].quantity = 0.0;
        assert_eq!(
            validate(&raw).unwrap_err(),
            RejectReason::InvalidLineItem { index: 0, field: "quantity".to_string() }
        );

        let mut raw = empanadas();
        raw.items[0].unit_price = -5.0;
        assert_eq!(
            validate(&raw).unwrap_err(),
            RejectReason::InvalidLineItem { index: 0, field: "unit_price".to_string() }
        );

        let mut raw = empanadas();
        raw.items[0].product = "   ".to_string();
        assert_eq!(
            validate(&raw).unwrap_err(),
            RejectReason::InvalidLineItem { index: 0, field: "product".to_string() }
        );
    }

    /// Total declared 150 but items sum to 140 → rejected,
    /// never auto-corrected by re-summing.
    #[test]
    fn test_rejects_total_mismatch() {
        let raw = RawExtraction {
            found_sale: true,
            items: vec![item("Pan", 2.0, 70.0)],
            total: Some(150.0),
            ..Default::default()
        };
        assert_eq!(
            validate(&raw).unwrap_err(),
            RejectReason::TotalMismatch { declared_cents: 15000, computed_cents: 14000 }
        );
    }

    #[test]
    fn test_rejects_missing_or_zero_total() {
        let raw = RawExtraction {
            found_sale: true,
            items: vec![item("Pan", 1.0, 50.0)],
            total: None,
            ..Default::default()
        };
        assert_eq!(validate(&raw).unwrap_err(), RejectReason::TotalNotPositive);

        let raw = RawExtraction {
            found_sale: true,
            items: vec![item("Pan", 1.0, 50.0)],
            total: Some(0.0),
            ..Default::default()
        };
        assert_eq!(validate(&raw).unwrap_err(), RejectReason::TotalNotPositive);
    }

    /// "mitad efectivo mitad QR" arrives pre-expanded by the
    /// oracle; the validator only checks the sum.
    #[test]
    fn test_accepts_split_payment() {
        let raw = RawExtraction {
            found_sale: true,
            items: vec![item("Torta", 1.0, 100.0)],
            total: Some(100.0),
            payments: vec![
                RawPayment { method: "efectivo".to_string(), amount: 50.0 },
                RawPayment { method: "qr".to_string(), amount: 50.0 },
            ],
            ..Default::default()
        };
        let sale = validate(&raw).unwrap();
        assert_eq!(sale.payments.len(), 2);
        assert_eq!(sale.payments[0].amount.cents(), 5000);
        assert_eq!(sale.payments[1].amount.cents(), 5000);
    }

    #[test]
    fn test_rejects_payment_sum_mismatch() {
        let raw = RawExtraction {
            found_sale: true,
            items: vec![item("Torta", 1.0, 100.0)],
            total: Some(100.0),
            payments: vec![RawPayment { method: "efectivo".to_string(), amount: 80.0 }],
            ..Default::default()
        };
        assert_eq!(
            validate(&raw).unwrap_err(),
            RejectReason::PaymentSumMismatch { total_cents: 10000, payments_cents: 8000 }
        );
    }

    #[test]
    fn test_no_payments_is_acceptable() {
        let raw = RawExtraction {
            found_sale: true,
            items: vec![item("Pan", 1.0, 50.0)],
            total: Some(50.0),
            ..Default::default()
        };
        let sale = validate(&raw).unwrap();
        assert!(sale.payments.is_empty());
    }

    #[test]
    fn test_fractional_bulk_quantity() {
        // medio kilo de pan a $400 el kilo
        let raw = RawExtraction {
            found_sale: true,
            items: vec![item("Pan", 0.5, 400.0)],
            total: Some(200.0),
            ..Default::default()
        };
        let sale = validate(&raw).unwrap();
        assert_eq!(sale.items[0].quantity.milli(), 500);
        assert_eq!(sale.items[0].subtotal.cents(), 20000);
    }

    #[test]
    fn test_normalizes_customer_and_note() {
        let mut raw = empanadas();
        raw.customer = Some("  Doña Marta ".to_string());
        raw.note = Some("   ".to_string());
        let sale = validate(&raw).unwrap();
        assert_eq!(sale.customer.as_deref(), Some("Doña Marta"));
        assert_eq!(sale.note, None);
    }
}
