//! # Acknowledgment Data
//!
//! What a turn produced, as structured data. Prose generation is the
//! caller's job (out of scope here); this module pins down exactly what the
//! prose must reference - and [`AckData::summary`] renders a terse line for
//! logs and the CLI driver.
//!
//! The variants also encode the caller's dispatch decision: recorded and
//! cancelled outcomes are terminal for the turn, while the clarification
//! variants mean "ask the user a question", never "show an error page".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use voz_core::error::RejectReason;

// =============================================================================
// Ack Payload Pieces
// =============================================================================

/// One line item, as the acknowledgment references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckItem {
    pub name: String,
    pub quantity_milli: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub unit_label: Option<String>,
}

/// One payment, with its resolved canonical method name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckPayment {
    pub method_name: String,
    pub amount_cents: i64,
}

/// A price-ledger rotation that happened while recording the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckPriceChange {
    pub product_name: String,
    pub previous_cents: Option<i64>,
    pub new_cents: i64,
}

/// One row of a disambiguation listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisambiguationOption {
    /// 1-based position the user will reference ("la 2").
    pub ordinal: usize,
    pub sale_id: String,
    pub daily_seq: i64,
    pub total_cents: i64,
}

// =============================================================================
// Ack Data
// =============================================================================

/// The structured outcome of one conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AckData {
    /// A sale was recorded. Everything the acknowledgment must reference.
    SaleRecorded {
        sale_id: String,
        daily_seq: i64,
        total_cents: i64,
        items: Vec<AckItem>,
        payments: Vec<AckPayment>,
        price_changes: Vec<AckPriceChange>,
        customer_name: Option<String>,
        /// The oracle's conversational reply, passed through untouched.
        oracle_reply: Option<String>,
    },

    /// A sale was voided.
    SaleCancelled {
        sale_id: String,
        daily_seq: i64,
        total_cents: i64,
    },

    /// The cancel target was ambiguous; a numbered list of the day's sales
    /// was offered and the session now awaits an ordinal.
    DisambiguationOffered {
        date: NaiveDate,
        options: Vec<DisambiguationOption>,
    },

    /// A cancel command arrived but the tenant has no sales to cancel today.
    NothingToCancel { date: NaiveDate },

    /// An ordinal reply did not select a listed sale (out of range). The
    /// pending list was dropped; nothing was guessed.
    OrdinalRejected { supplied: usize, available: usize },

    /// The referenced sale does not exist for this tenant - or was already
    /// voided (reported identically, see DESIGN.md).
    TargetNotFound { reference: String },

    /// A declared payment phrase matched no catalog method, so the whole
    /// sale was NOT recorded. Ask the user how they were paid.
    PaymentMethodUnresolved { phrase: String },

    /// No transaction was recognized in the utterance. `reason` carries the
    /// validator's rejection when the oracle reply was structurally present;
    /// `None` means the oracle call itself failed or was unparseable
    /// (treated identically, fail closed).
    NotRecognized {
        reason: Option<RejectReason>,
        /// The oracle's conversational reply, when one existed.
        oracle_reply: Option<String>,
    },
}

impl AckData {
    /// Terse single line for logs, the session message log, and the CLI.
    pub fn summary(&self) -> String {
        match self {
            AckData::SaleRecorded { daily_seq, total_cents, items, payments, .. } => {
                format!(
                    "venta #{} registrada: {} item(s), total ${}.{:02}, {} pago(s)",
                    daily_seq,
                    items.len(),
                    total_cents / 100,
                    total_cents % 100,
                    payments.len()
                )
            }
            AckData::SaleCancelled { daily_seq, .. } => {
                format!("venta #{daily_seq} anulada")
            }
            AckData::DisambiguationOffered { date, options } => {
                format!("¿cuál venta del {date}? opciones 1-{}", options.len())
            }
            AckData::NothingToCancel { date } => {
                format!("no hay ventas para anular el {date}")
            }
            AckData::OrdinalRejected { supplied, available } => {
                format!("opción {supplied} inválida (hay {available})")
            }
            AckData::TargetNotFound { reference } => {
                format!("venta no encontrada: {reference}")
            }
            AckData::PaymentMethodUnresolved { phrase } => {
                format!("método de pago desconocido: '{phrase}'")
            }
            AckData::NotRecognized { reason, .. } => match reason {
                Some(reason) => format!("sin transacción: {reason}"),
                None => "sin transacción: respuesta del oráculo inválida".to_string(),
            },
        }
    }

    /// True when the caller should ask the user a clarifying question
    /// rather than treat the turn as settled.
    pub fn needs_clarification(&self) -> bool {
        matches!(
            self,
            AckData::DisambiguationOffered { .. }
                | AckData::OrdinalRejected { .. }
                | AckData::PaymentMethodUnresolved { .. }
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let ack = AckData::SaleRecorded {
            sale_id: "s1".to_string(),
            daily_seq: 2,
            total_cents: 90000,
            items: vec![AckItem {
                name: "Empanada".to_string(),
                quantity_milli: 3000,
                unit_price_cents: 30000,
                subtotal_cents: 90000,
                unit_label: None,
            }],
            payments: vec![],
            price_changes: vec![],
            customer_name: None,
            oracle_reply: None,
        };
        assert_eq!(ack.summary(), "venta #2 registrada: 1 item(s), total $900.00, 0 pago(s)");

        let ack = AckData::SaleCancelled {
            sale_id: "s1".to_string(),
            daily_seq: 2,
            total_cents: 90000,
        };
        assert_eq!(ack.summary(), "venta #2 anulada");
    }

    #[test]
    fn test_clarification_classification() {
        assert!(AckData::PaymentMethodUnresolved { phrase: "cheque".to_string() }
            .needs_clarification());
        assert!(!AckData::NothingToCancel { date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap() }
            .needs_clarification());
    }

    #[test]
    fn test_ack_serializes_with_kind_tag() {
        let ack = AckData::TargetNotFound { reference: "abc".to_string() };
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["kind"], "target_not_found");
    }
}
