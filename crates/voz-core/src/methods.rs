//! # Payment-Method Resolution
//!
//! Resolves a free-text payment phrase ("mp", "qr", "la mitad en efectivo")
//! against the tenant's payment-method catalog.
//!
//! ## Matching Priority
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_method("qr", [Efectivo, MercadoPago, Billetera Digital])       │
//! │                                                                         │
//! │  1. EXACT       phrase == method name (case/accent-insensitive)?        │
//! │        │ miss                                                           │
//! │        ▼                                                                │
//! │  2. SYNONYM     phrase in the fixed synonym table?                      │
//! │        │          "qr" → needle "billetera digital"                     │
//! │        │          needle matched by substring against methods           │
//! │        │ miss                                                           │
//! │        ▼                                                                │
//! │  3. SUBSTRING   phrase ⊂ name or name ⊂ phrase (case-insensitive)?      │
//! │        │ miss                                                           │
//! │        ▼                                                                │
//! │     None  ← caller MUST fail the whole sale write; a payment row        │
//! │             with a guessed method corrupts the sum invariant            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The synonym table is static engine code - versioned with the crate and
//! unit-testable without the oracle - rather than pattern logic scattered
//! through prompts. The prompt builder reuses it so the oracle and the
//! resolver never disagree.

use crate::text::normalize;
use crate::types::PaymentMethod;

// =============================================================================
// Synonym Table
// =============================================================================

/// Fixed slang/abbreviation table: recognized phrases mapped to a canonical
/// needle that is then substring-matched against the tenant's method names.
///
/// Entries are pre-normalized (lowercase, accents folded).
pub const METHOD_SYNONYMS: &[(&[&str], &str)] = &[
    (
        &["qr", "codigo qr", "con qr", "billetera", "billetera virtual", "billetera digital"],
        "billetera digital",
    ),
    (&["mp", "mercadopago", "mercado pago"], "mercadopago"),
    (&["efectivo", "cash", "plata", "en efectivo"], "efectivo"),
    (
        &["debito", "tarjeta de debito", "con debito", "debit"],
        "debito",
    ),
    (
        &["credito", "tarjeta de credito", "con credito", "tarjeta", "credit card"],
        "credito",
    ),
    (
        &["transferencia", "transfer", "por transferencia", "cbu", "alias"],
        "transferencia",
    ),
];

/// Looks up a normalized phrase in the synonym table.
fn synonym_needle(normalized_phrase: &str) -> Option<&'static str> {
    METHOD_SYNONYMS
        .iter()
        .find(|(phrases, _)| phrases.contains(&normalized_phrase))
        .map(|(_, needle)| *needle)
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolves a free-text payment phrase to one of the available methods.
///
/// ## Rules
/// Priority order: exact name equality, synonym-table needle, substring
/// containment either direction. All comparisons are case- and
/// accent-insensitive.
///
/// ## Returns
/// `None` when no rule matches. The resolver never guesses a method
/// silently - callers treat `None` as a hard failure of the sale write.
///
/// ## Example
/// ```rust
/// use voz_core::methods::resolve_method;
/// use voz_core::types::PaymentMethod;
///
/// let methods = vec![PaymentMethod {
///     id: "m1".to_string(),
///     tenant_id: "t1".to_string(),
///     name: "Billetera Digital".to_string(),
///     active: true,
/// }];
///
/// assert_eq!(resolve_method("qr", &methods).unwrap().id, "m1");
/// assert!(resolve_method("cheque", &methods).is_none());
/// ```
pub fn resolve_method<'a>(
    phrase: &str,
    available: &'a [PaymentMethod],
) -> Option<&'a PaymentMethod> {
    let phrase = normalize(phrase.trim());
    if phrase.is_empty() {
        return None;
    }

    // 1. Exact case-insensitive name equality
    if let Some(method) = available.iter().find(|m| normalize(&m.name) == phrase) {
        return Some(method);
    }

    // 2. Synonym table → canonical needle → substring against names
    if let Some(needle) = synonym_needle(&phrase) {
        if let Some(method) = available
            .iter()
            .find(|m| normalize(&m.name).contains(needle))
        {
            return Some(method);
        }
    }

    // 3. Substring containment either direction
    available.iter().find(|m| {
        let name = normalize(&m.name);
        name.contains(&phrase) || phrase.contains(&name)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn method(id: &str, name: &str) -> PaymentMethod {
        PaymentMethod {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            name: name.to_string(),
            active: true,
        }
    }

    fn catalog() -> Vec<PaymentMethod> {
        vec![
            method("m1", "Efectivo"),
            method("m2", "MercadoPago"),
            method("m3", "Billetera Digital"),
            method("m4", "Tarjeta de Débito"),
            method("m5", "Tarjeta de Crédito"),
            method("m6", "Transferencia"),
        ]
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let methods = catalog();
        assert_eq!(resolve_method("efectivo", &methods).unwrap().id, "m1");
        assert_eq!(resolve_method("MERCADOPAGO", &methods).unwrap().id, "m2");
    }

    #[test]
    fn test_synonym_qr_maps_to_billetera() {
        let methods = catalog();
        assert_eq!(resolve_method("qr", &methods).unwrap().id, "m3");
        assert_eq!(resolve_method("código QR", &methods).unwrap().id, "m3");
    }

    #[test]
    fn test_synonym_mp_and_cash() {
        let methods = catalog();
        assert_eq!(resolve_method("mp", &methods).unwrap().id, "m2");
        assert_eq!(resolve_method("cash", &methods).unwrap().id, "m1");
    }

    #[test]
    fn test_synonym_cards_and_transfer() {
        let methods = catalog();
        assert_eq!(resolve_method("debito", &methods).unwrap().id, "m4");
        assert_eq!(resolve_method("con crédito", &methods).unwrap().id, "m5");
        assert_eq!(resolve_method("transfer", &methods).unwrap().id, "m6");
    }

    #[test]
    fn test_substring_either_direction() {
        let methods = catalog();
        // phrase contained in name
        assert_eq!(resolve_method("billetera", &methods).unwrap().id, "m3");
        // name contained in phrase
        assert_eq!(
            resolve_method("pagaron todo en efectivo justo", &methods)
                .unwrap()
                .id,
            "m1"
        );
    }

    #[test]
    fn test_unresolvable_returns_none() {
        let methods = catalog();
        assert!(resolve_method("cheque", &methods).is_none());
        assert!(resolve_method("", &methods).is_none());
        assert!(resolve_method("   ", &methods).is_none());
    }

    #[test]
    fn test_no_methods_available() {
        assert!(resolve_method("efectivo", &[]).is_none());
    }
}
