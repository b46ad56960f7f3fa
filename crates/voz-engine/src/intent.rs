//! # Local Intent Detection
//!
//! Cancel/edit commands are recognized locally, without the oracle: they
//! reference conversational state ("anulá la venta") that the oracle never
//! sees, and a cancellation must never depend on a non-deterministic
//! external call.
//!
//! Detection is deliberately narrow: a cancel verb AND a sale noun, both as
//! exact (accent-folded) words. Everything else falls through to the
//! extraction pipeline.

use uuid::Uuid;

use voz_core::text::tokenize;

/// What the engine decided to do with an utterance, before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// A cancellation command. `explicit_id` is set when the utterance
    /// carries a literal sale id.
    Cancel { explicit_id: Option<String> },

    /// Anything else: hand the utterance to the oracle.
    Extract,
}

/// Verb stems that signal cancellation ("anulá", "cancelala", "eliminá").
const CANCEL_STEMS: &[&str] = &["anul", "cancel", "elimin", "borr"];

/// English forms matched whole.
const CANCEL_WORDS: &[&str] = &["delete", "void", "remove"];

/// Nouns that scope the verb to a sale.
const SALE_NOUNS: &[&str] = &["venta", "ventas", "sale", "sales", "pedido", "orden"];

/// Classifies one utterance.
pub fn detect(utterance: &str) -> Intent {
    let tokens = tokenize(utterance);

    let has_verb = tokens.iter().any(|t| {
        CANCEL_WORDS.contains(&t.as_str()) || CANCEL_STEMS.iter().any(|stem| t.starts_with(stem))
    });
    let has_noun = tokens.iter().any(|t| SALE_NOUNS.contains(&t.as_str()));

    if has_verb && has_noun {
        Intent::Cancel { explicit_id: find_sale_id(utterance) }
    } else {
        Intent::Extract
    }
}

/// Scans the raw utterance for a literal UUID token.
fn find_sale_id(utterance: &str) -> Option<String> {
    utterance
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_ascii_hexdigit() && c != '-'))
        .find(|word| Uuid::parse_str(word).is_ok())
        .map(|word| word.to_lowercase())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_phrases() {
        assert_eq!(detect("anulá la venta"), Intent::Cancel { explicit_id: None });
        assert_eq!(detect("Eliminá una venta"), Intent::Cancel { explicit_id: None });
        assert_eq!(detect("cancela esa venta por favor"), Intent::Cancel { explicit_id: None });
        assert_eq!(detect("borra el pedido"), Intent::Cancel { explicit_id: None });
        assert_eq!(detect("delete the last sale"), Intent::Cancel { explicit_id: None });
    }

    #[test]
    fn test_sales_talk_is_not_cancellation() {
        // Selling verbs must never trip the cancel path
        assert_eq!(detect("Vendí 3 empanadas a $300"), Intent::Extract);
        // Noun without a verb
        assert_eq!(detect("¿cuántas ventas hice hoy?"), Intent::Extract);
        // Verb without a sale noun
        assert_eq!(detect("cancelaron el evento"), Intent::Extract);
    }

    #[test]
    fn test_explicit_sale_id_is_extracted() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        let detected = detect(&format!("anulá la venta {id}"));
        assert_eq!(detected, Intent::Cancel { explicit_id: Some(id.to_string()) });
    }

    #[test]
    fn test_id_with_trailing_punctuation() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        let detected = detect(&format!("borrá la venta {id}."));
        assert_eq!(detected, Intent::Cancel { explicit_id: Some(id.to_string()) });
    }
}
