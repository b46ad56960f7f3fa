//! # Extraction Prompt Builder
//!
//! Builds the system prompt that turns the language model into a structured
//! extractor. The tenant's product names, current prices and payment-method
//! names are embedded so the oracle matches existing records instead of
//! inventing identifiers, and the synonym table + split-payment rules are
//! spelled out as instructions.
//!
//! The synonym list is rendered from [`voz_core::methods::METHOD_SYNONYMS`]
//! so the oracle and the engine-side resolver never disagree.

use std::fmt::Write;

use voz_core::methods::METHOD_SYNONYMS;
use voz_core::types::CatalogSnapshot;

/// The fixed part of the extraction instructions.
const EXTRACTION_RULES: &str = r#"You are the extraction engine of a voice-first sales assistant for small merchants. The user dictates in Spanish (sometimes English). Decide whether the utterance describes a COMPLETED sale. Questions, hypotheticals and requests for help are NOT sales.

Reply with ONLY a JSON object, no prose and no code fences, in this exact shape:
{
  "found_sale": boolean,
  "items": [{"product": string, "quantity": number, "unit_price": number, "unit_label": string|null}],
  "total": number|null,
  "payments": [{"method": string, "amount": number}],
  "customer": string|null,
  "note": string|null,
  "reply": string
}

Rules:
- "found_sale" is false for anything that is not a completed sale; leave the other fields empty in that case and put your conversational answer in "reply".
- quantity and unit_price must be positive numbers; unit_price is per unit, never the line total.
- total must equal the sum of quantity * unit_price over all items.
- Expand split-payment phrases into explicit per-method amounts yourself: "mitad efectivo mitad QR" on a $100 total becomes [{"method": "efectivo", "amount": 50}, {"method": "qr", "amount": 50}]; "un tercio cada uno" splits evenly across the named methods. Payment amounts must sum to the total.
- Use product names from the catalog below when the utterance clearly refers to one (match loosely: singular/plural, accents, casing). Otherwise keep the name the user said.
- Use payment method names or synonyms from the lists below; keep the user's phrase if nothing matches.
- "customer" only when a buyer is named ("le vendí a Marta").
- "reply" is a short natural acknowledgment in the user's language."#;

/// Builds the full system prompt for one turn.
pub fn build_system_prompt(catalog: &CatalogSnapshot) -> String {
    let mut prompt = String::from(EXTRACTION_RULES);

    prompt.push_str("\n\nProduct catalog (name - current price):\n");
    if catalog.products.is_empty() {
        prompt.push_str("(no products registered yet)\n");
    }
    for product in &catalog.products {
        match product.current_price_cents {
            Some(cents) => {
                let _ = writeln!(prompt, "- {} - ${}.{:02}", product.name, cents / 100, cents % 100);
            }
            None => {
                let _ = writeln!(prompt, "- {} - (no price on record)", product.name);
            }
        }
    }

    prompt.push_str("\nPayment methods available:\n");
    if catalog.payment_methods.is_empty() {
        prompt.push_str("(none registered)\n");
    }
    for method in &catalog.payment_methods {
        let _ = writeln!(prompt, "- {}", method);
    }

    prompt.push_str("\nPayment method synonyms:\n");
    for (phrases, canonical) in METHOD_SYNONYMS {
        let _ = writeln!(prompt, "- {} => {}", phrases.join(", "), canonical);
    }

    prompt
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use voz_core::types::CatalogProduct;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot {
            products: vec![
                CatalogProduct { name: "Empanada".to_string(), current_price_cents: Some(25000) },
                CatalogProduct { name: "Torta".to_string(), current_price_cents: None },
            ],
            payment_methods: vec!["Efectivo".to_string(), "MercadoPago".to_string()],
        }
    }

    #[test]
    fn test_prompt_embeds_catalog() {
        let prompt = build_system_prompt(&catalog());
        assert!(prompt.contains("Empanada - $250.00"));
        assert!(prompt.contains("Torta - (no price on record)"));
        assert!(prompt.contains("- Efectivo"));
        assert!(prompt.contains("- MercadoPago"));
    }

    #[test]
    fn test_prompt_embeds_synonyms_and_split_rule() {
        let prompt = build_system_prompt(&catalog());
        assert!(prompt.contains("mercadopago"));
        assert!(prompt.contains("billetera digital"));
        assert!(prompt.contains("mitad efectivo mitad QR"));
    }

    #[test]
    fn test_prompt_handles_empty_catalog() {
        let prompt = build_system_prompt(&CatalogSnapshot::default());
        assert!(prompt.contains("(no products registered yet)"));
        assert!(prompt.contains("(none registered)"));
    }
}
