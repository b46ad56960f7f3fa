//! Text normalization helpers shared by the matching code (payment-method
//! resolution, intent keywords, ordinal parsing).
//!
//! Utterances arrive transcribed with inconsistent casing and accents
//! ("Anulá la venta", "codigo QR"), so every comparison goes through
//! [`normalize`] first.

/// Lowercases and folds the Spanish accented vowels and ñ.
///
/// ## Example
/// ```rust
/// use voz_core::text::normalize;
///
/// assert_eq!(normalize("Anulá la Venta"), "anula la venta");
/// assert_eq!(normalize("Código QR"), "codigo qr");
/// ```
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            _ => c,
        })
        .collect()
}

/// Splits normalized text into lowercase alphanumeric words.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}

/// True when any of `keywords` appears as an exact word in the text.
pub fn contains_any_word(text: &str, keywords: &[&str]) -> bool {
    let words = tokenize(text);
    words
        .iter()
        .any(|word| keywords.iter().any(|keyword| word == keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accents() {
        assert_eq!(normalize("Vendí TRES empanadas"), "vendi tres empanadas");
        assert_eq!(normalize("Ñoquis"), "noquis");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("anulá la venta #2!"), vec!["anula", "la", "venta", "2"]);
    }

    #[test]
    fn test_contains_any_word() {
        assert!(contains_any_word("anulá la venta", &["anula", "cancela"]));
        // "venta" contains "venta" but "ventas" is a different word
        assert!(!contains_any_word("las ventas de hoy", &["venta"]));
    }
}
