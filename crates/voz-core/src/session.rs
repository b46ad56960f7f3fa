//! # Conversation Session State
//!
//! The per-conversation mutable context threaded through each turn. The
//! engine never owns it beyond one call: the caller supplies it, the engine
//! returns it mutated. That keeps the engine trivially testable without a
//! live session store, and makes turn serialization the caller's contract
//! (at most one in-flight turn per context).
//!
//! ## Delete/Edit Intent State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──"delete a sale", no id, no lastSaleId──► AwaitingOrdinal       │
//! │    ▲                                               (list shown,         │
//! │    │                                                pending map set)    │
//! │    │ ordinal valid → target resolved                     │              │
//! │    ├─────────────────────────────────────────────────────┤              │
//! │    │ ordinal invalid/expired → error reported, no guess  │              │
//! │    └─────────────────────────────────────────────────────┘              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::text::tokenize;

// =============================================================================
// Constants
// =============================================================================

/// Bounded window of recent messages kept in the context.
pub const MESSAGE_WINDOW: usize = 20;

/// How long a disambiguation list stays referencable. After this, "la 2"
/// no longer has a trustworthy antecedent and must not resolve.
pub const DISAMBIGUATION_TTL_SECS: i64 = 300;

// =============================================================================
// Message Log
// =============================================================================

/// Who said a message in the recent-message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the bounded message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

// =============================================================================
// Pending Disambiguation
// =============================================================================

/// An enumerated list of same-day sales awaiting an ordinal selection.
///
/// `sale_ids` is ordered: ordinal N (1-based) maps to `sale_ids[N-1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDisambiguation {
    pub date: NaiveDate,
    pub sale_ids: Vec<String>,
    /// When the list was shown; ordinal references expire after
    /// [`DISAMBIGUATION_TTL_SECS`].
    pub shown_at: DateTime<Utc>,
}

impl PendingDisambiguation {
    /// True while ordinal references against this list remain valid.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        (now - self.shown_at).num_seconds() < DISAMBIGUATION_TTL_SECS
    }
}

// =============================================================================
// Session Context
// =============================================================================

/// Per-conversation state, supplied by the caller on each turn and returned
/// mutated. Never persisted to the relational store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    /// Ordered recent message log, bounded to [`MESSAGE_WINDOW`] entries.
    pub messages: VecDeque<TurnMessage>,
    /// The last sale this conversation created; the target of "anulá la
    /// venta" with no explicit reference.
    pub last_sale_id: Option<String>,
    /// Set while the engine awaits an ordinal selection.
    pub pending_disambiguation: Option<PendingDisambiguation>,
}

impl SessionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        SessionContext::default()
    }

    /// Appends a message, evicting the oldest beyond the window.
    pub fn push_message(&mut self, role: Role, text: impl Into<String>, now: DateTime<Utc>) {
        self.messages.push_back(TurnMessage { role, text: text.into(), at: now });
        while self.messages.len() > MESSAGE_WINDOW {
            self.messages.pop_front();
        }
    }

    /// Records a freshly created sale: sets `last_sale_id`, clears any
    /// pending disambiguation.
    pub fn record_new_sale(&mut self, sale_id: impl Into<String>) {
        self.last_sale_id = Some(sale_id.into());
        self.pending_disambiguation = None;
    }

    /// Records a cancellation: clears both `last_sale_id` and the pending
    /// disambiguation.
    pub fn record_cancellation(&mut self) {
        self.last_sale_id = None;
        self.pending_disambiguation = None;
    }

    /// Builds the 1-based ordinal → sale-id mapping and timestamps it.
    pub fn offer_disambiguation(
        &mut self,
        date: NaiveDate,
        ordered_sale_ids: Vec<String>,
        now: DateTime<Utc>,
    ) {
        self.pending_disambiguation = Some(PendingDisambiguation {
            date,
            sale_ids: ordered_sale_ids,
            shown_at: now,
        });
    }

    /// Drops the pending map (resolution finished or abandoned).
    pub fn clear_pending(&mut self) {
        self.pending_disambiguation = None;
    }

    /// Returns the pending map if it is still live at `now`.
    pub fn live_pending(&self, now: DateTime<Utc>) -> Option<&PendingDisambiguation> {
        self.pending_disambiguation
            .as_ref()
            .filter(|p| p.is_live(now))
    }

    /// Parses a small-number reference ("la 2", "the second one") against
    /// the pending map.
    ///
    /// ## Returns
    /// The selected sale id, or `None` when there is no pending map, it has
    /// expired, the text holds no ordinal, or the ordinal is out of range.
    /// Out-of-range is NOT clamped - the engine reports an error instead of
    /// guessing.
    pub fn resolve_ordinal(&self, text: &str, now: DateTime<Utc>) -> Option<&str> {
        let pending = self.live_pending(now)?;
        let ordinal = parse_ordinal(text)?;
        pending
            .sale_ids
            .get(ordinal.checked_sub(1)?)
            .map(String::as_str)
    }
}

// =============================================================================
// Ordinal Parsing
// =============================================================================

/// Ordinal words recognized in Spanish and English, values 1-10.
const ORDINAL_WORDS: &[(&str, usize)] = &[
    ("primero", 1), ("primera", 1), ("primer", 1), ("first", 1),
    ("segundo", 2), ("segunda", 2), ("second", 2),
    ("tercero", 3), ("tercera", 3), ("tercer", 3), ("third", 3),
    ("cuarto", 4), ("cuarta", 4), ("fourth", 4),
    ("quinto", 5), ("quinta", 5), ("fifth", 5),
    ("sexto", 6), ("sexta", 6), ("sixth", 6),
    ("septimo", 7), ("septima", 7), ("seventh", 7),
    ("octavo", 8), ("octava", 8), ("eighth", 8),
    ("noveno", 9), ("novena", 9), ("ninth", 9),
    ("decimo", 10), ("decima", 10), ("tenth", 10),
];

/// Extracts a 1-based ordinal from free text.
///
/// Accepts bare digits ("2", "la 2", "venta 3"), suffixed forms
/// ("2nd", "3ro"), and the word table above. The first match wins.
pub fn parse_ordinal(text: &str) -> Option<usize> {
    for token in tokenize(text) {
        // Plain number, or number with an ordinal suffix ("2nd", "3ra")
        let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            let rest = &token[digits.len()..];
            let suffix_ok = rest.is_empty()
                || matches!(rest, "st" | "nd" | "rd" | "th" | "ro" | "ra" | "do" | "da" | "to" | "ta" | "mo" | "ma" | "o" | "a");
            if suffix_ok {
                if let Ok(n) = digits.parse::<usize>() {
                    if n >= 1 && n <= 99 {
                        return Some(n);
                    }
                }
            }
            continue;
        }

        if let Some((_, n)) = ORDINAL_WORDS.iter().find(|(word, _)| *word == token) {
            return Some(*n);
        }
    }
    None
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_message_window_is_bounded() {
        let mut ctx = SessionContext::new();
        for i in 0..(MESSAGE_WINDOW + 5) {
            ctx.push_message(Role::User, format!("msg {i}"), now());
        }
        assert_eq!(ctx.messages.len(), MESSAGE_WINDOW);
        assert_eq!(ctx.messages.front().unwrap().text, "msg 5");
    }

    #[test]
    fn test_record_new_sale_clears_pending() {
        let mut ctx = SessionContext::new();
        ctx.offer_disambiguation(
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            vec!["s1".to_string()],
            now(),
        );
        ctx.record_new_sale("s2");
        assert_eq!(ctx.last_sale_id.as_deref(), Some("s2"));
        assert!(ctx.pending_disambiguation.is_none());
    }

    #[test]
    fn test_record_cancellation_clears_everything() {
        let mut ctx = SessionContext::new();
        ctx.record_new_sale("s1");
        ctx.record_cancellation();
        assert!(ctx.last_sale_id.is_none());
        assert!(ctx.pending_disambiguation.is_none());
    }

    #[test]
    fn test_resolve_ordinal_against_pending_map() {
        let mut ctx = SessionContext::new();
        let t = now();
        ctx.offer_disambiguation(
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            vec!["s1".to_string(), "s2".to_string(), "s3".to_string()],
            t,
        );

        assert_eq!(ctx.resolve_ordinal("la 2", t), Some("s2"));
        assert_eq!(ctx.resolve_ordinal("the second one", t), Some("s2"));
        assert_eq!(ctx.resolve_ordinal("la primera", t), Some("s1"));
        // out of range: no guess
        assert_eq!(ctx.resolve_ordinal("la 7", t), None);
        // no ordinal in text
        assert_eq!(ctx.resolve_ordinal("no sé", t), None);
    }

    #[test]
    fn test_resolve_ordinal_without_pending_map() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.resolve_ordinal("la 2", now()), None);
    }

    #[test]
    fn test_pending_map_expires() {
        let mut ctx = SessionContext::new();
        let shown = now();
        ctx.offer_disambiguation(
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            vec!["s1".to_string()],
            shown,
        );

        let later = shown + Duration::seconds(DISAMBIGUATION_TTL_SECS + 1);
        assert_eq!(ctx.resolve_ordinal("1", later), None);
        assert!(ctx.live_pending(later).is_none());

        let still_fresh = shown + Duration::seconds(DISAMBIGUATION_TTL_SECS - 1);
        assert_eq!(ctx.resolve_ordinal("1", still_fresh), Some("s1"));
    }

    #[test]
    fn test_parse_ordinal_forms() {
        assert_eq!(parse_ordinal("2"), Some(2));
        assert_eq!(parse_ordinal("la 2"), Some(2));
        assert_eq!(parse_ordinal("borrá la venta 3"), Some(3));
        assert_eq!(parse_ordinal("2nd"), Some(2));
        assert_eq!(parse_ordinal("el 3ro"), Some(3));
        assert_eq!(parse_ordinal("la segunda"), Some(2));
        assert_eq!(parse_ordinal("décima"), Some(10));
        assert_eq!(parse_ordinal("nada"), None);
        assert_eq!(parse_ordinal("0"), None);
        assert_eq!(parse_ordinal("100"), None);
    }
}
