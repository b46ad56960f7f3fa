//! # voz-oracle: The Language-Model Boundary
//!
//! Builds the extraction prompt from the tenant's catalog context, calls the
//! chat-completions endpoint, and parses the reply into the strict
//! [`RawExtraction`] contract.
//!
//! ## Oracle As An Unreliable External Function
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  utterance + CatalogSnapshot                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  build_system_prompt()  ← embeds product names, current prices,         │
//! │       │                   payment methods, synonym rules, and the       │
//! │       │                   split-payment arithmetic instructions         │
//! │       ▼                                                                 │
//! │  POST /chat/completions                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parse_extraction(content)                                              │
//! │       ├── valid JSON of the expected shape → RawExtraction              │
//! │       └── anything else → OracleError::Parse                            │
//! │                            (TOTAL failure - never partially trusted)    │
//! │                                                                         │
//! │  The adapter NEVER retries: a failed extraction is a final answer       │
//! │  for the turn.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod http;
pub mod prompt;

pub use error::{OracleError, OracleResult};
pub use http::{HttpOracle, OracleConfig};

use async_trait::async_trait;
use voz_core::extraction::RawExtraction;
use voz_core::types::CatalogSnapshot;

/// The replaceable language-model seam.
///
/// Implementations must be total: every call resolves to either a parsed
/// [`RawExtraction`] or an [`OracleError`] - there is no partially-parsed
/// in-between, and the caller validates everything before any side effect.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Extracts structured sale data from one utterance, given the tenant's
    /// current catalog context.
    async fn extract(
        &self,
        utterance: &str,
        catalog: &CatalogSnapshot,
    ) -> OracleResult<RawExtraction>;
}
