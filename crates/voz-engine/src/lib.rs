//! # voz-engine: The Conversational Turn Engine
//!
//! Orchestrates one conversational turn end to end.
//!
//! ## Control Flow Per Turn
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handle_turn(tenant_id, utterance, session)                             │
//! │                                                                         │
//! │  1. Pending disambiguation + utterance is an ordinal?                   │
//! │     └── yes → cancel the selected sale, clear pending, done             │
//! │                                                                         │
//! │  2. Local cancel-command detection (no oracle involved)                 │
//! │     ├── explicit sale id in the utterance → cancel it                   │
//! │     ├── session has last_sale_id          → cancel that                 │
//! │     └── neither → list today's sales, offer a numbered choice           │
//! │                                                                         │
//! │  3. Otherwise: the extraction pipeline                                  │
//! │     oracle.extract ──► validate ──► SaleWriter.create_sale              │
//! │           │                │                 │                          │
//! │           ▼                ▼                 ▼                          │
//! │     parse failure    RejectReason    unresolved method /                │
//! │     = not recognized = not recognized  concurrency conflict             │
//! │                                                                         │
//! │  Every outcome is an AckData value carrying exactly what the caller's   │
//! │  acknowledgment prose must reference. Only infrastructure failures      │
//! │  surface as Err(EngineError).                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Turns for different conversations may run concurrently; turns for the
//! same conversation must be serialized by the caller, which owns the
//! session context (passed by value, returned mutated).

pub mod ack;
pub mod engine;
pub mod error;
pub mod intent;

pub use ack::{AckData, AckItem, AckPayment, AckPriceChange, DisambiguationOption};
pub use engine::{Engine, TurnOutcome};
pub use error::{EngineError, EngineResult};
