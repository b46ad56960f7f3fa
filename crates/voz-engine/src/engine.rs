//! # Turn Orchestrator
//!
//! `Engine` wires the oracle, the validator, the resolvers and the
//! transaction writer into the per-turn control flow described in the crate
//! docs. Each turn is one logically sequential unit of work: oracle call,
//! then validation, then resolution, then writes - steps await I/O but never
//! run concurrently with their siblings.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ack::{AckData, AckItem, AckPayment, AckPriceChange, DisambiguationOption};
use crate::error::EngineResult;
use crate::intent::{self, Intent};
use voz_core::extraction::validate;
use voz_core::session::{parse_ordinal, Role, SessionContext};
use voz_core::types::{CatalogProduct, CatalogSnapshot, Sale};
use voz_db::writer::CreatedSale;
use voz_db::{Database, DbError, SaleEdit};
use voz_oracle::Oracle;

// =============================================================================
// Turn Outcome
// =============================================================================

/// What one turn hands back to the caller: the acknowledgment data and the
/// mutated session context (the engine keeps no copy).
#[derive(Debug)]
pub struct TurnOutcome {
    pub ack: AckData,
    pub session: SessionContext,
}

// =============================================================================
// Engine
// =============================================================================

/// The conversational data-extraction and reconciliation engine.
#[derive(Clone)]
pub struct Engine {
    db: Database,
    oracle: Arc<dyn Oracle>,
}

impl Engine {
    /// Creates an engine over a database handle and an oracle.
    pub fn new(db: Database, oracle: Arc<dyn Oracle>) -> Self {
        Engine { db, oracle }
    }

    /// Processes one conversational turn.
    ///
    /// ## Contract
    /// - `tenant_id` is already verified by the caller (the HTTP layer owns
    ///   authentication); every store access below is scoped to it.
    /// - `session` is owned by the caller and serialized per conversation:
    ///   at most one in-flight turn per context.
    pub async fn handle_turn(
        &self,
        tenant_id: &str,
        utterance: &str,
        mut session: SessionContext,
    ) -> EngineResult<TurnOutcome> {
        let now = Utc::now();
        session.push_message(Role::User, utterance, now);

        let ack = self.dispatch(tenant_id, utterance, &mut session).await?;

        session.push_message(Role::Assistant, ack.summary(), Utc::now());
        Ok(TurnOutcome { ack, session })
    }

    /// The per-turn decision tree (see crate docs).
    async fn dispatch(
        &self,
        tenant_id: &str,
        utterance: &str,
        session: &mut SessionContext,
    ) -> EngineResult<AckData> {
        let now = Utc::now();

        // Step 1: a live disambiguation list takes precedence - "la 2" is an
        // answer, not a new command.
        if let Some(available) = session.live_pending(now).map(|p| p.sale_ids.len()) {
            if let Some(sale_id) = session.resolve_ordinal(utterance, now).map(str::to_string) {
                session.clear_pending();
                return self.cancel_target(tenant_id, &sale_id, session).await;
            }

            if let Some(supplied) = parse_ordinal(utterance) {
                // An ordinal that selects nothing: report and drop the list,
                // never guess.
                session.clear_pending();
                return Ok(AckData::OrdinalRejected { supplied, available });
            }

            // Not an ordinal at all: the user changed topic. The list stays
            // until it expires or the next state change clears it.
        }

        // Step 2: local cancel-command detection, no oracle involved
        match intent::detect(utterance) {
            Intent::Cancel { explicit_id } => {
                if let Some(id) = explicit_id {
                    return self.cancel_target(tenant_id, &id, session).await;
                }

                if let Some(last) = session.last_sale_id.clone() {
                    return self.cancel_target(tenant_id, &last, session).await;
                }

                // Ambiguous reference: enumerate today's sales
                let today = now.date_naive();
                let sales = self.db.sales().list_for_day(tenant_id, today).await?;

                if sales.is_empty() {
                    return Ok(AckData::NothingToCancel { date: today });
                }

                let options = sales
                    .iter()
                    .enumerate()
                    .map(|(index, sale)| DisambiguationOption {
                        ordinal: index + 1,
                        sale_id: sale.id.clone(),
                        daily_seq: sale.daily_seq,
                        total_cents: sale.total_cents,
                    })
                    .collect();

                session.offer_disambiguation(
                    today,
                    sales.into_iter().map(|sale| sale.id).collect(),
                    now,
                );

                debug!(tenant_id = %tenant_id, "Cancel target ambiguous, offering list");
                Ok(AckData::DisambiguationOffered { date: today, options })
            }

            Intent::Extract => self.extract_and_record(tenant_id, utterance, session).await,
        }
    }

    /// Cancels one sale and updates the session.
    async fn cancel_target(
        &self,
        tenant_id: &str,
        sale_id: &str,
        session: &mut SessionContext,
    ) -> EngineResult<AckData> {
        match self.db.sales().cancel_sale(tenant_id, sale_id).await {
            Ok(sale) => {
                session.record_cancellation();
                info!(sale_id = %sale.id, daily_seq = sale.daily_seq, "Sale cancelled by command");
                Ok(AckData::SaleCancelled {
                    sale_id: sale.id,
                    daily_seq: sale.daily_seq,
                    total_cents: sale.total_cents,
                })
            }

            // Missing, cross-tenant and already-voided all land here; the
            // session is left untouched (nothing was cancelled).
            Err(DbError::NotFound { .. }) => {
                Ok(AckData::TargetNotFound { reference: sale_id.to_string() })
            }

            Err(err) => Err(err.into()),
        }
    }

    /// The extraction pipeline: oracle → validator → writer.
    async fn extract_and_record(
        &self,
        tenant_id: &str,
        utterance: &str,
        session: &mut SessionContext,
    ) -> EngineResult<AckData> {
        let catalog = self.catalog_snapshot(tenant_id).await?;

        // The engine never retries the oracle: a failed or unparseable call
        // is a final answer for this turn, treated like a rejection.
        let raw = match self.oracle.extract(utterance, &catalog).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "Oracle extraction failed; failing closed");
                return Ok(AckData::NotRecognized { reason: None, oracle_reply: None });
            }
        };
        let oracle_reply = raw.reply.clone();

        let normalized = match validate(&raw) {
            Ok(normalized) => normalized,
            Err(reason) => {
                debug!(%reason, "Extraction rejected, nothing persisted");
                return Ok(AckData::NotRecognized { reason: Some(reason), oracle_reply });
            }
        };
        let customer_name = normalized.customer.clone();

        match self.db.writer().create_sale(tenant_id, &normalized).await {
            Ok(created) => {
                session.record_new_sale(created.sale.id.clone());
                Ok(recorded_ack(created, customer_name, oracle_reply))
            }

            Err(DbError::PaymentMethodUnresolved { phrase }) => {
                Ok(AckData::PaymentMethodUnresolved { phrase })
            }

            Err(err) => Err(err.into()),
        }
    }

    /// Builds the catalog snapshot handed to the oracle: available products
    /// with their current prices, plus the active payment-method names.
    pub async fn catalog_snapshot(&self, tenant_id: &str) -> EngineResult<CatalogSnapshot> {
        let products = self.db.products().list_available(tenant_id).await?;
        let ledger = self.db.prices();

        let mut catalog_products = Vec::with_capacity(products.len());
        for product in products {
            let current_price_cents = ledger
                .current_price(&product.id)
                .await?
                .map(|price| price.cents());
            catalog_products.push(CatalogProduct { name: product.name, current_price_cents });
        }

        let payment_methods = self
            .db
            .methods()
            .list_active(tenant_id)
            .await?
            .into_iter()
            .map(|method| method.name)
            .collect();

        Ok(CatalogSnapshot { products: catalog_products, payment_methods })
    }

    /// Applies an edit command to a sale. Exposed for the transport layer;
    /// edits are field-explicit, not conversational.
    pub async fn edit_sale(
        &self,
        tenant_id: &str,
        sale_id: &str,
        edit: SaleEdit,
    ) -> EngineResult<Sale> {
        self.db
            .sales()
            .edit_sale(tenant_id, sale_id, edit)
            .await
            .map_err(Into::into)
    }

    /// Cancels a sale by explicit id. Exposed for the transport layer.
    pub async fn cancel_sale(&self, tenant_id: &str, sale_id: &str) -> EngineResult<Sale> {
        self.db
            .sales()
            .cancel_sale(tenant_id, sale_id)
            .await
            .map_err(Into::into)
    }

    /// The underlying database handle, for callers that need reads beyond
    /// the turn flow (reporting, tenant bootstrap).
    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// Assembles the SaleRecorded acknowledgment from the writer's result.
fn recorded_ack(
    created: CreatedSale,
    customer_name: Option<String>,
    oracle_reply: Option<String>,
) -> AckData {
    let items = created
        .items
        .iter()
        .map(|item| AckItem {
            name: item.name_snapshot.clone(),
            quantity_milli: item.quantity_milli,
            unit_price_cents: item.unit_price_cents,
            subtotal_cents: item.subtotal_cents,
            unit_label: item.unit_label.clone(),
        })
        .collect();

    let payments = created
        .payments
        .iter()
        .zip(&created.payment_method_names)
        .map(|(payment, method_name)| AckPayment {
            method_name: method_name.clone(),
            amount_cents: payment.amount_cents,
        })
        .collect();

    let price_changes = created
        .price_changes
        .iter()
        .map(|change| AckPriceChange {
            product_name: change.product_name.clone(),
            previous_cents: change.previous.map(|p| p.cents()),
            new_cents: change.new.cents(),
        })
        .collect();

    AckData::SaleRecorded {
        sale_id: created.sale.id,
        daily_seq: created.sale.daily_seq,
        total_cents: created.sale.total_cents,
        items,
        payments,
        price_changes,
        customer_name,
        oracle_reply,
    }
}
