//! # Sale Repository
//!
//! Sale reads, edits and cancellation, tenant-scoped.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (SaleWriter, one transaction)                                │
//! │     └── header + items + payments + price ledger, all or nothing        │
//! │                                                                         │
//! │  2. (OPTIONAL) EDIT                                                     │
//! │     └── edit_sale() → only {total, customer, note, date, incomplete}    │
//! │         Line items and payments are frozen after creation.              │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                   │
//! │     └── cancel_sale() → voided = 1. Never deletes rows.                 │
//! │         Voided sales are immutable from then on.                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership Reporting
//! A sale owned by another tenant is reported as NotFound, never as
//! forbidden - existence is not revealed across tenants. The cancel path
//! also reports an already-voided sale as NotFound, mirroring the observed
//! upstream behavior (see DESIGN.md).

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::customer;
use voz_core::error::ValidationError;
use voz_core::money::Money;
use voz_core::types::{Payment, Sale, SaleItem};

// =============================================================================
// Edit Field Set
// =============================================================================

/// The declared fields of an edit command. Only present fields are applied.
///
/// Line items and payments are structural and cannot be edited post-creation;
/// the header total is intentionally editable independently of them (a
/// divergence is logged, not rejected - see DESIGN.md).
#[derive(Debug, Clone, Default)]
pub struct SaleEdit {
    pub total: Option<Money>,
    /// Resolved (or created) against the customer catalog.
    pub customer_name: Option<String>,
    pub note: Option<String>,
    pub occurred_at: Option<chrono::DateTime<Utc>>,
    pub incomplete: Option<bool>,
}

impl SaleEdit {
    /// True when no field was declared at all.
    pub fn is_empty(&self) -> bool {
        self.total.is_none()
            && self.customer_name.is_none()
            && self.note.is_none()
            && self.occurred_at.is_none()
            && self.incomplete.is_none()
    }
}

// =============================================================================
// Sale Detail
// =============================================================================

/// A sale header with its children, for acknowledgment data and reporting.
#[derive(Debug, Clone)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const SALE_COLUMNS: &str = "id, tenant_id, daily_seq, sale_date, total_cents, customer_id, \
     incomplete, voided, note, occurred_at, created_at, updated_at";

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale with its items and payments; NotFound when the sale does
    /// not exist for this tenant.
    pub async fn get_detail(&self, tenant_id: &str, id: &str) -> DbResult<SaleDetail> {
        let sale = self
            .get_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let items = self.get_items(id).await?;
        let payments = self.get_payments(id).await?;

        Ok(SaleDetail { sale, items, payments })
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, name_snapshot, unit_price_cents,
                   quantity_milli, subtotal_cents, unit_label
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets all payments for a sale.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, sale_id, method_id, amount_cents
            FROM payments
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lists the tenant's non-voided sales for one calendar day, ordered by
    /// daily ordinal.
    ///
    /// ## Usage
    /// Powers the disambiguation listing ("which sale? 1) ... 2) ...").
    pub async fn list_for_day(&self, tenant_id: &str, date: NaiveDate) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE tenant_id = ?1 AND sale_date = ?2 AND voided = 0 \
             ORDER BY daily_seq"
        ))
        .bind(tenant_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Applies an edit command to a non-voided sale.
    ///
    /// ## Rules
    /// - NotFound when the sale does not exist for this tenant
    /// - SaleVoided when it is voided (voided sales are immutable)
    /// - Validation error when zero fields are supplied, or a negative total
    /// - Moving `occurred_at` across a calendar day reassigns the daily
    ///   ordinal within the new day
    pub async fn edit_sale(&self, tenant_id: &str, id: &str, edit: SaleEdit) -> DbResult<Sale> {
        if edit.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        if let Some(total) = edit.total {
            if total.is_negative() {
                return Err(ValidationError::MustNotBeNegative { field: "total" }.into());
            }
        }

        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        if sale.voided {
            return Err(DbError::SaleVoided(id.to_string()));
        }

        let customer_id = match &edit.customer_name {
            Some(name) => {
                Some(customer::resolve_or_create_on(&mut tx, tenant_id, name, Utc::now()).await?.id)
            }
            None => sale.customer_id.clone(),
        };

        let total_cents = edit.total.map(|t| t.cents()).unwrap_or(sale.total_cents);
        let note = edit.note.clone().or_else(|| sale.note.clone());
        let occurred_at = edit.occurred_at.unwrap_or(sale.occurred_at);
        let incomplete = edit.incomplete.unwrap_or(sale.incomplete);

        // Crossing a calendar day invalidates the old ordinal's partition;
        // the sale takes the next ordinal of its new day.
        let new_date = occurred_at.date_naive();
        let (sale_date, daily_seq) = if new_date != sale.sale_date {
            let seq = next_daily_seq_on(&mut tx, tenant_id, new_date).await?;
            (new_date, seq)
        } else {
            (sale.sale_date, sale.daily_seq)
        };

        if edit.total.is_some() && total_cents != sale.total_cents {
            let items_total: i64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(subtotal_cents), 0) FROM sale_items WHERE sale_id = ?1",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if items_total != 0 && items_total != total_cents {
                // Header total is editable independently of line items;
                // surface the divergence for the operator.
                warn!(
                    sale_id = %id,
                    total_cents,
                    items_total,
                    "Edited sale total no longer matches line items"
                );
            }
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE sales SET
                daily_seq = ?3,
                sale_date = ?4,
                total_cents = ?5,
                customer_id = ?6,
                incomplete = ?7,
                note = ?8,
                occurred_at = ?9,
                updated_at = ?10
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(daily_seq)
        .bind(sale_date)
        .bind(total_cents)
        .bind(&customer_id)
        .bind(incomplete)
        .bind(&note)
        .bind(occurred_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(sale_id = %id, "Sale edited");
        Ok(updated)
    }

    /// Voids a sale. Never deletes rows.
    ///
    /// ## Reporting
    /// Missing, cross-tenant and already-voided targets are all reported as
    /// NotFound: cancellation is idempotent in effect but not in reporting.
    pub async fn cancel_sale(&self, tenant_id: &str, id: &str) -> DbResult<Sale> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET voided = 1, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2 AND voided = 0
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        debug!(sale_id = %id, "Sale voided");

        self.get_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Computes the next daily ordinal for a tenant + calendar day: highest
/// existing ordinal plus one, first sale of the day gets 1.
///
/// This read-then-insert has a race window under concurrent creation; the
/// UNIQUE(tenant_id, sale_date, daily_seq) index turns a collision into a
/// retryable error (see SaleWriter).
pub(crate) async fn next_daily_seq_on(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    date: NaiveDate,
) -> DbResult<i64> {
    let max: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT MAX(daily_seq) FROM sales
        WHERE tenant_id = ?1 AND sale_date = ?2
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(max.unwrap_or(0) + 1)
}
