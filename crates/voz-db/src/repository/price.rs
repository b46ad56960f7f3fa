//! # Price Ledger
//!
//! Maintains, per product, a current price and a closed history of prior
//! prices with validity intervals.
//!
//! ## Close + Open Is One Atomic Step
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_if_changed(product, $300, now)   current open entry: $250       │
//! │                                                                         │
//! │  ┌───────────────────── one transaction ─────────────────────────┐      │
//! │  │  UPDATE price_history SET valid_until = now                   │      │
//! │  │      WHERE product_id = ? AND valid_until IS NULL             │      │
//! │  │  INSERT price_history (price = $300, valid_from = now,        │      │
//! │  │      valid_until = NULL)                                      │      │
//! │  └───────────────────────────────────────────────────────────────┘      │
//! │                                                                         │
//! │  A failure between the two writes must not leave two concurrently       │
//! │  open entries nor zero open entries for a product with history.         │
//! │  Belt and suspenders: a partial UNIQUE index on                         │
//! │  (product_id) WHERE valid_until IS NULL rejects a second open row.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Price comparison is exact cents inequality - no tolerance. Entries are
//! append-only: closed, never mutated or deleted.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use voz_core::money::Money;
use voz_core::types::PriceEntry;

/// Repository for price-history operations.
#[derive(Debug, Clone)]
pub struct PriceLedger {
    pool: SqlitePool,
}

impl PriceLedger {
    /// Creates a new PriceLedger.
    pub fn new(pool: SqlitePool) -> Self {
        PriceLedger { pool }
    }

    /// Returns the product's active price, or None if the product has never
    /// had a price recorded.
    pub async fn current_price(&self, product_id: &str) -> DbResult<Option<Money>> {
        let mut conn = self.pool.acquire().await?;
        let cents = current_price_on(&mut conn, product_id).await?;
        Ok(cents.map(Money::from_cents))
    }

    /// Records a price observation, opening a new history entry when it
    /// differs from the active one (see module docs).
    ///
    /// ## Returns
    /// The closed previous price when a change was recorded, wrapped as
    /// `Some(Some(old))`; `Some(None)` when this is the product's first
    /// price; `None` when the observation matched the active price and
    /// nothing was written.
    pub async fn record_if_changed(
        &self,
        product_id: &str,
        observed: Money,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Option<Money>>> {
        let mut tx = self.pool.begin().await?;
        let change = record_if_changed_on(&mut tx, product_id, observed, now).await?;
        tx.commit().await?;
        Ok(change)
    }

    /// Returns the product's price history, most recent first.
    pub async fn history(&self, product_id: &str) -> DbResult<Vec<PriceEntry>> {
        let entries = sqlx::query_as::<_, PriceEntry>(
            r#"
            SELECT id, product_id, unit_price_cents, valid_from, valid_until
            FROM price_history
            WHERE product_id = ?1
            ORDER BY valid_from DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Reads the active price on an existing connection.
pub(crate) async fn current_price_on(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Option<i64>> {
    let cents: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT unit_price_cents
        FROM price_history
        WHERE product_id = ?1 AND valid_until IS NULL
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(cents)
}

/// Close-then-open on an existing connection. The caller owns the
/// transaction boundary.
///
/// ## Returns
/// `Some(previous)` when a new entry was opened (`previous` is `None` for a
/// first price), `None` when the observation matched the active price.
pub(crate) async fn record_if_changed_on(
    conn: &mut SqliteConnection,
    product_id: &str,
    observed: Money,
    now: DateTime<Utc>,
) -> DbResult<Option<Option<Money>>> {
    let current = current_price_on(conn, product_id).await?;

    match current {
        // Exact cents equality: nothing to record
        Some(cents) if cents == observed.cents() => Ok(None),

        Some(cents) => {
            debug!(
                product_id = %product_id,
                old_cents = cents,
                new_cents = observed.cents(),
                "Price changed, rotating history entry"
            );

            sqlx::query(
                r#"
                UPDATE price_history
                SET valid_until = ?2
                WHERE product_id = ?1 AND valid_until IS NULL
                "#,
            )
            .bind(product_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            insert_open_entry(conn, product_id, observed, now).await?;
            Ok(Some(Some(Money::from_cents(cents))))
        }

        None => {
            debug!(
                product_id = %product_id,
                cents = observed.cents(),
                "Recording first price"
            );
            insert_open_entry(conn, product_id, observed, now).await?;
            Ok(Some(None))
        }
    }
}

/// Inserts a new open entry for the product.
async fn insert_open_entry(
    conn: &mut SqliteConnection,
    product_id: &str,
    price: Money,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO price_history (id, product_id, unit_price_cents, valid_from, valid_until)
        VALUES (?1, ?2, ?3, ?4, NULL)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(price.cents())
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
