//! # Sale Writer
//!
//! The multi-table write path for a validated sale: header, line items,
//! payments and the price ledger, committed as one transaction.
//!
//! ## Write Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(tenant, normalized)                                        │
//! │                                                                         │
//! │  0. Resolve every payment phrase against the method catalog             │
//! │     └── any None → PaymentMethodUnresolved, NOTHING written             │
//! │                                                                         │
//! │  ┌───────────────────── one transaction ─────────────────────────┐      │
//! │  │  1. resolve/create customer (if mentioned)                    │      │
//! │  │  2. daily_seq = MAX(seq for tenant+day) + 1                   │      │
//! │  │  3. INSERT sale header                                        │      │
//! │  │  4. per line item:                                            │      │
//! │  │       resolve/create product                                  │      │
//! │  │       price ledger close+open if price changed                │      │
//! │  │       INSERT sale_item                                        │      │
//! │  │  5. INSERT payments (resolved method ids)                     │      │
//! │  └──────────────────────── COMMIT ───────────────────────────────┘      │
//! │                                                                         │
//! │  Failure anywhere → ROLLBACK: partial children are never observable.    │
//! │  A daily_seq UNIQUE collision (concurrent creation) is retried ONCE     │
//! │  with a fresh ordinal before surfacing the conflict.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::method::PaymentMethodRepository;
use crate::repository::sale::next_daily_seq_on;
use crate::repository::{customer, price, product};
use voz_core::extraction::NormalizedSale;
use voz_core::methods::resolve_method;
use voz_core::money::Money;
use voz_core::types::{Payment, Sale, SaleItem};

// =============================================================================
// Result Types
// =============================================================================

/// A price-ledger mutation that happened while writing a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceChange {
    pub product_name: String,
    /// The closed previous price; None when this was the first price.
    pub previous: Option<Money>,
    pub new: Money,
}

/// Everything a caller needs to acknowledge a created sale.
#[derive(Debug, Clone)]
pub struct CreatedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
    /// Resolved method names aligned with `payments`.
    pub payment_method_names: Vec<String>,
    pub price_changes: Vec<PriceChange>,
}

// =============================================================================
// Writer
// =============================================================================

/// Orchestrates the atomic multi-table write for a validated sale.
#[derive(Debug, Clone)]
pub struct SaleWriter {
    pool: SqlitePool,
}

impl SaleWriter {
    /// Creates a new SaleWriter.
    pub fn new(pool: SqlitePool) -> Self {
        SaleWriter { pool }
    }

    /// Persists a validated sale (see module docs for the sequence).
    ///
    /// ## Errors
    /// - `PaymentMethodUnresolved` - a payment phrase matched nothing; the
    ///   whole write is aborted before any insert
    /// - `UniqueViolation` - the daily-ordinal race lost twice in a row
    ///   (the first collision is retried internally)
    pub async fn create_sale(
        &self,
        tenant_id: &str,
        normalized: &NormalizedSale,
    ) -> DbResult<CreatedSale> {
        match self.try_create(tenant_id, normalized).await {
            Err(err) if err.is_unique_violation() => {
                debug!(tenant_id = %tenant_id, "Daily ordinal collision, retrying once");
                self.try_create(tenant_id, normalized).await
            }
            other => other,
        }
    }

    /// One creation attempt: a single transaction, rolled back on any error.
    async fn try_create(
        &self,
        tenant_id: &str,
        normalized: &NormalizedSale,
    ) -> DbResult<CreatedSale> {
        let now = Utc::now();
        let sale_date = now.date_naive();

        // Resolve every payment phrase up front. An unresolvable phrase must
        // fail the whole operation - silently dropping the payment line would
        // corrupt the total-equals-sum-of-payments invariant.
        let methods = PaymentMethodRepository::new(self.pool.clone())
            .list_active(tenant_id)
            .await?;

        let mut resolved_payments = Vec::with_capacity(normalized.payments.len());
        for payment in &normalized.payments {
            let method =
                resolve_method(&payment.method_phrase, &methods).ok_or_else(|| {
                    DbError::PaymentMethodUnresolved { phrase: payment.method_phrase.clone() }
                })?;
            resolved_payments.push((payment.amount, method.id.clone(), method.name.clone()));
        }

        let mut tx = self.pool.begin().await?;

        let customer_id = match &normalized.customer {
            Some(name) => {
                Some(customer::resolve_or_create_on(&mut tx, tenant_id, name, now).await?.id)
            }
            None => None,
        };

        let daily_seq = next_daily_seq_on(&mut tx, tenant_id, sale_date).await?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            daily_seq,
            sale_date,
            total_cents: normalized.total.cents(),
            customer_id,
            // No declared payments = payment detail pending
            incomplete: normalized.payments.is_empty(),
            voided: false,
            note: normalized.note.clone(),
            occurred_at: now,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, daily_seq, sale_date, total_cents, customer_id,
                incomplete, voided, note, occurred_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(sale.daily_seq)
        .bind(sale.sale_date)
        .bind(sale.total_cents)
        .bind(&sale.customer_id)
        .bind(sale.incomplete)
        .bind(sale.voided)
        .bind(&sale.note)
        .bind(sale.occurred_at)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        // Line items: resolve each product and feed the price ledger inside
        // the same transaction
        let mut items = Vec::with_capacity(normalized.items.len());
        let mut price_changes = Vec::new();

        for line in &normalized.items {
            let product =
                product::resolve_or_create_on(&mut tx, tenant_id, &line.product_name, now).await?;

            if let Some(previous) =
                price::record_if_changed_on(&mut tx, &product.id, line.unit_price, now).await?
            {
                price_changes.push(PriceChange {
                    product_name: product.name.clone(),
                    previous,
                    new: line.unit_price,
                });
            }

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: Some(product.id.clone()),
                name_snapshot: product.name.clone(),
                unit_price_cents: line.unit_price.cents(),
                quantity_milli: line.quantity.milli(),
                subtotal_cents: line.subtotal.cents(),
                unit_label: line.unit_label.clone(),
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, name_snapshot, unit_price_cents,
                    quantity_milli, subtotal_cents, unit_label
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity_milli)
            .bind(item.subtotal_cents)
            .bind(&item.unit_label)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        // Payments, with method ids resolved before the transaction opened
        let mut payments = Vec::with_capacity(resolved_payments.len());
        let mut payment_method_names = Vec::with_capacity(resolved_payments.len());

        for (amount, method_id, method_name) in resolved_payments {
            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                method_id,
                amount_cents: amount.cents(),
            };

            sqlx::query(
                r#"
                INSERT INTO payments (id, sale_id, method_id, amount_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&payment.id)
            .bind(&payment.sale_id)
            .bind(&payment.method_id)
            .bind(payment.amount_cents)
            .execute(&mut *tx)
            .await?;

            payments.push(payment);
            payment_method_names.push(method_name);
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            tenant_id = %tenant_id,
            daily_seq = sale.daily_seq,
            total = %normalized.total,
            items = items.len(),
            payments = payments.len(),
            "Sale recorded"
        );

        Ok(CreatedSale { sale, items, payments, payment_method_names, price_changes })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::SaleEdit;
    use voz_core::extraction::{NormalizedItem, NormalizedPayment};
    use voz_core::money::Quantity;

    const TENANT: &str = "tenant-1";

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.methods().seed_defaults(TENANT).await.unwrap();
        db
    }

    fn line(name: &str, qty_milli: i64, price_cents: i64) -> NormalizedItem {
        let unit_price = Money::from_cents(price_cents);
        let quantity = Quantity::from_milli(qty_milli);
        NormalizedItem {
            product_name: name.to_string(),
            quantity,
            unit_price,
            subtotal: unit_price.times_quantity(quantity),
            unit_label: None,
        }
    }

    fn empanadas_sale() -> NormalizedSale {
        NormalizedSale {
            total: Money::from_cents(90000),
            items: vec![line("Empanada", 3000, 30000)],
            payments: vec![NormalizedPayment {
                method_phrase: "MercadoPago".to_string(),
                amount: Money::from_cents(90000),
            }],
            customer: None,
            note: None,
        }
    }

    /// Empanadas previously catalogued at $250, sold at
    /// $300 → sale recorded, price history rotated, payment resolved.
    #[tokio::test]
    async fn test_create_sale_full_flow_with_price_change() {
        let db = setup().await;

        // Pre-catalogue empanadas at $250
        let product = db.products().resolve_or_create(TENANT, "Empanada").await.unwrap();
        db.prices()
            .record_if_changed(&product.id, Money::from_cents(25000), Utc::now())
            .await
            .unwrap();

        let created = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();

        assert_eq!(created.sale.daily_seq, 1);
        assert_eq!(created.sale.total_cents, 90000);
        assert!(!created.sale.incomplete);
        assert!(!created.sale.voided);

        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].product_id.as_deref(), Some(product.id.as_str()));
        assert_eq!(created.items[0].quantity_milli, 3000);
        assert_eq!(created.items[0].unit_price_cents, 30000);

        assert_eq!(created.payments.len(), 1);
        assert_eq!(created.payments[0].amount_cents, 90000);
        assert_eq!(created.payment_method_names, vec!["MercadoPago".to_string()]);

        // Price ledger: $250 entry closed, $300 entry open
        assert_eq!(
            created.price_changes,
            vec![PriceChange {
                product_name: "Empanada".to_string(),
                previous: Some(Money::from_cents(25000)),
                new: Money::from_cents(30000),
            }]
        );
        let history = db.prices().history(&product.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|e| e.is_open()).count(), 1);
        assert_eq!(
            db.prices().current_price(&product.id).await.unwrap(),
            Some(Money::from_cents(30000))
        );
    }

    /// Sum invariants hold exactly on everything the writer persists.
    #[tokio::test]
    async fn test_sum_invariants() {
        let db = setup().await;

        let sale = NormalizedSale {
            total: Money::from_cents(10000),
            items: vec![line("Torta", 1000, 6000), line("Pan", 500, 8000)],
            payments: vec![
                NormalizedPayment {
                    method_phrase: "efectivo".to_string(),
                    amount: Money::from_cents(5000),
                },
                NormalizedPayment {
                    method_phrase: "qr".to_string(),
                    amount: Money::from_cents(5000),
                },
            ],
            customer: None,
            note: None,
        };

        let created = db.writer().create_sale(TENANT, &sale).await.unwrap();
        let detail = db.sales().get_detail(TENANT, &created.sale.id).await.unwrap();

        let items_sum: i64 = detail.items.iter().map(|i| i.subtotal_cents).sum();
        let payments_sum: i64 = detail.payments.iter().map(|p| p.amount_cents).sum();
        assert_eq!(items_sum, detail.sale.total_cents);
        assert_eq!(payments_sum, detail.sale.total_cents);
    }

    /// "mitad efectivo mitad QR" → Efectivo and Billetera
    /// Digital rows.
    #[tokio::test]
    async fn test_split_payment_resolution() {
        let db = setup().await;

        let sale = NormalizedSale {
            total: Money::from_cents(10000),
            items: vec![line("Torta", 1000, 10000)],
            payments: vec![
                NormalizedPayment {
                    method_phrase: "efectivo".to_string(),
                    amount: Money::from_cents(5000),
                },
                NormalizedPayment {
                    method_phrase: "qr".to_string(),
                    amount: Money::from_cents(5000),
                },
            ],
            customer: None,
            note: None,
        };

        let created = db.writer().create_sale(TENANT, &sale).await.unwrap();
        assert_eq!(
            created.payment_method_names,
            vec!["Efectivo".to_string(), "Billetera Digital".to_string()]
        );
    }

    /// An unresolvable payment phrase fails the whole write: no sale, no
    /// items, no auto-created products.
    #[tokio::test]
    async fn test_unresolved_method_aborts_everything() {
        let db = setup().await;

        let sale = NormalizedSale {
            total: Money::from_cents(10000),
            items: vec![line("Torta", 1000, 10000)],
            payments: vec![NormalizedPayment {
                method_phrase: "cheque".to_string(),
                amount: Money::from_cents(10000),
            }],
            customer: None,
            note: None,
        };

        let err = db.writer().create_sale(TENANT, &sale).await.unwrap_err();
        assert!(matches!(err, DbError::PaymentMethodUnresolved { .. }));

        let today = Utc::now().date_naive();
        assert!(db.sales().list_for_day(TENANT, today).await.unwrap().is_empty());
        assert!(db.products().find_by_name(TENANT, "Torta").await.unwrap().is_none());
    }

    /// Daily ordinals are strictly increasing, never reused - even after a
    /// cancellation.
    #[tokio::test]
    async fn test_daily_ordinals_increase_without_reuse() {
        let db = setup().await;

        let s1 = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();
        let s2 = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();
        assert_eq!(s1.sale.daily_seq, 1);
        assert_eq!(s2.sale.daily_seq, 2);

        db.sales().cancel_sale(TENANT, &s2.sale.id).await.unwrap();

        let s3 = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();
        assert_eq!(s3.sale.daily_seq, 3);
    }

    /// Ordinals are partitioned per tenant.
    #[tokio::test]
    async fn test_daily_ordinals_are_tenant_scoped() {
        let db = setup().await;
        db.methods().seed_defaults("tenant-2").await.unwrap();

        let a = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();
        let b = db.writer().create_sale("tenant-2", &empanadas_sale()).await.unwrap();
        assert_eq!(a.sale.daily_seq, 1);
        assert_eq!(b.sale.daily_seq, 1);
    }

    /// Customer mentions resolve to one record across sales.
    #[tokio::test]
    async fn test_customer_resolution_idempotent() {
        let db = setup().await;

        let mut sale = empanadas_sale();
        sale.customer = Some("Marta".to_string());
        let first = db.writer().create_sale(TENANT, &sale).await.unwrap();

        sale.customer = Some("marta".to_string());
        let second = db.writer().create_sale(TENANT, &sale).await.unwrap();

        assert_eq!(first.sale.customer_id, second.sale.customer_id);
        assert!(first.sale.customer_id.is_some());
    }

    /// A sale without declared payments is recorded as incomplete.
    #[tokio::test]
    async fn test_no_payments_marks_incomplete() {
        let db = setup().await;

        let sale = NormalizedSale {
            total: Money::from_cents(5000),
            items: vec![line("Pan", 1000, 5000)],
            payments: vec![],
            customer: None,
            note: None,
        };

        let created = db.writer().create_sale(TENANT, &sale).await.unwrap();
        assert!(created.sale.incomplete);
    }

    /// Cancelling twice - first succeeds, second reports
    /// NotFound, the sale stays voided.
    #[tokio::test]
    async fn test_double_cancel() {
        let db = setup().await;
        let created = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();

        let cancelled = db.sales().cancel_sale(TENANT, &created.sale.id).await.unwrap();
        assert!(cancelled.voided);

        let err = db.sales().cancel_sale(TENANT, &created.sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let again = db.sales().get_by_id(TENANT, &created.sale.id).await.unwrap().unwrap();
        assert!(again.voided);
    }

    /// Cancellation never reveals cross-tenant existence.
    #[tokio::test]
    async fn test_cancel_cross_tenant_is_not_found() {
        let db = setup().await;
        let created = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();

        let err = db.sales().cancel_sale("tenant-2", &created.sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    /// Edits apply only declared fields and reject voided sales and empty
    /// field sets.
    #[tokio::test]
    async fn test_edit_sale_rules() {
        let db = setup().await;
        let created = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();

        // Empty field set is a validation error
        let err = db
            .sales()
            .edit_sale(TENANT, &created.sale.id, SaleEdit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // Note edit leaves the total alone
        let edited = db
            .sales()
            .edit_sale(
                TENANT,
                &created.sale.id,
                SaleEdit { note: Some("pagó con billetes chicos".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(edited.note.as_deref(), Some("pagó con billetes chicos"));
        assert_eq!(edited.total_cents, created.sale.total_cents);

        // Voided sales are immutable
        db.sales().cancel_sale(TENANT, &created.sale.id).await.unwrap();
        let err = db
            .sales()
            .edit_sale(
                TENANT,
                &created.sale.id,
                SaleEdit { note: Some("x".to_string()), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::SaleVoided(_)));
    }

    /// Editing the customer resolves against the catalog.
    #[tokio::test]
    async fn test_edit_sale_customer_and_total() {
        let db = setup().await;
        let created = db.writer().create_sale(TENANT, &empanadas_sale()).await.unwrap();

        let edited = db
            .sales()
            .edit_sale(
                TENANT,
                &created.sale.id,
                SaleEdit {
                    total: Some(Money::from_cents(95000)),
                    customer_name: Some("Marta".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.total_cents, 95000);
        let customer_id = edited.customer_id.expect("customer resolved");
        let customer = db.customers().get_by_id(TENANT, &customer_id).await.unwrap().unwrap();
        assert_eq!(customer.name, "Marta");
    }
}
