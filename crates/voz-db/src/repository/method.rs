//! # Payment Method Repository
//!
//! The tenant's payment-method catalog: the resolution target for free-text
//! payment phrases. Actual phrase matching is pure logic in
//! [`voz_core::methods::resolve_method`]; this repository only stores and
//! lists the canonical records.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use voz_core::types::PaymentMethod;

/// The standard method set seeded for a new tenant.
pub const DEFAULT_METHOD_NAMES: &[&str] = &[
    "Efectivo",
    "MercadoPago",
    "Billetera Digital",
    "Tarjeta de Débito",
    "Tarjeta de Crédito",
    "Transferencia",
];

/// Repository for payment-method database operations.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    /// Creates a new PaymentMethodRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    /// Lists the tenant's active methods, ordered by name.
    pub async fn list_active(&self, tenant_id: &str) -> DbResult<Vec<PaymentMethod>> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT id, tenant_id, name, active
            FROM payment_methods
            WHERE tenant_id = ?1 AND active = 1
            ORDER BY name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    /// Gets a method by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT id, tenant_id, name, active
            FROM payment_methods
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    /// Seeds the default method set for a tenant. Idempotent: already-seeded
    /// names are left untouched.
    ///
    /// ## When To Call
    /// Tenant bootstrap (and test setup). Returns how many rows were added.
    pub async fn seed_defaults(&self, tenant_id: &str) -> DbResult<usize> {
        let mut added = 0;

        for name in DEFAULT_METHOD_NAMES {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO payment_methods (id, tenant_id, name, active)
                VALUES (?1, ?2, ?3, 1)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(tenant_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

            added += result.rows_affected() as usize;
        }

        if added > 0 {
            info!(tenant_id = %tenant_id, added, "Seeded default payment methods");
        }

        Ok(added)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const TENANT: &str = "tenant-1";

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.methods();

        let first = repo.seed_defaults(TENANT).await.unwrap();
        assert_eq!(first, DEFAULT_METHOD_NAMES.len());

        let second = repo.seed_defaults(TENANT).await.unwrap();
        assert_eq!(second, 0);

        let methods = repo.list_active(TENANT).await.unwrap();
        assert_eq!(methods.len(), DEFAULT_METHOD_NAMES.len());
    }

    #[tokio::test]
    async fn test_listing_is_tenant_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.methods();

        repo.seed_defaults("tenant-a").await.unwrap();
        assert!(repo.list_active("tenant-b").await.unwrap().is_empty());
    }
}
