//! # Customer Repository
//!
//! Tenant-scoped customer lookup. Customers are matched case-insensitively
//! on name and created on first unmatched mention ("le vendí a Marta").

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use voz_core::text::normalize;
use voz_core::types::Customer;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Resolves a customer name to an existing record, creating one on a
    /// miss. Matching is case/accent-insensitive within the tenant.
    pub async fn resolve_or_create(&self, tenant_id: &str, name: &str) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        resolve_or_create_on(&mut conn, tenant_id, name, Utc::now()).await
    }

    /// Gets a customer by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, name, created_at
            FROM customers
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Resolve-or-create on an existing connection, for the sale writer.
pub(crate) async fn resolve_or_create_on(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> DbResult<Customer> {
    let name = name.trim();
    let name_norm = normalize(name);

    let existing = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, tenant_id, name, created_at
        FROM customers
        WHERE tenant_id = ?1 AND name_norm = ?2
        "#,
    )
    .bind(tenant_id)
    .bind(&name_norm)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(customer) = existing {
        return Ok(customer);
    }

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        name: name.to_string(),
        created_at: now,
    };

    debug!(customer_id = %customer.id, name = %customer.name, "Creating customer on first mention");

    sqlx::query(
        r#"
        INSERT INTO customers (id, tenant_id, name, name_norm, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.tenant_id)
    .bind(&customer.name)
    .bind(&name_norm)
    .bind(customer.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(customer)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    const TENANT: &str = "tenant-1";

    #[tokio::test]
    async fn test_created_on_first_mention_then_matched() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let first = repo.resolve_or_create(TENANT, "Doña Marta").await.unwrap();
        let second = repo.resolve_or_create(TENANT, "doña marta").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "Doña Marta");
    }

    #[tokio::test]
    async fn test_tenant_scoped_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let marta = repo.resolve_or_create("tenant-a", "Marta").await.unwrap();
        assert!(repo.get_by_id("tenant-b", &marta.id).await.unwrap().is_none());
        assert!(repo.get_by_id("tenant-a", &marta.id).await.unwrap().is_some());
    }
}
