//! # Product Repository
//!
//! Product resolution and lookup, tenant-scoped.
//!
//! ## Resolve-or-Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_or_create(tenant, "empanada")                                  │
//! │                                                                         │
//! │  SELECT ... WHERE tenant_id = ? AND name_norm = lower/unaccent(name)    │
//! │       │                                                                 │
//! │       ├── hit  → return existing product (same id every time)           │
//! │       │                                                                 │
//! │       └── miss → INSERT with auto_created = 1                           │
//! │                      │                                                  │
//! │                      └── UNIQUE race lost? re-SELECT the winner         │
//! │                                                                         │
//! │  Never fails on absence: by the time resolution runs, the oracle has    │
//! │  already asserted the sale happened, so a product must exist for the    │
//! │  line item to attach to.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use voz_core::text::normalize;
use voz_core::types::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Resolves a free-text product name to an existing product, creating it
    /// (flagged auto-created) on a miss.
    ///
    /// Idempotent: resolving the same name twice within a tenant returns the
    /// same product id both times.
    pub async fn resolve_or_create(&self, tenant_id: &str, name: &str) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        resolve_or_create_on(&mut conn, tenant_id, name, Utc::now()).await
    }

    /// Gets a product by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, name, available, auto_created, created_at, updated_at
            FROM products
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Finds a product by name (case/accent-insensitive), without creating.
    pub async fn find_by_name(&self, tenant_id: &str, name: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_by_name_on(&mut conn, tenant_id, name).await
    }

    /// Lists the tenant's available products, ordered by name.
    ///
    /// ## Usage
    /// Feeds the catalog snapshot handed to the oracle.
    pub async fn list_available(&self, tenant_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, name, available, auto_created, created_at, updated_at
            FROM products
            WHERE tenant_id = ?1 AND available = 1
            ORDER BY name_norm
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================
// Used by the sale writer so product creation joins the sale's transaction.

/// Finds a product by normalized name on an existing connection.
pub(crate) async fn find_by_name_on(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    name: &str,
) -> DbResult<Option<Product>> {
    let name_norm = normalize(name.trim());

    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, tenant_id, name, available, auto_created, created_at, updated_at
        FROM products
        WHERE tenant_id = ?1 AND name_norm = ?2
        "#,
    )
    .bind(tenant_id)
    .bind(&name_norm)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Resolve-or-create on an existing connection (see module docs).
pub(crate) async fn resolve_or_create_on(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> DbResult<Product> {
    let name = name.trim();

    if let Some(existing) = find_by_name_on(conn, tenant_id, name).await? {
        return Ok(existing);
    }

    let product = Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        name: name.to_string(),
        available: true,
        auto_created: true,
        created_at: now,
        updated_at: now,
    };

    debug!(product_id = %product.id, name = %product.name, "Auto-creating product");

    let inserted = sqlx::query(
        r#"
        INSERT INTO products (id, tenant_id, name, name_norm, available, auto_created, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&product.id)
    .bind(&product.tenant_id)
    .bind(&product.name)
    .bind(normalize(name))
    .bind(product.available)
    .bind(product.auto_created)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => Ok(product),
        Err(err) => {
            // Lost a concurrent resolve-or-create race: the winner's row
            // satisfies the caller just as well.
            let db_err = crate::error::DbError::from(err);
            if db_err.is_unique_violation() {
                if let Some(existing) = find_by_name_on(conn, tenant_id, name).await? {
                    return Ok(existing);
                }
            }
            Err(db_err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    const TENANT: &str = "tenant-1";

    #[tokio::test]
    async fn test_resolve_creates_then_reuses() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let first = repo.resolve_or_create(TENANT, "Empanada").await.unwrap();
        assert!(first.auto_created);
        assert!(first.available);

        // Same name, different casing and accents: same product id
        let second = repo.resolve_or_create(TENANT, "EMPANADA").await.unwrap();
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_resolution_is_tenant_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let a = repo.resolve_or_create("tenant-a", "Pan").await.unwrap();
        let b = repo.resolve_or_create("tenant-b", "Pan").await.unwrap();
        assert_ne!(a.id, b.id);

        // Cross-tenant get does not leak
        assert!(repo.get_by_id("tenant-b", &a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_available_sorted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.resolve_or_create(TENANT, "Torta").await.unwrap();
        repo.resolve_or_create(TENANT, "Empanada").await.unwrap();

        let listed = repo.list_available(TENANT).await.unwrap();
        let names: Vec<_> = listed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Empanada", "Torta"]);
    }

    #[tokio::test]
    async fn test_find_by_name_does_not_create() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        assert!(repo.find_by_name(TENANT, "Nada").await.unwrap().is_none());
        assert!(repo.list_available(TENANT).await.unwrap().is_empty());
    }
}
