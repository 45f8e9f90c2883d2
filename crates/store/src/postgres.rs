//! PostgreSQL storage backends.
//!
//! The atomic contracts are expressed as single conditional `UPDATE`
//! statements, so the database serializes concurrent callers.

use async_trait::async_trait;
use chrono::Utc;
use domain::{
    Address, Coupon, CouponApplied, CouponCode, LineItem, Money, Order, OrderDraft, OrderId,
    OrderStatus, PaymentPatch, PaymentRecord, ProductId, ProductSnapshot, UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::coupons::{CouponError, CouponLedger};
use crate::error::StoreError;
use crate::inventory::{InventoryError, InventoryLedger};
use crate::orders::{OrderStore, OrderStoreError};

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

fn column_u32(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| {
        StoreError::Database(sqlx::Error::Decode(
            format!("column {column} out of range: {value}").into(),
        ))
    })
}

/// PostgreSQL-backed inventory ledger.
#[derive(Clone)]
pub struct PostgresInventory {
    pool: PgPool,
}

impl PostgresInventory {
    /// Creates a new PostgreSQL inventory ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl InventoryLedger for PostgresInventory {
    async fn reserve(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductSnapshot, InventoryError> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING title, price_cents
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(quantity as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(ProductSnapshot {
                id: product_id,
                title: row.try_get("title")?,
                unit_price: Money::from_cents(row.try_get("price_cents")?),
            }),
            None => {
                // The conditional update matched nothing; a follow-up
                // read tells a missing product from an out-of-stock one.
                let title: Option<String> =
                    sqlx::query_scalar("SELECT title FROM products WHERE id = $1")
                        .bind(product_id.as_uuid())
                        .fetch_optional(&self.pool)
                        .await?;

                match title {
                    Some(title) => {
                        tracing::debug!(%product_id, quantity, "reservation rejected");
                        Err(InventoryError::InsufficientStock { title })
                    }
                    None => Err(InventoryError::ProductNotFound(product_id)),
                }
            }
        }
    }

    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(product_id.as_uuid())
            .bind(quantity as i64)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::ProductNotFound(product_id));
        }
        Ok(())
    }
}

/// PostgreSQL-backed coupon ledger.
#[derive(Clone)]
pub struct PostgresCoupons {
    pool: PgPool,
}

impl PostgresCoupons {
    /// Creates a new PostgreSQL coupon ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_coupon(row: PgRow) -> Result<Coupon, StoreError> {
        let kind = serde_json::from_value(serde_json::Value::String(row.try_get("kind")?))?;
        let max_uses = row
            .try_get::<Option<i64>, _>("max_uses")?
            .map(|v| column_u32(v, "max_uses"))
            .transpose()?;

        Ok(Coupon {
            code: CouponCode::new(row.try_get::<String, _>("code")?),
            kind,
            value: row.try_get("value")?,
            valid_until: row.try_get("valid_until")?,
            max_uses,
            used: column_u32(row.try_get("used")?, "used")?,
        })
    }
}

#[async_trait]
impl CouponLedger for PostgresCoupons {
    async fn validate(&self, code: &CouponCode) -> Result<Coupon, CouponError> {
        let row = sqlx::query(
            "SELECT code, kind, value, valid_until, max_uses, used FROM coupons WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(CouponError::NotFound(code.clone()));
        };

        let coupon = Self::row_to_coupon(row)?;
        if coupon.is_expired(Utc::now()) {
            return Err(CouponError::Expired(code.clone()));
        }
        if coupon.is_exhausted() {
            return Err(CouponError::Exhausted(code.clone()));
        }

        Ok(coupon)
    }

    async fn consume(&self, code: &CouponCode) -> Result<(), CouponError> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET used = used + 1
            WHERE code = $1 AND (max_uses IS NULL OR used < max_uses)
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Tell a missing coupon from one that just ran out.
            let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM coupons WHERE code = $1")
                .bind(code.as_str())
                .fetch_optional(&self.pool)
                .await?;

            return match exists {
                Some(_) => {
                    tracing::debug!(%code, "coupon consumption rejected");
                    Err(CouponError::Exhausted(code.clone()))
                }
                None => Err(CouponError::NotFound(code.clone())),
            };
        }

        Ok(())
    }
}

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrders {
    pool: PgPool,
}

impl PostgresOrders {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: PgRow) -> Result<Order, StoreError> {
        let items: Vec<LineItem> = serde_json::from_value(row.try_get("items")?)?;
        let address: Address = serde_json::from_value(row.try_get("address")?)?;
        let coupon: Option<CouponApplied> =
            match row.try_get::<Option<serde_json::Value>, _>("coupon")? {
                Some(value) => Some(serde_json::from_value(value)?),
                None => None,
            };
        let payment: PaymentRecord = serde_json::from_value(row.try_get("payment")?)?;
        let status: OrderStatus =
            serde_json::from_value(serde_json::Value::String(row.try_get("status")?))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            address,
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
            shipping: Money::from_cents(row.try_get("shipping_cents")?),
            total: Money::from_cents(row.try_get("total_cents")?),
            coupon,
            payment,
            status,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrders {
    async fn create(&self, draft: OrderDraft) -> Result<Order, OrderStoreError> {
        let order = Order::from_draft(OrderId::new(), draft, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, address, subtotal_cents, shipping_cents, total_cents, coupon, payment, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(serde_json::to_value(&order.items).map_err(StoreError::from)?)
        .bind(serde_json::to_value(&order.address).map_err(StoreError::from)?)
        .bind(order.subtotal.cents())
        .bind(order.shipping.cents())
        .bind(order.total.cents())
        .bind(
            order
                .coupon
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(StoreError::from)?,
        )
        .bind(serde_json::to_value(&order.payment).map_err(StoreError::from)?)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Order, OrderStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, items, address, subtotal_cents, shipping_cents, total_cents, coupon, payment, status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Self::row_to_order(row)?),
            None => Err(OrderStoreError::NotFound(id)),
        }
    }

    async fn update_payment(
        &self,
        id: OrderId,
        patch: PaymentPatch,
    ) -> Result<Order, OrderStoreError> {
        let patch_json = serde_json::to_value(&patch).map_err(StoreError::from)?;

        // JSONB concatenation keeps fields the patch leaves unset.
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET payment = payment || $2
            WHERE id = $1
            RETURNING id, user_id, items, address, subtotal_cents, shipping_cents, total_cents, coupon, payment, status, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch_json)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Self::row_to_order(row)?),
            None => Err(OrderStoreError::NotFound(id)),
        }
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderStoreError> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, items, address, subtotal_cents, shipping_cents, total_cents, coupon, payment, status, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Self::row_to_order(row)?),
            None => Err(OrderStoreError::NotFound(id)),
        }
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_id: &str,
    ) -> Result<Order, OrderStoreError> {
        // Earliest created wins when an identifier appears twice.
        let row = sqlx::query(
            r#"
            SELECT id, user_id, items, address, subtotal_cents, shipping_cents, total_cents, coupon, payment, status, created_at
            FROM orders
            WHERE payment->>'provider_payment_id' = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Self::row_to_order(row)?),
            None => Err(OrderStoreError::NoOrderForPayment(provider_id.to_string())),
        }
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Order>, OrderStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, items, address, subtotal_cents, shipping_cents, total_cents, coupon, payment, status, created_at
            FROM orders
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Self::row_to_order(row).map_err(OrderStoreError::from))
            .collect()
    }
}
