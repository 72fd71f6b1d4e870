use async_trait::async_trait;
use chrono::Utc;
use common::{CartItemId, CategoryId, Money, OrderId, ProductId, UserId};
use domain::{
    CartItemRecord, CartLine, CartSnapshot, Category, CategoryPatch, NewCategory, NewProduct,
    Order, OrderDraft, OrderItem, OrderStatus, Product, ProductPatch,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{CommerceStore, Page},
};

/// PostgreSQL-backed store implementation.
///
/// `commit_order` runs in a single transaction; the per-line conditional
/// `UPDATE ... WHERE stock >= $n` is the serialization point that keeps
/// racing orders from driving stock negative.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: row.try_get::<i64, _>("stock")? as u32,
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status_str: String = row.try_get("status")?;
        let status: OrderStatus = status_str
            .parse()
            .map_err(|()| StoreError::InvalidData(format!("unknown order status {status_str}")))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            status,
            total_price: Money::from_cents(row.try_get("total_cents")?),
            shipping_address: row.try_get("shipping_address")?,
            items,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            unit_price: Money::from_cents(row.try_get("price_cents")?),
        })
    }

    async fn load_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn orders_from_rows(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let items = self.load_order_items(order_id).await?;
            orders.push(Self::row_to_order(row, items)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl CommerceStore for PostgresStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let id = ProductId::new();
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, category_id, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.cents())
        .bind(new.stock as i64)
        .bind(new.category_id.as_uuid())
        .bind(new.is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, active_only: bool, page: Page) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM products
            WHERE is_active OR NOT $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(active_only)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                category_id = COALESCE($5, category_id),
                is_active = COALESCE($6, is_active),
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.category_id.map(|c| c.as_uuid()))
        .bind(patch.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", id))?;

        Self::row_to_product(row)
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product> {
        let row = sqlx::query(
            "UPDATE products SET stock = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id.as_uuid())
        .bind(stock as i64)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", id))?;

        Self::row_to_product(row)
    }

    async fn try_decrement_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = $3
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let id = CategoryId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.name)
        .bind(&new.description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_category(row)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn list_categories(&self, page: Page) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT * FROM categories ORDER BY name ASC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> Result<Category> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name)
        .bind(patch.description)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Category", id))?;

        Self::row_to_category(row)
    }

    async fn cart_snapshot(&self, user_id: UserId) -> Result<CartSnapshot> {
        let rows = sqlx::query(
            r#"
            SELECT ci.id, ci.product_id, ci.quantity, p.name, p.price_cents
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(|row| {
                Ok(CartLine {
                    item_id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    product_name: row.try_get("name")?,
                    unit_price: Money::from_cents(row.try_get("price_cents")?),
                    quantity: row.try_get::<i64, _>("quantity")? as u32,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CartSnapshot { user_id, lines })
    }

    async fn get_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity FROM cart_items WHERE id = $1 AND user_id = $2",
        )
        .bind(item_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(CartItemRecord {
                id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
                product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                quantity: row.try_get::<i64, _>("quantity")? as u32,
            })
        })
        .transpose()
    }

    async fn find_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(CartItemRecord {
                id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
                product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                quantity: row.try_get::<i64, _>("quantity")? as u32,
            })
        })
        .transpose()
    }

    async fn put_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItemRecord> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        let stock = stock.ok_or_else(|| StoreError::not_found("Product", product_id))?;

        // Stored lines never exceed availability at write time.
        let quantity = (quantity as i64).min(stock);

        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = EXCLUDED.updated_at
            RETURNING id, product_id, quantity
            "#,
        )
        .bind(CartItemId::new().as_uuid())
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(CartItemRecord {
            id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
        })
    }

    async fn remove_cart_item(&self, user_id: UserId, item_id: CartItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Cart item", item_id));
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn commit_order(&self, draft: OrderDraft) -> Result<Order> {
        let order_id = OrderId::new();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Conditional decrement per line; a zero-row update means the
        // pre-check raced another order and the whole commit aborts.
        for line in &draft.lines {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, updated_at = $3
                WHERE id = $1 AND stock >= $2
                "#,
            )
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(line.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;
                let available = available
                    .ok_or_else(|| StoreError::not_found("Product", line.product_id))?;
                tracing::debug!(
                    product_id = %line.product_id,
                    requested = line.quantity,
                    available,
                    "order commit lost a stock race, rolling back"
                );
                // Dropping tx rolls back the earlier decrements.
                return Err(StoreError::StockConflict {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    available: available as u32,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total_cents, shipping_address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(draft.user_id.as_uuid())
        .bind(OrderStatus::Pending.as_str())
        .bind(draft.total_price.cents())
        .bind(&draft.shipping_address)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, product_name, quantity, price_cents, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(&line.product_name)
            .bind(line.quantity as i64)
            .bind(line.unit_price.cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(draft.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            user_id: draft.user_id,
            status: OrderStatus::Pending,
            total_price: draft.total_price,
            shipping_address: draft.shipping_address,
            items: draft.lines,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.load_order_items(id).await?;
                Ok(Some(Self::row_to_order(row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_orders(&self, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        self.orders_from_rows(rows).await
    }

    async fn orders_for_user(&self, user_id: UserId, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        self.orders_from_rows(rows).await
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let row = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Order", id))?;

        let items = self.load_order_items(id).await?;
        Self::row_to_order(row, items)
    }
}
