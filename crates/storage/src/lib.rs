use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{Customer, CustomerId, Order, OrderId, OrderStatus, Quote, QuoteId, QuoteStatus},
    protocol::{CreateCustomerRequest, CreateOrderRequest, CreateQuoteRequest},
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

const ORDER_COLUMNS: &str = "o.id, o.customer_id, c.name, o.status, o.description, o.total_cents, o.delivery_date, o.created_at";
const QUOTE_COLUMNS: &str = "q.id, q.customer_id, c.name, q.status, q.description, q.total_cents, q.valid_until, q.created_at";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every connection to `:memory:` is a separate database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_customer(&self, req: &CreateCustomerRequest) -> Result<Customer> {
        let customer = Customer {
            id: CustomerId::generate(),
            name: req.name.trim().to_string(),
            phone: req.phone.clone(),
            email: req.email.clone(),
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO customers (id, name, phone, email, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(customer.id.to_string())
        .bind(&customer.name)
        .bind(customer.phone.as_deref())
        .bind(customer.email.as_deref())
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .context("failed to insert customer")?;
        Ok(customer)
    }

    pub async fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, name, phone, email, created_at FROM customers WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(
            "SELECT id, name, phone, email, created_at FROM customers
             ORDER BY lower(name) ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(customer_from_row).collect()
    }

    pub async fn count_customers(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn create_order(&self, req: &CreateOrderRequest) -> Result<Order> {
        let id = OrderId::generate();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO orders (id, customer_id, status, description, total_cents, delivery_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(req.customer_id.to_string())
        .bind(req.status.unwrap_or(OrderStatus::Pending).as_str())
        .bind(req.description.trim())
        .bind(req.total_cents)
        .bind(req.delivery_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("failed to insert order")?;

        self.order(id)
            .await?
            .ok_or_else(|| anyhow!("order {id} missing right after insert"))
    }

    pub async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             INNER JOIN customers c ON c.id = o.customer_id
             WHERE o.id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             INNER JOIN customers c ON c.id = o.customer_id
             ORDER BY o.created_at ASC, o.rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(order_from_row).collect()
    }

    /// Returns `None` when no order has this id.
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<(OrderId, OrderStatus)>> {
        let row = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? RETURNING id, status",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update status of order {id}"))?;

        row.map(|r| -> Result<(OrderId, OrderStatus)> {
            Ok((
                parse_column::<OrderId>(&r, 0, "orders.id")?,
                parse_column::<OrderStatus>(&r, 1, "orders.status")?,
            ))
        })
        .transpose()
    }

    pub async fn order_status_counts(&self) -> Result<Vec<(OrderStatus, u64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) FROM orders GROUP BY status")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| -> Result<(OrderStatus, u64)> {
                Ok((
                    parse_column::<OrderStatus>(r, 0, "orders.status")?,
                    r.try_get::<i64, _>(1)?.max(0) as u64,
                ))
            })
            .collect()
    }

    /// Sum of order totals whose status is still open.
    pub async fn open_order_value_cents(&self) -> Result<i64> {
        let open: Vec<&str> = OrderStatus::ALL
            .iter()
            .filter(|status| status.is_open())
            .map(|status| status.as_str())
            .collect();
        let placeholders = vec!["?"; open.len()].join(", ");
        let sql = format!("SELECT SUM(total_cents) FROM orders WHERE status IN ({placeholders})");

        let mut query = sqlx::query_scalar::<_, Option<i64>>(&sql);
        for status in open {
            query = query.bind(status);
        }
        let total = query.fetch_one(&self.pool).await?;
        Ok(total.unwrap_or_default())
    }

    pub async fn create_quote(&self, req: &CreateQuoteRequest) -> Result<Quote> {
        let id = QuoteId::generate();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO quotes (id, customer_id, status, description, total_cents, valid_until, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(req.customer_id.to_string())
        .bind(req.status.unwrap_or(QuoteStatus::Draft).as_str())
        .bind(req.description.trim())
        .bind(req.total_cents)
        .bind(req.valid_until)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("failed to insert quote")?;

        self.quote(id)
            .await?
            .ok_or_else(|| anyhow!("quote {id} missing right after insert"))
    }

    pub async fn quote(&self, id: QuoteId) -> Result<Option<Quote>> {
        let row = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes q
             INNER JOIN customers c ON c.id = q.customer_id
             WHERE q.id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(quote_from_row).transpose()
    }

    pub async fn list_quotes(&self) -> Result<Vec<Quote>> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes q
             INNER JOIN customers c ON c.id = q.customer_id
             ORDER BY q.created_at ASC, q.rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(quote_from_row).collect()
    }

    /// Returns `None` when no quote has this id.
    pub async fn update_quote_status(
        &self,
        id: QuoteId,
        status: QuoteStatus,
    ) -> Result<Option<(QuoteId, QuoteStatus)>> {
        let row = sqlx::query(
            "UPDATE quotes SET status = ?, updated_at = ? WHERE id = ? RETURNING id, status",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update status of quote {id}"))?;

        row.map(|r| -> Result<(QuoteId, QuoteStatus)> {
            Ok((
                parse_column::<QuoteId>(&r, 0, "quotes.id")?,
                parse_column::<QuoteStatus>(&r, 1, "quotes.status")?,
            ))
        })
        .transpose()
    }

    pub async fn quote_status_counts(&self) -> Result<Vec<(QuoteStatus, u64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) FROM quotes GROUP BY status")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| -> Result<(QuoteStatus, u64)> {
                Ok((
                    parse_column::<QuoteStatus>(r, 0, "quotes.status")?,
                    r.try_get::<i64, _>(1)?.max(0) as u64,
                ))
            })
            .collect()
    }
}

fn parse_column<T>(row: &SqliteRow, index: usize, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(index)?;
    raw.parse::<T>()
        .with_context(|| format!("invalid value '{raw}' in {column}"))
}

fn customer_from_row(row: &SqliteRow) -> Result<Customer> {
    Ok(Customer {
        id: parse_column(row, 0, "customers.id")?,
        name: row.try_get(1)?,
        phone: row.try_get(2)?,
        email: row.try_get(3)?,
        created_at: row.try_get::<DateTime<Utc>, _>(4)?,
    })
}

fn order_from_row(row: &SqliteRow) -> Result<Order> {
    Ok(Order {
        id: parse_column(row, 0, "orders.id")?,
        customer_id: parse_column(row, 1, "orders.customer_id")?,
        customer_name: row.try_get(2)?,
        status: parse_column(row, 3, "orders.status")?,
        description: row.try_get(4)?,
        total_cents: row.try_get(5)?,
        delivery_date: row.try_get::<Option<NaiveDate>, _>(6)?,
        created_at: row.try_get::<DateTime<Utc>, _>(7)?,
    })
}

fn quote_from_row(row: &SqliteRow) -> Result<Quote> {
    Ok(Quote {
        id: parse_column(row, 0, "quotes.id")?,
        customer_id: parse_column(row, 1, "quotes.customer_id")?,
        customer_name: row.try_get(2)?,
        status: parse_column(row, 3, "quotes.status")?,
        description: row.try_get(4)?,
        total_cents: row.try_get(5)?,
        valid_until: row.try_get::<Option<NaiveDate>, _>(6)?,
        created_at: row.try_get::<DateTime<Utc>, _>(7)?,
    })
}

/// Turns a bare file path or `sqlite:` path into a `sqlite://` URL and
/// creates its parent directory.
pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url)?;
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> Result<String> {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Err(anyhow!("database url is empty"));
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return Ok(raw_database_url.to_string());
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url);
    Ok(format!("sqlite://{}", path.replace('\\', "/")))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
