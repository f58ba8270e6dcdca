//! Postgres-backed store implementation.
//!
//! Every contractually atomic primitive is a single SQL statement, so the
//! caller's cancellation can never commit a partial counter increment or a
//! partial status write: the statement either commits or it doesn't.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `DomainError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | DomainError | Scenario |
//! |------------|----------------------|-------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate ticket number, phone number, or customer ID |
//! | Database (other) | Any other | `StoreUnavailable` | Constraint/permission/server errors |
//! | PoolClosed / PoolTimedOut / Io | N/A | `StoreUnavailable` | Pool exhausted, connection lost |
//! | Decode / corrupt row contents | N/A | `StoreUnavailable` | Stored value no longer parses (schema drift) |
//!
//! ## Thread Safety
//!
//! `PostgresStore` is `Send + Sync` and can be shared across tasks. All
//! operations go through the SQLx connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use washline_core::{AssigneeId, DomainError, DomainResult, PhoneNumber};
use washline_customers::{Customer, CustomerStats, CustomerStatus};
use washline_orders::{
    CustomerRef, DeliveryAssignment, LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus,
    Rack,
};
use washline_sequence::CounterStore;

use super::{CustomerStore, OrderStore};

/// Postgres implementation of all three storage contracts.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the backing tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> DomainResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                key        TEXT PRIMARY KEY,
                value      BIGINT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_counters_table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                ticket_number        TEXT PRIMARY KEY,
                order_number         TEXT NOT NULL,
                customer_id          TEXT NOT NULL,
                customer_name        TEXT NOT NULL,
                customer_phone       TEXT NOT NULL,
                items                JSONB NOT NULL,
                total_amount         BIGINT NOT NULL,
                payment_method       TEXT NOT NULL,
                payment_status       TEXT NOT NULL,
                status               TEXT NOT NULL,
                rack                 TEXT NULL,
                notes                TEXT NULL,
                delivery_assignee    UUID NULL,
                delivery_assigned_at TIMESTAMPTZ NULL,
                created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at           TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_orders_table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                phone           TEXT PRIMARY KEY,
                customer_id     TEXT NOT NULL UNIQUE,
                name            TEXT NOT NULL,
                address         TEXT NULL,
                status          TEXT NOT NULL,
                order_count     BIGINT NOT NULL DEFAULT 0,
                total_spend     BIGINT NOT NULL DEFAULT 0,
                last_order_date DATE NULL,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_customers_table", e))?;

        Ok(())
    }
}

#[async_trait]
impl CounterStore for PostgresStore {
    /// Atomic increment-and-read: one upsert statement, no transaction
    /// bookkeeping, no window in which two callers can read the same value.
    #[instrument(skip(self), err)]
    async fn increment_and_get(&self, key: &str) -> DomainResult<u64> {
        let row = sqlx::query(
            r#"
            INSERT INTO counters (key, value) VALUES ($1, 1)
            ON CONFLICT (key)
            DO UPDATE SET value = counters.value + 1, updated_at = NOW()
            RETURNING value
            "#,
        )
        .bind(key)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("increment_and_get", e))?;

        let value: i64 = row
            .try_get("value")
            .map_err(|e| corrupt_row("counters.value", e))?;
        Ok(value as u64)
    }

    #[instrument(skip(self), err)]
    async fn peek(&self, key: &str) -> DomainResult<Option<u64>> {
        let row = sqlx::query("SELECT value FROM counters WHERE key = $1")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("peek", e))?;

        row.map(|r| {
            let value: i64 = r
                .try_get("value")
                .map_err(|e| corrupt_row("counters.value", e))?;
            Ok(value as u64)
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn reset(&self, key: &str, value: u64) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO counters (key, value) VALUES ($1, $2)
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value as i64)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reset", e))?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, order), fields(ticket = %order.ticket_number), err)]
    async fn create(&self, order: Order) -> DomainResult<Order> {
        let items = serde_json::to_value(&order.items)
            .map_err(|e| DomainError::store_unavailable(format!("serialize items: {e}")))?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (
                ticket_number, order_number,
                customer_id, customer_name, customer_phone,
                items, total_amount,
                payment_method, payment_status, status,
                rack, notes,
                delivery_assignee, delivery_assigned_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            RETURNING *
            "#,
        )
        .bind(&order.ticket_number)
        .bind(&order.order_number)
        .bind(&order.customer.customer_id)
        .bind(&order.customer.name)
        .bind(order.customer.phone.as_str())
        .bind(&items)
        .bind(order.total_amount as i64)
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.status.as_str())
        .bind(order.rack.map(Rack::as_str))
        .bind(&order.notes)
        .bind(order.delivery.map(|d| *d.assignee.as_uuid()))
        .bind(order.delivery.map(|d| d.assigned_at))
        .bind(order.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        OrderRow::from_row(&row)
            .map_err(|e| corrupt_row("orders", e))?
            .try_into()
    }

    #[instrument(skip(self), err)]
    async fn get(&self, ticket: &str) -> DomainResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE ticket_number = $1")
            .bind(ticket)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;

        row.map(|r| {
            OrderRow::from_row(&r)
                .map_err(|e| corrupt_row("orders", e))?
                .try_into()
        })
        .transpose()
    }

    /// Single conditional write: the row lock taken by the inner `FOR
    /// UPDATE` select serializes concurrent transitions, and the returned
    /// `previous_status` is exactly the value this write replaced.
    #[instrument(skip(self), fields(new_status = %new_status), err)]
    async fn update_status(
        &self,
        ticket: &str,
        new_status: OrderStatus,
    ) -> DomainResult<Option<(Order, OrderStatus)>> {
        let row = sqlx::query(
            r#"
            UPDATE orders o
            SET status = $2, updated_at = NOW()
            FROM (
                SELECT ticket_number, status AS previous_status
                FROM orders WHERE ticket_number = $1
                FOR UPDATE
            ) prev
            WHERE o.ticket_number = prev.ticket_number
            RETURNING o.*, prev.previous_status
            "#,
        )
        .bind(ticket)
        .bind(new_status.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_status", e))?;

        row.map(|r| {
            let previous: String = r
                .try_get("previous_status")
                .map_err(|e| corrupt_row("orders.previous_status", e))?;
            let previous = OrderStatus::parse(&previous)
                .map_err(|e| DomainError::store_unavailable(format!("stored status: {e}")))?;
            let order: Order = OrderRow::from_row(&r)
                .map_err(|e| corrupt_row("orders", e))?
                .try_into()?;
            Ok((order, previous))
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn set_rack(&self, ticket: &str, rack: Option<Rack>) -> DomainResult<Option<Order>> {
        let row = sqlx::query(
            "UPDATE orders SET rack = $2, updated_at = NOW() WHERE ticket_number = $1 RETURNING *",
        )
        .bind(ticket)
        .bind(rack.map(Rack::as_str))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_rack", e))?;

        row.map(|r| {
            OrderRow::from_row(&r)
                .map_err(|e| corrupt_row("orders", e))?
                .try_into()
        })
        .transpose()
    }

    #[instrument(skip(self, assignment), fields(assignee = %assignment.assignee), err)]
    async fn set_delivery(
        &self,
        ticket: &str,
        assignment: DeliveryAssignment,
    ) -> DomainResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET delivery_assignee = $2, delivery_assigned_at = $3, updated_at = NOW()
            WHERE ticket_number = $1
            RETURNING *
            "#,
        )
        .bind(ticket)
        .bind(*assignment.assignee.as_uuid())
        .bind(assignment.assigned_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_delivery", e))?;

        row.map(|r| {
            OrderRow::from_row(&r)
                .map_err(|e| corrupt_row("orders", e))?
                .try_into()
        })
        .transpose()
    }

    #[instrument(skip(self, notes), err)]
    async fn set_notes(&self, ticket: &str, notes: Option<String>) -> DomainResult<Option<Order>> {
        let row = sqlx::query(
            "UPDATE orders SET notes = $2, updated_at = NOW() WHERE ticket_number = $1 RETURNING *",
        )
        .bind(ticket)
        .bind(&notes)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_notes", e))?;

        row.map(|r| {
            OrderRow::from_row(&r)
                .map_err(|e| corrupt_row("orders", e))?
                .try_into()
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn set_payment_status(
        &self,
        ticket: &str,
        payment_status: PaymentStatus,
    ) -> DomainResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            UPDATE orders SET payment_status = $2, updated_at = NOW()
            WHERE ticket_number = $1
            RETURNING *
            "#,
        )
        .bind(ticket)
        .bind(payment_status.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_payment_status", e))?;

        row.map(|r| {
            OrderRow::from_row(&r)
                .map_err(|e| corrupt_row("orders", e))?
                .try_into()
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, ticket: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE ticket_number = $1")
            .bind(ticket)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CustomerStore for PostgresStore {
    #[instrument(skip(self, customer), fields(customer_id = %customer.customer_id), err)]
    async fn create(&self, customer: Customer) -> DomainResult<Customer> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (
                phone, customer_id, name, address, status,
                order_count, total_spend, last_order_date,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(customer.phone.as_str())
        .bind(&customer.customer_id)
        .bind(&customer.name)
        .bind(&customer.address)
        .bind(customer.status.as_str())
        .bind(customer.stats.order_count as i64)
        .bind(customer.stats.total_spend as i64)
        .bind(customer.stats.last_order_date)
        .bind(customer.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_customer", e))?;

        CustomerRow::from_row(&row)
            .map_err(|e| corrupt_row("customers", e))?
            .try_into()
    }

    #[instrument(skip(self, phone), fields(phone = %phone), err)]
    async fn find_by_phone(&self, phone: &PhoneNumber) -> DomainResult<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE phone = $1")
            .bind(phone.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_phone", e))?;

        row.map(|r| {
            CustomerRow::from_row(&r)
                .map_err(|e| corrupt_row("customers", e))?
                .try_into()
        })
        .transpose()
    }

    #[instrument(skip(self, phone), fields(phone = %phone), err)]
    async fn record_completed_order(
        &self,
        phone: &PhoneNumber,
        amount: u64,
        date: NaiveDate,
    ) -> DomainResult<()> {
        sqlx::query(
            r#"
            UPDATE customers
            SET order_count = order_count + 1,
                total_spend = total_spend + $2,
                last_order_date = GREATEST(COALESCE(last_order_date, $3), $3),
                updated_at = NOW()
            WHERE phone = $1
            "#,
        )
        .bind(phone.as_str())
        .bind(amount as i64)
        .bind(date)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("record_completed_order", e))?;
        Ok(())
    }
}

/// Map SQLx errors to `DomainError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.code().as_deref() == Some("23505") {
                DomainError::conflict(msg)
            } else {
                DomainError::store_unavailable(msg)
            }
        }
        other => DomainError::store_unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

fn corrupt_row(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::store_unavailable(format!("failed to read {context}: {err}"))
}

// SQLx row types

#[derive(Debug)]
struct OrderRow {
    ticket_number: String,
    order_number: String,
    customer_id: String,
    customer_name: String,
    customer_phone: String,
    items: serde_json::Value,
    total_amount: i64,
    payment_method: String,
    payment_status: String,
    status: String,
    rack: Option<String>,
    notes: Option<String>,
    delivery_assignee: Option<uuid::Uuid>,
    delivery_assigned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            ticket_number: row.try_get("ticket_number")?,
            order_number: row.try_get("order_number")?,
            customer_id: row.try_get("customer_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_phone: row.try_get("customer_phone")?,
            items: row.try_get("items")?,
            total_amount: row.try_get("total_amount")?,
            payment_method: row.try_get("payment_method")?,
            payment_status: row.try_get("payment_status")?,
            status: row.try_get("status")?,
            rack: row.try_get("rack")?,
            notes: row.try_get("notes")?,
            delivery_assignee: row.try_get("delivery_assignee")?,
            delivery_assigned_at: row.try_get("delivery_assigned_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let stored = |e| DomainError::store_unavailable(format!("stored order row: {e}"));

        let items: Vec<LineItem> = serde_json::from_value(row.items)
            .map_err(|e| DomainError::store_unavailable(format!("stored items: {e}")))?;
        let delivery = match (row.delivery_assignee, row.delivery_assigned_at) {
            (Some(assignee), Some(assigned_at)) => Some(DeliveryAssignment {
                assignee: AssigneeId::from_uuid(assignee),
                assigned_at,
            }),
            _ => None,
        };

        Ok(Order {
            ticket_number: row.ticket_number,
            order_number: row.order_number,
            customer: CustomerRef {
                customer_id: row.customer_id,
                name: row.customer_name,
                phone: PhoneNumber::parse(&row.customer_phone).map_err(stored)?,
            },
            items,
            total_amount: row.total_amount as u64,
            payment_method: PaymentMethod::parse(&row.payment_method).map_err(stored)?,
            payment_status: PaymentStatus::parse(&row.payment_status).map_err(stored)?,
            status: OrderStatus::parse(&row.status).map_err(stored)?,
            rack: row.rack.as_deref().map(Rack::parse).transpose().map_err(stored)?,
            notes: row.notes,
            delivery,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct CustomerRow {
    phone: String,
    customer_id: String,
    name: String,
    address: Option<String>,
    status: String,
    order_count: i64,
    total_spend: i64,
    last_order_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CustomerRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow {
            phone: row.try_get("phone")?,
            customer_id: row.try_get("customer_id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            status: row.try_get("status")?,
            order_count: row.try_get("order_count")?,
            total_spend: row.try_get("total_spend")?,
            last_order_date: row.try_get("last_order_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DomainError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let stored = |e| DomainError::store_unavailable(format!("stored customer row: {e}"));

        Ok(Customer {
            customer_id: row.customer_id,
            name: row.name,
            phone: PhoneNumber::parse(&row.phone).map_err(stored)?,
            address: row.address,
            status: CustomerStatus::parse(&row.status).map_err(stored)?,
            stats: CustomerStats {
                order_count: row.order_count as u64,
                total_spend: row.total_spend as u64,
                last_order_date: row.last_order_date,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
