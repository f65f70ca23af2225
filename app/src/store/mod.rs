// app/src/store/mod.rs

//! SQLite-backed order store and verified-order ledger.
//!
//! The store is the only shared mutable state in the service. Status flips and
//! ledger inserts happen inside one transaction, and the unique index on
//! `verified_orders.invoice` is the last line against duplicate deliveries.

pub mod error;
mod rows;

pub use error::{StoreError, StoreResult};

use crate::models::{LineItem, NewOrder, Order, OrderStatus, VerifiedOrder};
use chrono::Utc;
use error::is_unique_violation;
use futures_util::TryStreamExt;
use rows::{into_items, LineItemRow, OrderRow, VerifiedOrderRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const ORDER_COLUMNS: &str = "id, invoice, currency, email, user_id, username, salt, digest, total_minor, status, created_at, updated_at";

/// Result of trying to record a verification.
#[derive(Debug, Clone)]
pub enum LedgerWrite {
  Recorded(VerifiedOrder),
  /// Another delivery already flipped the order or wrote its ledger entry.
  AlreadyVerified,
}

#[derive(Clone, Debug)]
pub struct OrderStore {
  pool: SqlitePool,
}

impl OrderStore {
  /// Opens (creating if needed) the database at `database_url` and runs migrations.
  pub async fn connect(database_url: &str) -> StoreResult<Self> {
    let opts = SqliteConnectOptions::from_str(database_url)?
      .create_if_missing(true)
      .foreign_keys(true)
      .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
      // One writer; SQLite serializes writes anyway and this avoids "database is locked".
      .max_connections(1)
      .connect_with(opts)
      .await?;

    let store = Self { pool };
    store.migrate().await?;
    info!(database_url, "Order store ready.");
    Ok(store)
  }

  /// Fresh private in-memory database, migrated.
  pub async fn in_memory() -> StoreResult<Self> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    // The database lives as long as its single connection, so never recycle it.
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect_with(opts)
      .await?;
    let store = Self { pool };
    store.migrate().await?;
    Ok(store)
  }

  pub async fn migrate(&self) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    Ok(())
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  pub async fn ping(&self) -> StoreResult<()> {
    sqlx::query("SELECT 1").execute(&self.pool).await?;
    Ok(())
  }

  pub async fn close(&self) {
    self.pool.close().await;
  }

  /// Persists a pending order and its line items atomically.
  ///
  /// Fails with [`StoreError::DuplicateInvoice`] when a non-failed order
  /// already uses the invoice.
  #[instrument(name = "OrderStore::insert_order", skip(self, new_order), fields(invoice = %new_order.invoice))]
  pub async fn insert_order(&self, new_order: &NewOrder) -> StoreResult<Order> {
    let now = Utc::now();
    let mut tx = self.pool.begin().await?;

    let inserted = sqlx::query(
      "INSERT INTO orders (invoice, currency, email, user_id, username, salt, digest, total_minor, status, created_at, updated_at) \
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&new_order.invoice)
    .bind(&new_order.currency)
    .bind(&new_order.email)
    .bind(new_order.user_id)
    .bind(&new_order.username)
    .bind(&new_order.salt)
    .bind(&new_order.digest)
    .bind(new_order.total.minor())
    .bind(OrderStatus::Pending.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await;

    let order_id = match inserted {
      Ok(done) => done.last_insert_rowid(),
      Err(e) if is_unique_violation(&e) => {
        warn!(invoice = %new_order.invoice, "Rejected duplicate invoice.");
        return Err(StoreError::DuplicateInvoice(new_order.invoice.clone()));
      }
      Err(e) => return Err(e.into()),
    };

    insert_line_items(&mut tx, "order_line_items", "order_id", order_id, &new_order.items).await?;
    tx.commit().await?;

    debug!(order_id, "Order persisted as pending.");
    Ok(Order {
      id: order_id,
      invoice: new_order.invoice.clone(),
      currency: new_order.currency.clone(),
      email: new_order.email.clone(),
      user_id: new_order.user_id,
      username: new_order.username.clone(),
      salt: new_order.salt.clone(),
      digest: new_order.digest.clone(),
      total: new_order.total,
      status: OrderStatus::Pending,
      items: new_order.items.clone(),
      created_at: now,
      updated_at: now,
    })
  }

  /// The live order for an invoice: a non-failed one if any, newest first.
  pub async fn find_by_invoice(&self, invoice: &str) -> StoreResult<Option<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE invoice = ? ORDER BY (status = 'failed'), id DESC LIMIT 1",
      ORDER_COLUMNS
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(invoice)
      .fetch_optional(&self.pool)
      .await?;
    match row {
      Some(row) => Ok(Some(self.hydrate(row).await?)),
      None => Ok(None),
    }
  }

  pub async fn find_by_id(&self, order_id: i64) -> StoreResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    match row {
      Some(row) => Ok(Some(self.hydrate(row).await?)),
      None => Ok(None),
    }
  }

  /// All orders, newest first.
  pub async fn list_orders(&self) -> StoreResult<Vec<Order>> {
    let sql = format!("SELECT {} FROM orders ORDER BY id DESC", ORDER_COLUMNS);
    let rows: Vec<OrderRow> = sqlx::query_as(&sql).fetch(&self.pool).try_collect().await?;
    self.hydrate_all(rows).await
  }

  /// The `limit` most recent orders placed with `email`.
  pub async fn recent_orders_by_email(&self, email: &str, limit: i64) -> StoreResult<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE email = ? ORDER BY id DESC LIMIT ?",
      ORDER_COLUMNS
    );
    let rows: Vec<OrderRow> = sqlx::query_as(&sql)
      .bind(email)
      .bind(limit)
      .fetch(&self.pool)
      .try_collect()
      .await?;
    self.hydrate_all(rows).await
  }

  /// Flips `order` from pending to approved and appends its ledger snapshot,
  /// both or neither.
  ///
  /// A concurrent or repeated delivery shows up either as the guarded update
  /// touching no rows or as a unique violation on the ledger; both are
  /// reported as [`LedgerWrite::AlreadyVerified`].
  #[instrument(name = "OrderStore::record_verification", skip(self, order), fields(order_id = order.id, invoice = %order.invoice))]
  pub async fn record_verification(&self, order: &Order) -> StoreResult<LedgerWrite> {
    let now = Utc::now();
    let mut tx = self.pool.begin().await?;

    let flipped = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
      .bind(OrderStatus::Approved.as_str())
      .bind(now)
      .bind(order.id)
      .bind(OrderStatus::Pending.as_str())
      .execute(&mut *tx)
      .await?;
    if flipped.rows_affected() == 0 {
      tx.rollback().await?;
      debug!("Order no longer pending; nothing to record.");
      return Ok(LedgerWrite::AlreadyVerified);
    }

    let inserted = sqlx::query(
      "INSERT INTO verified_orders (order_id, invoice, user_id, username, email, total_minor, currency, status, verified_at) \
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(&order.invoice)
    .bind(order.user_id)
    .bind(&order.username)
    .bind(&order.email)
    .bind(order.total.minor())
    .bind(&order.currency)
    .bind(OrderStatus::Approved.as_str())
    .bind(now)
    .execute(&mut *tx)
    .await;

    let verified_id = match inserted {
      Ok(done) => done.last_insert_rowid(),
      Err(e) if is_unique_violation(&e) => {
        tx.rollback().await?;
        debug!("Ledger already holds this invoice.");
        return Ok(LedgerWrite::AlreadyVerified);
      }
      Err(e) => return Err(e.into()),
    };

    insert_line_items(&mut tx, "verified_order_line_items", "verified_order_id", verified_id, &order.items).await?;
    tx.commit().await?;

    Ok(LedgerWrite::Recorded(VerifiedOrder {
      id: verified_id,
      order_id: order.id,
      invoice: order.invoice.clone(),
      user_id: order.user_id,
      username: order.username.clone(),
      email: order.email.clone(),
      total: order.total,
      currency: order.currency.clone(),
      status: OrderStatus::Approved,
      items: order.items.clone(),
      verified_at: now,
    }))
  }

  pub async fn find_verified(&self, invoice: &str) -> StoreResult<Option<VerifiedOrder>> {
    let row = sqlx::query_as::<_, VerifiedOrderRow>(
      "SELECT id, order_id, invoice, user_id, username, email, total_minor, currency, status, verified_at \
       FROM verified_orders WHERE invoice = ?",
    )
    .bind(invoice)
    .fetch_optional(&self.pool)
    .await?;

    let Some(row) = row else { return Ok(None) };
    let items = sqlx::query_as::<_, LineItemRow>(
      "SELECT product_id, quantity, price_minor FROM verified_order_line_items \
       WHERE verified_order_id = ? ORDER BY position",
    )
    .bind(row.id)
    .fetch_all(&self.pool)
    .await?;
    Ok(Some(row.into_verified(into_items(items)?)?))
  }

  pub async fn count_verified(&self, invoice: &str) -> StoreResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verified_orders WHERE invoice = ?")
      .bind(invoice)
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn hydrate(&self, row: OrderRow) -> StoreResult<Order> {
    let items = sqlx::query_as::<_, LineItemRow>(
      "SELECT product_id, quantity, price_minor FROM order_line_items WHERE order_id = ? ORDER BY position",
    )
    .bind(row.id)
    .fetch_all(&self.pool)
    .await?;
    row.into_order(into_items(items)?)
  }

  async fn hydrate_all(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
      orders.push(self.hydrate(row).await?);
    }
    Ok(orders)
  }
}

async fn insert_line_items(
  tx: &mut Transaction<'_, Sqlite>,
  table: &str,
  owner_column: &str,
  owner_id: i64,
  items: &[LineItem],
) -> StoreResult<()> {
  let sql = format!(
    "INSERT INTO {} ({}, position, product_id, quantity, price_minor) VALUES (?, ?, ?, ?, ?)",
    table, owner_column
  );
  for (position, item) in items.iter().enumerate() {
    sqlx::query(&sql)
      .bind(owner_id)
      .bind(position as i64)
      .bind(item.product_id)
      .bind(i64::from(item.quantity))
      .bind(item.unit_price.minor())
      .execute(&mut **tx)
      .await?;
  }
  Ok(())
}
