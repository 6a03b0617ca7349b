use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::Result;
use crate::money::Money;
use crate::store::{self, Store};
use crate::types::{self, OrderStatus};
use crate::user::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub product: String,
    pub quantity: i64,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: i64,
    #[serde(serialize_with = "types::serialize_timestamp")]
    pub date: DateTime<Utc>,
    pub total_amount: Money,
    pub gst: Money,
    pub grand_total: Money,
    pub status: OrderStatus,
    /// Buyer's username; only disclosed to administrators.
    pub customer: Option<String>,
    pub items: Vec<OrderLine>,
}

/// Which orders to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    User(i64),
}

impl Order {
    /// Orders newest first, with their items and the buyer's username.
    pub fn list(store: &Store, scope: OrderScope) -> Result<Vec<Order>> {
        let mut sql = String::from(
            "SELECT o.id, o.created_at, o.subtotal_cents, o.tax_cents, o.grand_total_cents,
                    o.status, u.username
             FROM orders o
             JOIN users u ON u.id = o.user_id",
        );
        let mut args: Vec<Value> = Vec::new();
        if let OrderScope::User(user_id) = scope {
            sql.push_str(" WHERE o.user_id = ?1");
            args.push(Value::Integer(user_id));
        }
        sql.push_str(" ORDER BY o.created_at DESC, o.id DESC");

        let mut stmt = store.conn().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok((
                Order {
                    id: row.get(0)?,
                    date: store::timestamp_column(row, 1)?,
                    total_amount: Money::from_cents(row.get(2)?),
                    gst: Money::from_cents(row.get(3)?),
                    grand_total: Money::from_cents(row.get(4)?),
                    status: OrderStatus::Pending,
                    customer: row.get(6)?,
                    items: Vec::new(),
                },
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut orders = Vec::new();
        for row in rows {
            let (mut order, status) = row?;
            order.status = OrderStatus::from_str(&status)?;
            orders.push(order);
        }

        let mut items = Self::items(store, scope)?;
        for order in &mut orders {
            order.items = items.remove(&order.id).unwrap_or_default();
        }
        Ok(orders)
    }

    /// Order history as `viewer` may see it: administrators get every order
    /// with customer names, everyone else only their own.
    pub fn list_for(store: &Store, viewer: &User) -> Result<Vec<Order>> {
        if viewer.is_admin {
            return Self::list(store, OrderScope::All);
        }
        let mut orders = Self::list(store, OrderScope::User(viewer.id))?;
        for order in &mut orders {
            order.customer = None;
        }
        Ok(orders)
    }

    fn items(store: &Store, scope: OrderScope) -> Result<HashMap<i64, Vec<OrderLine>>> {
        let mut sql = String::from(
            "SELECT i.order_id, p.name, i.quantity, i.price_cents
             FROM order_items i
             JOIN products p ON p.id = i.product_id
             JOIN orders o ON o.id = i.order_id",
        );
        let mut args: Vec<Value> = Vec::new();
        if let OrderScope::User(user_id) = scope {
            sql.push_str(" WHERE o.user_id = ?1");
            args.push(Value::Integer(user_id));
        }
        sql.push_str(" ORDER BY i.id");

        let mut stmt = store.conn().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                OrderLine {
                    product: row.get(1)?,
                    quantity: row.get(2)?,
                    price: Money::from_cents(row.get(3)?),
                },
            ))
        })?;

        let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let (order_id, line) = row?;
            by_order.entry(order_id).or_default().push(line);
        }
        Ok(by_order)
    }
}
