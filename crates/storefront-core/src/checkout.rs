//! Cart-to-order checkout.
//!
//! Stock validation, order insertion, item insertion and stock decrement all
//! happen inside one IMMEDIATE transaction: either the whole order is written
//! or nothing is. The caller's cart is only read; clearing it after a
//! successful checkout is the caller's job.

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use crate::cart::Cart;
use crate::error::{Result, ShopError};
use crate::money::{Money, TaxRate};
use crate::store::{self, Store};
use crate::types::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillLine {
    pub name: String,
    pub quantity: i64,
    pub price: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bill {
    pub items: Vec<BillLine>,
    pub subtotal: Money,
    pub gst: Money,
    pub grand_total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub order_id: i64,
    pub bill: Bill,
}

struct StockRow {
    name: String,
    price: Money,
    stock: i64,
    is_active: bool,
}

pub fn checkout(store: &mut Store, user_id: i64, cart: &Cart, rate: TaxRate) -> Result<Receipt> {
    if cart.is_empty() {
        return Err(ShopError::EmptyCart);
    }

    let tx = store
        .conn_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut lines = Vec::with_capacity(cart.len());
    for (product_id, quantity) in cart.lines() {
        let row = tx
            .query_row(
                "SELECT name, price_cents, stock, is_active FROM products WHERE id = ?1",
                [product_id],
                |row| {
                    Ok(StockRow {
                        name: row.get(0)?,
                        price: Money::from_cents(row.get(1)?),
                        stock: row.get(2)?,
                        is_active: row.get(3)?,
                    })
                },
            )
            .optional()?;
        let Some(row) = row else {
            return Err(ShopError::InsufficientStockFor("Unknown".into()));
        };
        if !row.is_active {
            return Err(ShopError::ProductUnavailable(row.name));
        }
        if row.stock < quantity {
            return Err(ShopError::InsufficientStockFor(row.name));
        }
        lines.push((product_id, row.name, quantity, row.price));
    }

    let subtotal: Money = lines.iter().map(|(_, _, qty, price)| price.times(*qty)).sum();
    let gst = subtotal.tax(rate);
    let grand_total = subtotal + gst;

    tx.execute(
        "INSERT INTO orders (user_id, created_at, subtotal_cents, tax_cents, grand_total_cents, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            store::now(),
            subtotal.cents(),
            gst.cents(),
            grand_total.cents(),
            OrderStatus::Completed.as_str(),
        ],
    )?;
    let order_id = tx.last_insert_rowid();

    for (product_id, name, quantity, price) in &lines {
        tx.execute(
            "INSERT INTO order_items (order_id, product_id, quantity, price_cents)
             VALUES (?1, ?2, ?3, ?4)",
            params![order_id, product_id, quantity, price.cents()],
        )?;
        let updated = tx.execute(
            "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
            params![quantity, product_id],
        )?;
        if updated != 1 {
            return Err(ShopError::InsufficientStockFor(name.clone()));
        }
    }

    tx.commit()?;
    tracing::info!(
        order_id,
        user_id,
        lines = lines.len(),
        grand_total = %grand_total,
        "order placed"
    );

    Ok(Receipt {
        order_id,
        bill: Bill {
            items: lines
                .into_iter()
                .map(|(_, name, quantity, price)| BillLine {
                    name,
                    quantity,
                    price,
                    total: price.times(quantity),
                })
                .collect(),
            subtotal,
            gst,
            grand_total,
        },
    })
}
