use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Product;
use crate::error::{Result, ShopError};
use crate::money::{Money, TaxRate};
use crate::store::Store;

/// A shopping cart: product id -> quantity. Lives in the caller's session,
/// never in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: BTreeMap<i64, i64>,
}

/// One priced cart line as shown to the shopper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub total: Money,
    pub image_url: Option<String>,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Money,
    pub gst: Money,
    pub grand_total: Money,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products in the cart.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.lines.get(&product_id).copied().unwrap_or(0)
    }

    /// Lines in product id order.
    pub fn lines(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.lines.iter().map(|(id, qty)| (*id, *qty))
    }

    /// Add `quantity` units of a product. The combined quantity in the cart
    /// may not exceed current stock. Returns the number of distinct lines.
    pub fn add(&mut self, store: &Store, product_id: i64, quantity: i64) -> Result<usize> {
        if quantity < 1 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        let product = match Product::find(store, product_id)? {
            Some(p) if p.is_active => p,
            _ => return Err(ShopError::ProductNotFound(product_id)),
        };
        let wanted = self.quantity_of(product_id).saturating_add(quantity);
        if product.stock < wanted {
            return Err(ShopError::InsufficientStock);
        }
        self.lines.insert(product_id, wanted);
        Ok(self.len())
    }

    /// Set a line's quantity. Zero or less removes the line.
    pub fn update(&mut self, store: &Store, product_id: i64, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            self.lines.remove(&product_id);
            return Ok(());
        }
        match Product::find(store, product_id)? {
            Some(p) if p.stock >= quantity => {
                self.lines.insert(product_id, quantity);
                Ok(())
            }
            _ => Err(ShopError::InsufficientStock),
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Merge another cart's lines into this one, summing quantities. No
    /// stock check: both carts were already validated when filled.
    pub fn absorb(&mut self, other: Cart) {
        for (product_id, quantity) in other.lines {
            let line = self.lines.entry(product_id).or_insert(0);
            *line = line.saturating_add(quantity);
        }
    }

    /// Price the cart against the current catalog. Lines whose product has
    /// been removed or deactivated are left out.
    pub fn view(&self, store: &Store, rate: TaxRate) -> Result<CartView> {
        let mut items = Vec::with_capacity(self.lines.len());
        for (product_id, quantity) in self.lines() {
            let Some(product) = Product::find(store, product_id)? else {
                continue;
            };
            if !product.is_active {
                continue;
            }
            items.push(CartLine {
                product_id,
                total: product.price.times(quantity),
                name: product.name,
                price: product.price,
                quantity,
                image_url: product.image_url,
                stock: product.stock,
            });
        }
        let total: Money = items.iter().map(|line| line.total).sum();
        let gst = total.tax(rate);
        Ok(CartView {
            items,
            total,
            gst,
            grand_total: total + gst,
        })
    }
}
