use anyhow::bail;
use clap::Subcommand;
use std::path::Path;
use storefront_core::order::{Order, OrderScope};
use storefront_core::types::format_timestamp;
use storefront_core::user::User;

use crate::output::{print_json, print_table};

#[derive(Subcommand)]
pub enum OrderSubcommand {
    /// List orders, newest first
    List {
        /// Only orders placed by this username
        #[arg(long)]
        user: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: OrderSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        OrderSubcommand::List { user } => list(root, user.as_deref(), json),
    }
}

fn list(root: &Path, username: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    let scope = match username {
        Some(name) => match User::find_by_username(&store, name)? {
            Some(user) => OrderScope::User(user.id),
            None => bail!("user '{name}' not found"),
        },
        None => OrderScope::All,
    };
    let orders = Order::list(&store, scope)?;

    if json {
        return print_json(&orders);
    }

    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|o| {
            let units: i64 = o.items.iter().map(|i| i.quantity).sum();
            vec![
                o.id.to_string(),
                format_timestamp(o.date),
                o.customer.clone().unwrap_or_default(),
                units.to_string(),
                o.total_amount.to_string(),
                o.gst.to_string(),
                o.grand_total.to_string(),
                o.status.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "DATE", "CUSTOMER", "UNITS", "SUBTOTAL", "GST", "TOTAL", "STATUS"],
        &rows,
        "No orders.",
    );
    Ok(())
}
