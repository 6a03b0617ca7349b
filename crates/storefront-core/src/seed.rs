//! Bootstrap data: the admin account, default categories and a handful of
//! sample products. Every step is skipped when its data already exists.

use crate::catalog::{Category, NewProduct, Product};
use crate::config::AdminConfig;
use crate::error::Result;
use crate::money::Money;
use crate::store::Store;
use crate::user::User;

const CATEGORIES: &[(&str, &str)] = &[
    ("Electronics", "Electronic devices and gadgets"),
    ("Appliances", "Home appliances"),
    ("Kitchen", "Kitchen and cooking equipment"),
    ("Gaming", "Gaming consoles and accessories"),
];

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    stock: i64,
    image_url: &'static str,
    category: &'static str,
}

const PRODUCTS: &[SampleProduct] = &[
    SampleProduct {
        name: "Smart TV 55\"",
        description: "4K Ultra HD Smart TV with HDR",
        price: 45_000,
        stock: 15,
        image_url: "https://images.unsplash.com/photo-1567690187548-f07b1d7bf5a9?w=600&auto=format&fit=crop&q=60",
        category: "Electronics",
    },
    SampleProduct {
        name: "Refrigerator",
        description: "Double door refrigerator with frost-free technology",
        price: 25_000,
        stock: 10,
        image_url: "https://images.unsplash.com/photo-1649518755041-651c29b56309?q=80&w=687&auto=format&fit=crop",
        category: "Appliances",
    },
    SampleProduct {
        name: "Electric Cooker",
        description: "5L electric pressure cooker with multiple cooking modes",
        price: 3_500,
        stock: 25,
        image_url: "https://images.unsplash.com/photo-1544233726-9f1d2b27be8b?w=600&auto=format&fit=crop&q=60",
        category: "Kitchen",
    },
    SampleProduct {
        name: "Gaming Console",
        description: "Next-gen gaming console with wireless controller",
        price: 35_000,
        stock: 8,
        image_url: "https://images.unsplash.com/photo-1486401899868-0e435ed85128?w=600&auto=format&fit=crop&q=60",
        category: "Electronics",
    },
    SampleProduct {
        name: "Washing Machine",
        description: "Front load washing machine with 8kg capacity",
        price: 22_000,
        stock: 12,
        image_url: "https://media.istockphoto.com/id/1137138120/photo/photo-of-white-washing-machine-with-soft-and-fresh-bright-towels-on-top-standing-isolated.webp?s=612x612&w=0&k=20",
        category: "Appliances",
    },
];

/// What a seeding pass created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SeedReport {
    pub admin_created: bool,
    pub categories: usize,
    pub products: usize,
}

/// Create the bootstrap admin. Sample catalog data is added only when
/// `with_samples` is set and the respective table is empty.
pub fn seed_defaults(store: &Store, admin: &AdminConfig, with_samples: bool) -> Result<SeedReport> {
    let mut report = SeedReport {
        admin_created: User::ensure_admin(store, &admin.username, &admin.email, &admin.password)?
            .is_some(),
        ..SeedReport::default()
    };
    if !with_samples {
        return Ok(report);
    }

    if store.count("categories")? == 0 {
        for &(name, description) in CATEGORIES {
            Category::create(store, name, Some(description))?;
            report.categories += 1;
        }
    }

    if store.count("products")? == 0 {
        for sample in PRODUCTS {
            let category_id = Category::find_by_name(store, sample.category)?.map(|c| c.id);
            Product::create(
                store,
                NewProduct {
                    name: Some(sample.name.to_string()),
                    description: Some(sample.description.to_string()),
                    price: Some(Money::from_cents(sample.price * 100)),
                    stock: Some(sample.stock),
                    image_url: Some(sample.image_url.to_string()),
                    category_id,
                },
            )?;
            report.products += 1;
        }
    }

    tracing::info!(
        admin_created = report.admin_created,
        categories = report.categories,
        products = report.products,
        "seeded store"
    );
    Ok(report)
}
