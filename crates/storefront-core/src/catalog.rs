use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ShopError};
use crate::money::Money;
use crate::store::{self, Store};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn list(store: &Store) -> Result<Vec<Category>> {
        let mut stmt = store
            .conn()
            .prepare("SELECT id, name, description FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn create(store: &Store, name: &str, description: Option<&str>) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ShopError::MissingFields);
        }
        store.conn().execute(
            "INSERT INTO categories (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        Ok(store.conn().last_insert_rowid())
    }

    pub fn find_by_name(store: &Store, name: &str) -> Result<Option<Category>> {
        Ok(store
            .conn()
            .query_row(
                "SELECT id, name, description FROM categories WHERE name = ?1 ORDER BY id LIMIT 1",
                [name],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    fn ensure_exists(store: &Store, id: i64) -> Result<()> {
        if store.exists("SELECT 1 FROM categories WHERE id = ?1", id)? {
            Ok(())
        } else {
            Err(ShopError::CategoryNotFound(id))
        }
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i64,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    /// Name of the category, resolved at query time.
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "
    SELECT p.id, p.name, p.description, p.price_cents, p.stock, p.image_url,
           p.category_id, c.name, p.is_active, p.created_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: Money::from_cents(row.get(3)?),
        stock: row.get(4)?,
        image_url: row.get(5)?,
        category_id: row.get(6)?,
        category: row.get(7)?,
        is_active: row.get(8)?,
        created_at: store::timestamp_column(row, 9)?,
    })
}

/// Product listing filter. Query strings are decoded leniently: a blank or
/// non-numeric `category_id` and a blank `search` mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default, deserialize_with = "lenient_id")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "non_blank")]
    pub search: Option<String>,
    /// Admin listings include deactivated products. Never read from a query.
    #[serde(skip)]
    pub include_inactive: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdParam {
    Id(i64),
    Text(String),
}

fn lenient_id<'de, D>(de: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IdParam>::deserialize(de)? {
        Some(IdParam::Id(id)) => Some(id),
        Some(IdParam::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

fn non_blank<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(de)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Public shape of a product: no activation flag, raw category id or
/// creation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductListing {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i64,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl From<Product> for ProductListing {
    fn from(p: Product) -> Self {
        ProductListing {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            image_url: p.image_url,
            category: p.category,
        }
    }
}

/// Admin shape: the public listing plus `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminProduct {
    #[serde(flatten)]
    pub product: ProductListing,
    pub is_active: bool,
}

impl From<Product> for AdminProduct {
    fn from(p: Product) -> Self {
        let is_active = p.is_active;
        AdminProduct {
            product: p.into(),
            is_active,
        }
    }
}

/// Fields accepted when creating a product. `name`, `price` and `stock` are
/// required; they are optional here so a missing field surfaces as
/// [`ShopError::MissingFields`] rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Partial update. For nullable columns, an explicit `null` clears the value
/// while an absent key leaves it unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn double_option<'de, T, D>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn validate_stock(stock: i64) -> Result<()> {
    if stock < 0 {
        return Err(ShopError::InvalidInput {
            field: "stock",
            reason: format!("{stock} is negative"),
        });
    }
    Ok(())
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl Product {
    /// Products narrowed by category and a case-insensitive name search.
    /// Only active products unless `include_inactive` is set.
    pub fn list(store: &Store, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut sql = format!("{PRODUCT_COLUMNS} WHERE 1 = 1");
        let mut args: Vec<Value> = Vec::new();

        if !filter.include_inactive {
            sql.push_str(" AND p.is_active = 1");
        }
        if let Some(category_id) = filter.category_id {
            args.push(Value::Integer(category_id));
            sql.push_str(&format!(" AND p.category_id = ?{}", args.len()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                args.push(Value::Text(format!("%{}%", escape_like(&search.to_lowercase()))));
                sql.push_str(&format!(
                    " AND lower(p.name) LIKE ?{} ESCAPE '\\'",
                    args.len()
                ));
            }
        }
        sql.push_str(" ORDER BY p.id");

        let mut stmt = store.conn().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), product_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every product, including deactivated ones.
    pub fn list_all(store: &Store) -> Result<Vec<Product>> {
        Self::list(
            store,
            &ProductFilter {
                include_inactive: true,
                ..ProductFilter::default()
            },
        )
    }

    pub fn find(store: &Store, id: i64) -> Result<Option<Product>> {
        Ok(store
            .conn()
            .query_row(
                &format!("{PRODUCT_COLUMNS} WHERE p.id = ?1"),
                [id],
                product_from_row,
            )
            .optional()?)
    }

    pub fn get(store: &Store, id: i64) -> Result<Product> {
        Self::find(store, id)?.ok_or(ShopError::ProductNotFound(id))
    }

    pub fn create(store: &Store, new: NewProduct) -> Result<i64> {
        let name = new
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let (Some(name), Some(price), Some(stock)) = (name, new.price, new.stock) else {
            return Err(ShopError::MissingFields);
        };
        validate_stock(stock)?;
        if let Some(category_id) = new.category_id {
            Category::ensure_exists(store, category_id)?;
        }

        store.conn().execute(
            "INSERT INTO products
                 (name, description, price_cents, stock, image_url, category_id, created_at, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
            params![
                name,
                new.description.unwrap_or_default(),
                price.cents(),
                stock,
                new.image_url,
                new.category_id,
                store::now(),
            ],
        )?;
        let id = store.conn().last_insert_rowid();
        tracing::info!(product_id = id, %name, "product created");
        Ok(id)
    }

    pub fn update(store: &Store, id: i64, patch: ProductPatch) -> Result<Product> {
        let mut product = Self::get(store, id)?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ShopError::InvalidInput {
                    field: "name",
                    reason: "must not be empty".into(),
                });
            }
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
            product.stock = stock;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = image_url;
        }
        if let Some(category_id) = patch.category_id {
            if let Some(cid) = category_id {
                Category::ensure_exists(store, cid)?;
            }
            product.category_id = category_id;
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }

        store.conn().execute(
            "UPDATE products
             SET name = ?1, description = ?2, price_cents = ?3, stock = ?4,
                 image_url = ?5, category_id = ?6, is_active = ?7
             WHERE id = ?8",
            params![
                product.name,
                product.description,
                product.price.cents(),
                product.stock,
                product.image_url,
                product.category_id,
                product.is_active,
                id,
            ],
        )?;
        tracing::info!(product_id = id, "product updated");
        Self::get(store, id)
    }

    /// Remove a product. Products referenced by past orders are kept so order
    /// history keeps resolving; deactivate those instead.
    pub fn delete(store: &Store, id: i64) -> Result<()> {
        Self::get(store, id)?;
        if store.exists("SELECT 1 FROM order_items WHERE product_id = ?1 LIMIT 1", id)? {
            return Err(ShopError::ProductInUse(id));
        }
        store
            .conn()
            .execute("DELETE FROM products WHERE id = ?1", [id])?;
        tracing::info!(product_id = id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, price: i64, stock: i64, category_id: Option<i64>) -> NewProduct {
        NewProduct {
            name: Some(name.to_string()),
            description: Some(format!("{name} description")),
            price: Some(Money::from_cents(price)),
            stock: Some(stock),
            image_url: None,
            category_id,
        }
    }

    fn fixture() -> (Store, i64, i64) {
        let store = Store::open_in_memory().unwrap();
        let electronics = Category::create(&store, "Electronics", Some("Gadgets")).unwrap();
        let kitchen = Category::create(&store, "Kitchen", None).unwrap();
        Product::create(&store, new_product("Smart TV", 4_500_000, 15, Some(electronics))).unwrap();
        Product::create(&store, new_product("Electric Cooker", 350_000, 25, Some(kitchen))).unwrap();
        Product::create(&store, new_product("TV Stand", 500_000, 3, None)).unwrap();
        (store, electronics, kitchen)
    }

    #[test]
    fn list_categories_in_id_order() {
        let (store, electronics, kitchen) = fixture();
        let cats = Category::list(&store).unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].id, electronics);
        assert_eq!(cats[0].description.as_deref(), Some("Gadgets"));
        assert_eq!(cats[1].id, kitchen);
        assert!(cats[1].description.is_none());
    }

    #[test]
    fn list_filters_by_category() {
        let (store, _, kitchen) = fixture();
        let filter = ProductFilter {
            category_id: Some(kitchen),
            ..ProductFilter::default()
        };
        let products = Product::list(&store, &filter).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Electric Cooker");
        assert_eq!(products[0].category.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let (store, _, _) = fixture();
        let filter = ProductFilter {
            search: Some("tv".into()),
            ..ProductFilter::default()
        };
        let names: Vec<_> = Product::list(&store, &filter)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Smart TV", "TV Stand"]);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let (store, _, _) = fixture();
        let filter = ProductFilter {
            search: Some("%".into()),
            ..ProductFilter::default()
        };
        assert!(Product::list(&store, &filter).unwrap().is_empty());
    }

    #[test]
    fn inactive_products_are_hidden_from_listing_but_not_admin() {
        let (store, _, _) = fixture();
        let patch = ProductPatch {
            is_active: Some(false),
            ..ProductPatch::default()
        };
        Product::update(&store, 1, patch).unwrap();

        let listed = Product::list(&store, &ProductFilter::default()).unwrap();
        assert!(listed.iter().all(|p| p.id != 1));
        let all = Product::list_all(&store).unwrap();
        assert_eq!(all.len(), 3);
        assert!(!all[0].is_active);
    }

    #[test]
    fn include_inactive_still_applies_search_and_category() {
        let (store, electronics, _) = fixture();
        let patch = ProductPatch {
            is_active: Some(false),
            ..ProductPatch::default()
        };
        Product::update(&store, 1, patch).unwrap();

        let filter = ProductFilter {
            search: Some("tv".into()),
            include_inactive: true,
            ..ProductFilter::default()
        };
        let names: Vec<_> = Product::list(&store, &filter)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Smart TV", "TV Stand"]);

        let filter = ProductFilter {
            category_id: Some(electronics),
            include_inactive: true,
            ..ProductFilter::default()
        };
        let found = Product::list(&store, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert!(!found[0].is_active);
    }

    #[test]
    fn filter_decodes_blank_and_garbage_params_as_absent() {
        let filter: ProductFilter =
            serde_json::from_value(serde_json::json!({"category_id": "", "search": "  "})).unwrap();
        assert_eq!(filter.category_id, None);
        assert_eq!(filter.search, None);

        let filter: ProductFilter =
            serde_json::from_value(serde_json::json!({"category_id": "abc"})).unwrap();
        assert_eq!(filter.category_id, None);

        let filter: ProductFilter =
            serde_json::from_value(serde_json::json!({"category_id": " 2 ", "search": "tv"})).unwrap();
        assert_eq!(filter.category_id, Some(2));
        assert_eq!(filter.search.as_deref(), Some("tv"));

        let filter: ProductFilter =
            serde_json::from_value(serde_json::json!({"category_id": 7, "include_inactive": true}))
                .unwrap();
        assert_eq!(filter.category_id, Some(7));
        assert!(!filter.include_inactive);
    }

    #[test]
    fn listing_views_hide_internal_columns() {
        let (store, _, _) = fixture();
        let product = Product::get(&store, 1).unwrap();

        let public = serde_json::to_value(ProductListing::from(product.clone())).unwrap();
        let mut keys: Vec<_> = public.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["category", "description", "id", "image_url", "name", "price", "stock"]
        );

        let admin = serde_json::to_value(AdminProduct::from(product)).unwrap();
        assert_eq!(admin["is_active"], true);
        assert_eq!(admin["name"], "Smart TV");
        assert!(admin.get("created_at").is_none());
        assert!(admin.get("category_id").is_none());
    }

    #[test]
    fn create_requires_name_price_and_stock() {
        let store = Store::open_in_memory().unwrap();
        let missing_price = NewProduct {
            name: Some("Kettle".into()),
            stock: Some(1),
            ..NewProduct::default()
        };
        assert!(matches!(
            Product::create(&store, missing_price),
            Err(ShopError::MissingFields)
        ));
        let blank_name = new_product("   ", 100, 1, None);
        assert!(matches!(
            Product::create(&store, blank_name),
            Err(ShopError::MissingFields)
        ));
    }

    #[test]
    fn create_rejects_unknown_category_and_negative_stock() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            Product::create(&store, new_product("Kettle", 100, 1, Some(42))),
            Err(ShopError::CategoryNotFound(42))
        ));
        assert!(matches!(
            Product::create(&store, new_product("Kettle", 100, -1, None)),
            Err(ShopError::InvalidInput { field: "stock", .. })
        ));
    }

    #[test]
    fn create_defaults_description_to_empty() {
        let store = Store::open_in_memory().unwrap();
        let id = Product::create(
            &store,
            NewProduct {
                name: Some("Kettle".into()),
                price: Some(Money::from_cents(1_999)),
                stock: Some(4),
                ..NewProduct::default()
            },
        )
        .unwrap();
        let p = Product::get(&store, id).unwrap();
        assert_eq!(p.description, "");
        assert!(p.is_active);
        assert_eq!(p.price, Money::from_cents(1_999));
    }

    #[test]
    fn patch_keeps_absent_fields_and_clears_explicit_null() {
        let (store, electronics, _) = fixture();
        let patch: ProductPatch =
            serde_json::from_value(serde_json::json!({ "price": 39999.5, "category_id": null }))
                .unwrap();
        let updated = Product::update(&store, 1, patch).unwrap();
        assert_eq!(updated.name, "Smart TV");
        assert_eq!(updated.stock, 15);
        assert_eq!(updated.price, Money::from_cents(3_999_950));
        assert_eq!(updated.category_id, None);
        assert_ne!(Some(electronics), updated.category_id);
    }

    #[test]
    fn update_unknown_product_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            Product::update(&store, 9, ProductPatch::default()),
            Err(ShopError::ProductNotFound(9))
        ));
    }

    #[test]
    fn delete_removes_product() {
        let (store, _, _) = fixture();
        Product::delete(&store, 3).unwrap();
        assert!(Product::find(&store, 3).unwrap().is_none());
        assert!(matches!(
            Product::delete(&store, 3),
            Err(ShopError::ProductNotFound(3))
        ));
    }
}
