use axum::extract::State;
use storefront_core::catalog::{Category, Product, ProductFilter, ProductListing};

use crate::error::AppError;
use crate::extract::{Json, Query};
use crate::state::AppState;

/// GET /api/products: active products, optionally filtered by
/// `category_id` and a case-insensitive `search` on the name. Blank or
/// malformed filter values are ignored.
pub async fn list_products(
    State(app): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<ProductListing>>, AppError> {
    let db_path = app.db_path.clone();
    let products = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        Product::list(&store, &filter)
            .map(|products| products.into_iter().map(ProductListing::from).collect())
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(products))
}

/// GET /api/categories
pub async fn list_categories(
    State(app): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let db_path = app.db_path.clone();
    let categories = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        Category::list(&store)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(categories))
}
