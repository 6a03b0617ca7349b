use axum::extract::State;
use storefront_core::catalog::{AdminProduct, NewProduct, Product, ProductPatch};

use crate::error::AppError;
use crate::extract::{Json, Path};
use crate::session::AdminUser;
use crate::state::AppState;

/// GET /api/admin/products: every product, inactive ones included.
pub async fn list_products(
    State(app): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminProduct>>, AppError> {
    let db_path = app.db_path.clone();
    let products = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        Product::list_all(&store)
            .map(|products| products.into_iter().map(AdminProduct::from).collect())
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(products))
}

/// POST /api/admin/products
pub async fn create_product(
    State(app): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<NewProduct>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db_path = app.db_path.clone();
    let id = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        Product::create(&store, body)
    })
    .await
    .map_err(AppError::join)??;

    tracing::info!(admin = %admin.username, product_id = id, "product added");
    Ok(Json(serde_json::json!({
        "message": "Product added",
        "id": id,
    })))
}

/// PUT /api/admin/products/{id}: partial update; absent fields are kept.
pub async fn update_product(
    State(app): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<ProductPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db_path = app.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        Product::update(&store, id, body)
    })
    .await
    .map_err(AppError::join)??;

    tracing::info!(admin = %admin.username, product_id = id, "product updated");
    Ok(Json(serde_json::json!({ "message": "Product updated" })))
}

/// DELETE /api/admin/products/{id}
pub async fn delete_product(
    State(app): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db_path = app.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        Product::delete(&store, id)
    })
    .await
    .map_err(AppError::join)??;

    tracing::info!(admin = %admin.username, product_id = id, "product deleted");
    Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}
