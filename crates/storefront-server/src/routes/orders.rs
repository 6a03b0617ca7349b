use axum::extract::State;
use storefront_core::order::Order;

use crate::error::AppError;
use crate::extract::Json;
use crate::session::CurrentUser;
use crate::state::AppState;

/// GET /api/orders: the caller's orders, or every order for administrators.
pub async fn list_orders(
    State(app): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let db_path = app.db_path.clone();
    let viewer = current.user;
    let orders = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        Order::list_for(&store, &viewer)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(orders))
}
