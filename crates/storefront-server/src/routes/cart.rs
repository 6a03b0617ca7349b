use axum::extract::State;
use storefront_core::cart::CartView;

use crate::error::AppError;
use crate::extract::Json;
use crate::session::CurrentUser;
use crate::state::AppState;

fn one() -> i64 {
    1
}

#[derive(serde::Deserialize)]
pub struct AddBody {
    product_id: i64,
    #[serde(default = "one")]
    quantity: i64,
}

/// POST /api/cart/add
pub async fn add_to_cart(
    State(app): State<AppState>,
    current: CurrentUser,
    Json(body): Json<AddBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db_path = app.db_path.clone();
    let mut cart = current.cart;
    let (cart, cart_count) = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        let count = cart.add(&store, body.product_id, body.quantity)?;
        Ok::<_, storefront_core::ShopError>((cart, count))
    })
    .await
    .map_err(AppError::join)??;

    app.sessions.set_cart(&current.token, cart).await;
    Ok(Json(serde_json::json!({
        "message": "Added to cart",
        "cart_count": cart_count,
    })))
}

/// GET /api/cart: the session cart priced against the live catalog.
pub async fn get_cart(
    State(app): State<AppState>,
    current: CurrentUser,
) -> Result<Json<CartView>, AppError> {
    let db_path = app.db_path.clone();
    let rate = app.tax_rate;
    let cart = current.cart;
    let view = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        cart.view(&store, rate)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(view))
}

#[derive(serde::Deserialize)]
pub struct UpdateBody {
    product_id: i64,
    #[serde(default)]
    quantity: i64,
}

/// POST /api/cart/update: set a line's quantity; zero removes it.
pub async fn update_cart(
    State(app): State<AppState>,
    current: CurrentUser,
    Json(body): Json<UpdateBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db_path = app.db_path.clone();
    let mut cart = current.cart;
    let cart = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        cart.update(&store, body.product_id, body.quantity)?;
        Ok::<_, storefront_core::ShopError>(cart)
    })
    .await
    .map_err(AppError::join)??;

    app.sessions.set_cart(&current.token, cart).await;
    Ok(Json(serde_json::json!({ "message": "Cart updated" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{login_as, seeded_state};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use storefront_core::money::Money;

    async fn refreshed(app: &AppState, current: &CurrentUser) -> CurrentUser {
        let mut next = current.clone();
        next.cart = app.sessions.get(&current.token).await.unwrap().cart;
        next
    }

    #[tokio::test]
    async fn add_accumulates_and_view_prices_with_gst() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let alice = login_as(&app, "alice").await;

        // Electric Cooker, 3500.00
        let body = AddBody {
            product_id: 3,
            quantity: 1,
        };
        let res = add_to_cart(State(app.clone()), alice.clone(), Json(body))
            .await
            .unwrap();
        assert_eq!(res.0["cart_count"], 1);

        let alice = refreshed(&app, &alice).await;
        let body = AddBody {
            product_id: 3,
            quantity: 1,
        };
        add_to_cart(State(app.clone()), alice.clone(), Json(body))
            .await
            .unwrap();

        let alice = refreshed(&app, &alice).await;
        let view = get_cart(State(app), alice).await.unwrap().0;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 2);
        assert_eq!(view.total, Money::from_cents(700_000));
        assert_eq!(view.gst, Money::from_cents(126_000));
        assert_eq!(view.grand_total, Money::from_cents(826_000));
    }

    #[tokio::test]
    async fn adding_more_than_stock_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let alice = login_as(&app, "alice").await;
        // Gaming Console has 8 in stock.
        let body = AddBody {
            product_id: 4,
            quantity: 9,
        };
        let err = add_to_cart(State(app.clone()), alice.clone(), Json(body))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(app.sessions.get(&alice.token).await.unwrap().cart.is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let alice = login_as(&app, "alice").await;
        let body = AddBody {
            product_id: 999,
            quantity: 1,
        };
        let err = add_to_cart(State(app), alice, Json(body)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_to_zero_removes_the_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let alice = login_as(&app, "alice").await;
        let body = AddBody {
            product_id: 1,
            quantity: 2,
        };
        add_to_cart(State(app.clone()), alice.clone(), Json(body))
            .await
            .unwrap();

        let alice = refreshed(&app, &alice).await;
        let body = UpdateBody {
            product_id: 1,
            quantity: 0,
        };
        let res = update_cart(State(app.clone()), alice.clone(), Json(body))
            .await
            .unwrap();
        assert_eq!(res.0["message"], "Cart updated");
        assert!(app.sessions.get(&alice.token).await.unwrap().cart.is_empty());
    }

    #[tokio::test]
    async fn update_beyond_stock_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let alice = login_as(&app, "alice").await;
        let body = UpdateBody {
            product_id: 1,
            quantity: 100,
        };
        let err = update_cart(State(app), alice, Json(body)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
