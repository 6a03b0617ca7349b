use axum::extract::State;
use storefront_core::checkout::Receipt;

use crate::error::AppError;
use crate::extract::Json;
use crate::session::CurrentUser;
use crate::state::AppState;

/// POST /api/checkout: turn the session cart into an order. The cart is taken
/// out of the session for the duration, so a second concurrent checkout sees
/// an empty cart. On failure it is put back.
pub async fn checkout(
    State(app): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Receipt>, AppError> {
    let Some(cart) = app.sessions.take_cart(&current.token).await else {
        return Err(AppError::unauthorized("login required"));
    };

    let db_path = app.db_path.clone();
    let rate = app.tax_rate;
    let user_id = current.user.id;
    let ordered = cart.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut store = AppState::open_store(&db_path)?;
        storefront_core::checkout::checkout(&mut store, user_id, &ordered, rate)
    })
    .await
    .map_err(AppError::join)
    .and_then(|r| r.map_err(AppError::from));

    match result {
        Ok(receipt) => Ok(Json(receipt)),
        Err(err) => {
            app.sessions.restore_cart(&current.token, cart).await;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{login_as, seeded_state};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use storefront_core::catalog::Product;
    use storefront_core::money::Money;
    use storefront_core::store::Store;

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let alice = login_as(&app, "alice").await;
        let err = checkout(State(app), alice).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn successful_checkout_clears_cart_and_decrements_stock() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let mut alice = login_as(&app, "alice").await;
        {
            let store = Store::open(&app.db_path).unwrap();
            alice.cart.add(&store, 3, 2).unwrap();
        }
        app.sessions.set_cart(&alice.token, alice.cart.clone()).await;

        let receipt = checkout(State(app.clone()), alice.clone()).await.unwrap().0;
        assert_eq!(receipt.bill.subtotal, Money::from_cents(700_000));
        assert_eq!(receipt.bill.gst, Money::from_cents(126_000));
        assert_eq!(receipt.bill.grand_total, Money::from_cents(826_000));
        assert_eq!(receipt.bill.items[0].name, "Electric Cooker");

        assert!(app.sessions.get(&alice.token).await.unwrap().cart.is_empty());
        let store = Store::open(&app.db_path).unwrap();
        assert_eq!(Product::get(&store, 3).unwrap().stock, 23);
    }

    #[tokio::test]
    async fn failed_checkout_keeps_the_cart() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let mut alice = login_as(&app, "alice").await;
        {
            let store = Store::open(&app.db_path).unwrap();
            alice.cart.add(&store, 4, 5).unwrap();
            store
                .conn()
                .execute("UPDATE products SET stock = 1 WHERE id = 4", [])
                .unwrap();
        }
        app.sessions.set_cart(&alice.token, alice.cart.clone()).await;

        let err = checkout(State(app.clone()), alice.clone()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            app.sessions.get(&alice.token).await.unwrap().cart.quantity_of(4),
            5
        );
    }

    #[tokio::test]
    async fn concurrent_checkouts_place_one_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let mut alice = login_as(&app, "alice").await;
        {
            let store = Store::open(&app.db_path).unwrap();
            alice.cart.add(&store, 3, 2).unwrap();
        }
        app.sessions.set_cart(&alice.token, alice.cart.clone()).await;

        let (first, second) = tokio::join!(
            checkout(State(app.clone()), alice.clone()),
            checkout(State(app.clone()), alice.clone()),
        );
        let placed = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(placed, 1);

        let store = Store::open(&app.db_path).unwrap();
        assert_eq!(Product::get(&store, 3).unwrap().stock, 23);
        assert!(app.sessions.get(&alice.token).await.unwrap().cart.is_empty());
    }
}
