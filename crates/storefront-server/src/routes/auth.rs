use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use storefront_core::user::User;
use storefront_core::ShopError;

use crate::error::AppError;
use crate::extract::Json;
use crate::session::{expired_cookie, session_cookie, CurrentUser};
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// POST /api/register
pub async fn register(
    State(app): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db_path = app.db_path.clone();
    let result = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        let user = User::register(&store, &body.username, &body.email, &body.password)?;
        Ok::<_, ShopError>(serde_json::json!({
            "message": "Registration successful",
            "id": user.id,
        }))
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// POST /api/login: verify credentials and start a session.
pub async fn login(
    State(app): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    let db_path = app.db_path.clone();
    let username = body.username.clone();
    let user = tokio::task::spawn_blocking(move || {
        let store = AppState::open_store(&db_path)?;
        User::authenticate(&store, &body.username, &body.password)
    })
    .await
    .map_err(AppError::join)?
    .inspect_err(|e| {
        if matches!(e, ShopError::InvalidCredentials) {
            tracing::warn!(user = %username, "rejected login");
        }
    })?;

    let token = app.sessions.create(user.id).await;
    tracing::info!(user = %user.username, "logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(serde_json::json!({
            "message": "Logged in successfully",
            "user": profile(&user),
        })),
    ))
}

/// POST /api/logout: drop the session along with its cart.
pub async fn logout(State(app): State<AppState>, current: CurrentUser) -> impl IntoResponse {
    app.sessions.remove(&current.token).await;
    (
        [(header::SET_COOKIE, expired_cookie())],
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}

/// GET /api/me
pub async fn me(current: CurrentUser) -> Json<serde_json::Value> {
    Json(profile(&current.user))
}

fn profile(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "is_admin": user.is_admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{login_as, seeded_state};
    use axum::http::StatusCode;

    fn register_body(username: &str, email: &str) -> RegisterBody {
        RegisterBody {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_duplicate_is_conflict() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);

        let ok = register(State(app.clone()), Json(register_body("alice", "alice@example.com")))
            .await
            .unwrap();
        assert_eq!(ok.0["message"], "Registration successful");
        assert!(ok.0["id"].as_i64().is_some());

        let err = register(State(app), Json(register_body("alice", "other@example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_with_blank_fields_is_bad_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let err = register(State(app), Json(register_body("", "")))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let body = LoginBody {
            username: "admin".to_string(),
            password: "nope".to_string(),
        };
        let err = login(State(app.clone()), Json(body)).await.err().unwrap();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let body = LoginBody {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        };
        let response = login(State(app.clone()), Json(body))
            .await
            .ok()
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("storefront_session="));
        assert_eq!(app.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn logout_drops_the_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let current = login_as(&app, "alice").await;
        let token = current.token.clone();

        let response = logout(State(app.clone()), current).await.into_response();
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
        assert!(app.sessions.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn me_hides_password_and_timestamps() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = seeded_state(&dir);
        let current = login_as(&app, "admin").await;
        let body = me(current).await.0;
        assert_eq!(body["username"], "admin");
        assert_eq!(body["is_admin"], true);
        assert!(body.get("password_hash").is_none());
        assert!(body.get("created_at").is_none());
    }
}
