use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use storefront_core::cart::Cart;
use storefront_core::user::User;

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "storefront_session";
const TOKEN_LEN: usize = 32;
/// Idle lifetime used when none is configured.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Server-side state for one logged-in browser.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub cart: Cart,
    last_seen: Instant,
}

/// In-memory session table keyed by the cookie token. Sessions (and the carts
/// inside them) do not survive a restart, and are dropped once idle for
/// longer than the TTL.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a new session for `user_id` and return its token. Expired
    /// sessions are swept at the same time.
    pub async fn create(&self, user_id: i64) -> String {
        let token = generate_token();
        let now = Instant::now();
        let session = Session {
            user_id,
            cart: Cart::new(),
            last_seen: now,
        };
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) <= self.ttl);
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!(swept, "expired sessions dropped");
        }
        sessions.insert(token.clone(), session);
        token
    }

    /// Look up a live session and mark it as used.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let mut sessions = self.inner.write().await;
        let now = Instant::now();
        let session = sessions.get_mut(token)?;
        if now.duration_since(session.last_seen) > self.ttl {
            sessions.remove(token);
            return None;
        }
        session.last_seen = now;
        Some(session.clone())
    }

    /// Replace the cart of a live session. Returns false if the session is gone.
    pub async fn set_cart(&self, token: &str, cart: Cart) -> bool {
        match self.inner.write().await.get_mut(token) {
            Some(session) => {
                session.cart = cart;
                true
            }
            None => false,
        }
    }

    /// Empty the session's cart and hand its contents to the caller, so two
    /// requests can never both act on the same lines.
    pub async fn take_cart(&self, token: &str) -> Option<Cart> {
        self.inner
            .write()
            .await
            .get_mut(token)
            .map(|session| std::mem::take(&mut session.cart))
    }

    /// Put back a cart taken with [`take_cart`](Self::take_cart), merged with
    /// anything added to the session since.
    pub async fn restore_cart(&self, token: &str, cart: Cart) -> bool {
        match self.inner.write().await.get_mut(token) {
            Some(session) => {
                session.cart.absorb(cart);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.inner.write().await.remove(token)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// The logged-in user behind the request, with a snapshot of their cart.
/// Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub token: String,
    pub user: User,
    pub cart: Cart,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, app: &AppState) -> Result<Self, AppError> {
        let Some(token) = session_token(&parts.headers).map(str::to_string) else {
            return Err(AppError::unauthorized("login required"));
        };
        let Some(session) = app.sessions.get(&token).await else {
            return Err(AppError::unauthorized("login required"));
        };

        let db_path = app.db_path.clone();
        let user_id = session.user_id;
        let user = tokio::task::spawn_blocking(move || {
            let store = AppState::open_store(&db_path)?;
            storefront_core::user::User::find(&store, user_id)
        })
        .await
        .map_err(AppError::join)??;

        let Some(user) = user else {
            app.sessions.remove(&token).await;
            return Err(AppError::unauthorized("login required"));
        };
        Ok(CurrentUser {
            token,
            user,
            cart: session.cart,
        })
    }
}

/// A logged-in administrator. Non-admins are rejected with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, app: &AppState) -> Result<Self, AppError> {
        let current = CurrentUser::from_request_parts(parts, app).await?;
        if !current.user.is_admin {
            tracing::warn!(
                user = %current.user.username,
                path = %parts.uri.path(),
                "admin access denied"
            );
            return Err(AppError::forbidden("Access denied"));
        }
        Ok(AdminUser(current.user))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate a random alphanumeric session token.
fn generate_token() -> String {
    use rand::{distributions::Alphanumeric, Rng};
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|part| {
            part.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|token| !token.is_empty())
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
