use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use storefront_core::error::ShopError;

// ---------------------------------------------------------------------------
// Internal sentinels for access-control errors
// ---------------------------------------------------------------------------

/// Private sentinel carrying an explicit HTTP 401 through the `anyhow::Error`
/// chain without touching the `ShopError` enum.
#[derive(Debug)]
struct UnauthorizedError(String);

impl std::fmt::Display for UnauthorizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnauthorizedError {}

/// Private sentinel carrying an explicit HTTP 403.
#[derive(Debug)]
struct ForbiddenError(String);

impl std::fmt::Display for ForbiddenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ForbiddenError {}

/// Private sentinel for malformed requests that never reached the domain:
/// undecodable JSON, query strings or path segments.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. Bodies are always
/// `{"error": "<message>"}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 401 Unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(UnauthorizedError(msg.into()).into())
    }

    /// Construct a 403 Forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self(ForbiddenError(msg.into()).into())
    }

    /// Construct a 400 Bad Request error for input rejected before it was
    /// decoded.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    /// Wrap a `spawn_blocking` join failure.
    pub fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

fn status_for(err: &ShopError) -> StatusCode {
    match err {
        ShopError::ProductNotFound(_)
        | ShopError::CategoryNotFound(_)
        | ShopError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ShopError::UsernameTaken(_) | ShopError::EmailTaken(_) | ShopError::ProductInUse(_) => {
            StatusCode::CONFLICT
        }
        ShopError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ShopError::MissingFields
        | ShopError::InvalidInput { .. }
        | ShopError::InvalidPrice(_)
        | ShopError::InvalidQuantity(_)
        | ShopError::InsufficientStock
        | ShopError::InsufficientStockFor(_)
        | ShopError::ProductUnavailable(_)
        | ShopError::EmptyCart => StatusCode::BAD_REQUEST,
        ShopError::InvalidOrderStatus(_)
        | ShopError::CorruptPasswordHash(_)
        | ShopError::CorruptTimestamp(_)
        | ShopError::Db(_)
        | ShopError::Io(_)
        | ShopError::Yaml(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Check for explicit sentinel types before falling through to ShopError.
        if let Some(u) = self.0.downcast_ref::<UnauthorizedError>() {
            let body = serde_json::json!({ "error": u.0.clone() });
            return (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
        }
        if let Some(f) = self.0.downcast_ref::<ForbiddenError>() {
            let body = serde_json::json!({ "error": f.0.clone() });
            return (StatusCode::FORBIDDEN, axum::Json(body)).into_response();
        }
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let status = self
            .0
            .downcast_ref::<ShopError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
