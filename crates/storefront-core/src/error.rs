use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("product not found: {0}")]
    ProductNotFound(i64),

    #[error("category not found: {0}")]
    CategoryNotFound(i64),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("Username already exists")]
    UsernameTaken(String),

    #[error("Email already registered")]
    EmailTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing required fields")]
    MissingFields,

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("Insufficient stock for {0}")]
    InsufficientStockFor(String),

    #[error("{0} is no longer available")]
    ProductUnavailable(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("product {0} appears in order history; deactivate it instead")]
    ProductInUse(i64),

    #[error("invalid order status: {0}")]
    InvalidOrderStatus(String),

    #[error("corrupt password hash for user {0}")]
    CorruptPasswordHash(i64),

    #[error("invalid timestamp in database: {0}")]
    CorruptTimestamp(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ShopError>;
