pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod io;
pub mod money;
pub mod order;
pub mod password;
pub mod paths;
pub mod seed;
pub mod store;
pub mod types;
pub mod user;

pub use error::{Result, ShopError};
