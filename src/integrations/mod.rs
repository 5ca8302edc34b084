//! External service integrations.

pub mod product_client {
    pub use crate::product_client::*;
}
