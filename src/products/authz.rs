//! Ownership checks for mutating product operations.
//!
//! A mutation never loads a product and then compares owners. Instead the
//! caller's identity is folded into the lookup itself through [`OwnerScope`],
//! and the store applies id, owner and liveness as one predicate. A product
//! that exists under another owner is therefore indistinguishable from one
//! that does not exist, and both surface as 404.

use super::repo::Product;
use crate::{auth::AuthUser, error::ApiError};

pub const NOT_FOUND_OR_NOT_OWNED: &str = "product not found or not owned by you";

/// "Product `product_id`, as long as it belongs to `owner_id` and is live."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    product_id: i64,
    owner_id: i64,
}

impl OwnerScope {
    /// The owner always comes from a verified token, never from the request body.
    pub fn new(caller: &AuthUser, product_id: i64) -> Self {
        Self {
            product_id,
            owner_id: caller.id,
        }
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    /// In-process form of the store predicate.
    pub fn admits(&self, product: &Product) -> bool {
        product.id == self.product_id
            && product.user_id == self.owner_id
            && product.deleted_at.is_none()
    }
}

/// Turns the result of a scoped store call into the caller-facing outcome.
pub fn require_owned(found: Option<Product>) -> Result<Product, ApiError> {
    found.ok_or_else(|| ApiError::not_found(NOT_FOUND_OR_NOT_OWNED))
}
