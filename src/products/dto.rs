use serde::{Deserialize, Serialize};

use super::repo::{NewProduct, Product, ProductPatch};
use crate::error::ApiError;

const TITLE_LEN: std::ops::RangeInclusive<usize> = 3..=100;
const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
}

/// Every field optional; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct ImageUploaded {
    pub message: &'static str,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

fn check_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    if !TITLE_LEN.contains(&title.chars().count()) {
        return Err(ApiError::validation(
            "title must be between 3 and 100 characters",
        ));
    }
    Ok(title.to_string())
}

fn check_description(raw: &str) -> Result<String, ApiError> {
    let description = raw.trim();
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(ApiError::validation(
            "description must be at most 500 characters",
        ));
    }
    Ok(description.to_string())
}

fn check_price(price: f64) -> Result<f64, ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation("price must be a non-negative number"));
    }
    Ok(price)
}

fn check_category(raw: &str) -> Result<String, ApiError> {
    let category = raw.trim();
    if category.is_empty() {
        return Err(ApiError::validation("category is required"));
    }
    Ok(category.to_string())
}

impl CreateProductRequest {
    pub fn validated(self) -> Result<NewProduct, ApiError> {
        Ok(NewProduct {
            title: check_title(&self.title)?,
            description: check_description(&self.description)?,
            price: check_price(self.price)?,
            category: check_category(&self.category)?,
        })
    }
}

impl UpdateProductRequest {
    /// Checks present fields with the creation rules.
    pub fn validated(self) -> Result<ProductPatch, ApiError> {
        Ok(ProductPatch {
            title: self.title.as_deref().map(check_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(check_description)
                .transpose()?,
            price: self.price.map(check_price).transpose()?,
            category: self.category.as_deref().map(check_category).transpose()?,
        })
    }
}
