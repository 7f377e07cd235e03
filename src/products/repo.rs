use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{authz::OwnerScope, pagination::Pagination};
use crate::db::StoreError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub category: String,
    pub user_id: i64, // owner, by id only
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>, // tombstone
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
}

/// Fields to overwrite; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
}

/// Product persistence. Tombstoned rows are invisible to every method.
///
/// The `*_owned` methods apply the whole [`OwnerScope`] in a single store
/// operation and return `None` when it matches nothing.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, owner_id: i64, new: NewProduct) -> Result<Product, StoreError>;
    async fn find(&self, id: i64) -> Result<Option<Product>, StoreError>;
    /// Newest first.
    async fn list(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<ProductPage, StoreError>;
    async fn find_owned(&self, scope: OwnerScope) -> Result<Option<Product>, StoreError>;
    async fn update_owned(
        &self,
        scope: OwnerScope,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError>;
    async fn set_image_owned(
        &self,
        scope: OwnerScope,
        image_url: &str,
    ) -> Result<Option<Product>, StoreError>;
    async fn soft_delete_owned(&self, scope: OwnerScope) -> Result<Option<Product>, StoreError>;
}

const PRODUCT_COLUMNS: &str =
    "id, title, description, price, image_url, category, user_id, created_at, updated_at, deleted_at";

pub struct PgProductStore {
    db: PgPool,
}

impl PgProductStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, owner_id: i64, new: NewProduct) -> Result<Product, StoreError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (title, description, price, category, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.category)
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;
        Ok(product)
    }

    async fn find(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(product)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<ProductPage, StoreError> {
        const PREDICATE: &str = r#"
            deleted_at IS NULL
            AND ($1::TEXT IS NULL OR category = $1)
            AND ($2::BIGINT IS NULL OR user_id = $2)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM products WHERE {PREDICATE}"
        ))
        .bind(filter.category.as_deref())
        .bind(filter.owner_id)
        .fetch_one(&self.db)
        .await?;

        let items = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
              FROM products
             WHERE {PREDICATE}
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.category.as_deref())
        .bind(filter.owner_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(ProductPage { items, total })
    }

    async fn find_owned(&self, scope: OwnerScope) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
              FROM products
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#
        ))
        .bind(scope.product_id())
        .bind(scope.owner_id())
        .fetch_optional(&self.db)
        .await?;
        Ok(product)
    }

    async fn update_owned(
        &self,
        scope: OwnerScope,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        if patch.is_empty() {
            return self.find_owned(scope).await;
        }
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
               SET title       = COALESCE($3, title),
                   description = COALESCE($4, description),
                   price       = COALESCE($5, price),
                   category    = COALESCE($6, category),
                   updated_at  = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(scope.product_id())
        .bind(scope.owner_id())
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price)
        .bind(patch.category.as_deref())
        .fetch_optional(&self.db)
        .await?;
        Ok(product)
    }

    async fn set_image_owned(
        &self,
        scope: OwnerScope,
        image_url: &str,
    ) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
               SET image_url = $3, updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(scope.product_id())
        .bind(scope.owner_id())
        .bind(image_url)
        .fetch_optional(&self.db)
        .await?;
        Ok(product)
    }

    async fn soft_delete_owned(&self, scope: OwnerScope) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
               SET deleted_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(scope.product_id())
        .bind(scope.owner_id())
        .fetch_optional(&self.db)
        .await?;
        Ok(product)
    }
}

#[derive(Default)]
struct MemoryProducts {
    next_id: i64,
    rows: Vec<Product>,
}

/// Process-local store; each `*_owned` call runs under one write lock so the
/// scope check and the mutation cannot interleave with another request.
#[derive(Default)]
pub struct MemoryProductStore {
    inner: RwLock<MemoryProducts>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows including tombstones.
    pub async fn row_count(&self) -> usize {
        self.inner.read().await.rows.len()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, owner_id: i64, new: NewProduct) -> Result<Product, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let product = Product {
            id: inner.next_id,
            title: new.title,
            description: new.description,
            price: new.price,
            image_url: None,
            category: new.category,
            user_id: owner_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.rows.push(product.clone());
        Ok(product)
    }

    async fn find(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .cloned())
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<ProductPage, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Product> = inner
            .rows
            .iter()
            .filter(|p| p.deleted_at.is_none())
            .filter(|p| filter.category.as_ref().map_or(true, |c| &p.category == c))
            .filter(|p| filter.owner_id.map_or(true, |o| p.user_id == o))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        Ok(ProductPage {
            total: matching.len() as i64,
            items: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }

    async fn find_owned(&self, scope: OwnerScope) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|p| scope.admits(p)).cloned())
    }

    async fn update_owned(
        &self,
        scope: OwnerScope,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(product) = inner.rows.iter_mut().find(|p| scope.admits(p)) else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(product.clone()));
        }
        if let Some(title) = &patch.title {
            product.title = title.clone();
        }
        if let Some(description) = &patch.description {
            product.description = description.clone();
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(category) = &patch.category {
            product.category = category.clone();
        }
        product.updated_at = OffsetDateTime::now_utc();
        Ok(Some(product.clone()))
    }

    async fn set_image_owned(
        &self,
        scope: OwnerScope,
        image_url: &str,
    ) -> Result<Option<Product>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(product) = inner.rows.iter_mut().find(|p| scope.admits(p)) else {
            return Ok(None);
        };
        product.image_url = Some(image_url.to_string());
        product.updated_at = OffsetDateTime::now_utc();
        Ok(Some(product.clone()))
    }

    async fn soft_delete_owned(&self, scope: OwnerScope) -> Result<Option<Product>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(product) = inner.rows.iter_mut().find(|p| scope.admits(p)) else {
            return Ok(None);
        };
        product.deleted_at = Some(OffsetDateTime::now_utc());
        Ok(Some(product.clone()))
    }
}
