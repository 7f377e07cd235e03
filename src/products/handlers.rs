use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    authz::{require_owned, OwnerScope},
    dto::{
        CreateProductRequest, ImageUploaded, MessageBody, ProductEnvelope, ProductList,
        UpdateProductRequest,
    },
    pagination::ListQuery,
    repo::{Product, ProductFilter},
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    state::ProductServiceState,
    storage::{self, ImageStore},
};

const IMAGE_FIELD: &str = "image";

async fn list_page(
    state: &ProductServiceState,
    query: ListQuery,
    owner_id: Option<i64>,
) -> Result<Json<ProductList>, ApiError> {
    let page = query.pagination();
    let filter = ProductFilter {
        category: query.category(),
        owner_id,
    };
    let found = state
        .products
        .list(&filter, page)
        .await
        .map_err(|e| ApiError::upstream("could not load products", e))?;

    Ok(Json(ProductList {
        products: found.items,
        total: found.total,
        page: page.page,
        limit: page.limit,
    }))
}

/// GET /products (public)
#[instrument(skip_all)]
pub async fn list_products(
    State(state): State<ProductServiceState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ProductList>, ApiError> {
    // A query string that does not even decode gets the default page.
    let query = query.map(|Query(q)| q).unwrap_or_default();
    list_page(&state, query, None).await
}

/// GET /my-products
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn my_products(
    State(state): State<ProductServiceState>,
    user: AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ProductList>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    list_page(&state, query, Some(user.id)).await
}

#[instrument(skip_all)]
pub async fn get_product(
    State(state): State<ProductServiceState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let Path(id) = id?;
    let product = state
        .products
        .find(id)
        .await
        .map_err(|e| ApiError::upstream("could not load product", e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    Ok(Json(ProductEnvelope {
        message: None,
        product,
    }))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_product(
    State(state): State<ProductServiceState>,
    user: AuthUser,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
    let Json(payload) = payload?;
    let new = payload.validated()?;

    let product = state
        .products
        .insert(user.id, new)
        .await
        .map_err(|e| ApiError::upstream("could not create product", e))?;

    info!(product_id = product.id, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ProductEnvelope {
            message: Some("product created"),
            product,
        }),
    ))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn update_product(
    State(state): State<ProductServiceState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let patch = payload.validated()?;

    let scope = OwnerScope::new(&user, id);
    let found = state
        .products
        .update_owned(scope, &patch)
        .await
        .map_err(|e| ApiError::upstream("could not update product", e))?;
    let product = require_owned(found)?;

    info!(product_id = product.id, "product updated");
    Ok(Json(ProductEnvelope {
        message: Some("product updated"),
        product,
    }))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn delete_product(
    State(state): State<ProductServiceState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Path(id) = id?;

    let scope = OwnerScope::new(&user, id);
    let found = state
        .products
        .soft_delete_owned(scope)
        .await
        .map_err(|e| ApiError::upstream("could not delete product", e))?;
    let product = require_owned(found)?;

    remove_image(state.images.as_ref(), &product).await;

    info!(product_id = product.id, "product deleted");
    Ok(Json(MessageBody {
        message: "product deleted",
    }))
}

/// POST /products/:id/image (multipart, field `image`)
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn upload_image(
    State(state): State<ProductServiceState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageUploaded>, ApiError> {
    let Path(id) = id?;
    let scope = OwnerScope::new(&user, id);

    let previous = state
        .products
        .find_owned(scope)
        .await
        .map_err(|e| ApiError::upstream("could not load product", e))?;
    let previous = require_owned(previous)?;

    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((original, data));
        break;
    }
    let Some((original, data)) = upload else {
        return Err(ApiError::validation("image file is required"));
    };

    let ext = storage::allowed_extension(&original).ok_or_else(|| {
        ApiError::validation("invalid file type; allowed: jpg, jpeg, png, gif, webp")
    })?;

    let file_name = format!("{}_{}{}", id, Uuid::new_v4(), ext);
    state
        .images
        .put_object(&file_name, data)
        .await
        .map_err(|e| ApiError::upstream("could not save image", e))?;

    let image_url = storage::public_url(&file_name);
    let updated = match state.products.set_image_owned(scope, &image_url).await {
        Ok(found) => found,
        Err(e) => {
            discard(state.images.as_ref(), &file_name).await;
            return Err(ApiError::upstream("could not attach image", e));
        }
    };
    if updated.is_none() {
        // Deleted between the ownership check and the update.
        discard(state.images.as_ref(), &file_name).await;
    }
    let product = require_owned(updated)?;

    remove_image(state.images.as_ref(), &previous).await;

    info!(product_id = product.id, %image_url, "image attached");
    Ok(Json(ImageUploaded {
        message: "image uploaded",
        image_url,
    }))
}

async fn remove_image(images: &dyn ImageStore, product: &Product) {
    if let Some(url) = &product.image_url {
        discard(images, url).await;
    }
}

async fn discard(images: &dyn ImageStore, reference: &str) {
    if let Err(e) = images.delete_object(reference).await {
        warn!(error = %e, reference, "could not remove image");
    }
}
