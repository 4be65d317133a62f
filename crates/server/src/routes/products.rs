//! Menu route handlers.
//!
//! Reads are open to every signed-in user; writes require the admin group.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use food_order_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Product;
use crate::services::MenuService;
use crate::services::menu::ProductDraft;
use crate::state::AppState;

/// Multipart field carrying the image file.
const IMAGE_FIELD: &str = "image";

/// Product form from the admin app.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub name: String,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl From<ProductRequest> for ProductDraft {
    fn from(request: ProductRequest) -> Self {
        Self {
            name: request.name,
            price: request.price,
            image: request.image,
        }
    }
}

/// Result of an image upload.
#[derive(Debug, Serialize)]
pub struct UploadedImage {
    /// Value to store in a product's `image` field.
    pub path: String,
    /// Where the image is served.
    pub url: String,
}

/// List the menu.
#[instrument(skip(state, _user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let menu = MenuService::new(state.pool(), state.menu_cache()).list().await?;
    Ok(Json(menu.as_ref().clone()))
}

/// Show one product.
#[instrument(skip(state, _user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = MenuService::new(state.pool(), state.menu_cache())
        .get(ProductId::new(id))
        .await?;
    Ok(Json(product))
}

/// Add a product to the menu.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = MenuService::new(state.pool(), state.menu_cache())
        .create(request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's name, price and image.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let product = MenuService::new(state.pool(), state.menu_cache())
        .update(ProductId::new(id), request.into())
        .await?;
    Ok(Json(product))
}

/// Remove a product from the menu.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    MenuService::new(state.pool(), state.menu_cache())
        .delete(ProductId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a product image (multipart field `image`).
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let path = state.images().save(&bytes).await?;
        let url = format!("/images/{path}");

        return Ok((StatusCode::CREATED, Json(UploadedImage { path, url })));
    }

    Err(AppError::BadRequest(format!(
        "missing multipart field '{IMAGE_FIELD}'"
    )))
}
