// ============================================================================
// PRODUCTS - Catálogo de productos facturables
// ============================================================================

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared::AppError;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    api::common::{count_rows, delete_by_id, ApiJson, IdPath, ListQuery, ListResponse},
    models::product::{CreateProductRequest, Product, UpdateProductRequest},
    state::AppState,
};

const TABLE: &str = "products";
const RESOURCE: &str = "Product";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// GET /api/v1/product
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Product>>, AppError> {
    let page = query.pagination();

    let items = sqlx::query_as::<_, Product>(
        "SELECT * FROM products ORDER BY code LIMIT $1 OFFSET $2",
    )
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&state.db_pool)
    .await?;
    let total = count_rows(&state.db_pool, TABLE).await?;

    Ok(Json(ListResponse::new(items, total, page)))
}

/// GET /api/v1/product/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<Product>, AppError> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// POST /api/v1/product
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.check()?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, code, name, description, unit_price, tax_rate)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.code.trim())
    .bind(payload.name.trim())
    .bind(payload.description)
    .bind(payload.unit_price)
    .bind(payload.tax_rate)
    .fetch_one(&state.db_pool)
    .await?;

    info!(id = %product.id, code = %product.code, "✅ Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/product/:id
///
/// Price changes only affect detail lines created afterwards.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    payload.check()?;

    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET code = COALESCE($2, code),
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            unit_price = COALESCE($5, unit_price),
            tax_rate = COALESCE($6, tax_rate),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.code.as_deref().map(str::trim))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.description)
    .bind(payload.unit_price)
    .bind(payload.tax_rate)
    .fetch_optional(&state.db_pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// DELETE /api/v1/product/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state.db_pool, TABLE, RESOURCE, id).await?;
    info!(id = %id, "🗑️ Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
