// ============================================================================
// INVOICE DETAILS - Líneas de factura; cada cambio recalcula los totales
// ============================================================================

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::AppError;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    api::{
        common::{ApiJson, IdPath, ListResponse, Pagination},
        invoice::{lock_draft_invoice, recompute_invoice_totals},
    },
    models::{
        invoice::{CreateInvoiceDetailRequest, InvoiceDetail, LineAmounts, UpdateInvoiceDetailRequest},
        product::Product,
    },
    state::AppState,
};

const RESOURCE: &str = "Invoice detail";

#[derive(Debug, Deserialize)]
pub struct InvoiceDetailListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub invoice_id: Option<Uuid>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_invoice_details).post(create_invoice_detail))
        .route(
            "/:id",
            get(get_invoice_detail)
                .put(update_invoice_detail)
                .delete(delete_invoice_detail),
        )
}

/// GET /api/v1/invoice-detail?invoice_id=
pub async fn list_invoice_details(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InvoiceDetailListQuery>,
) -> Result<Json<ListResponse<InvoiceDetail>>, AppError> {
    let page = Pagination::new(query.limit, query.offset);

    let items = sqlx::query_as::<_, InvoiceDetail>(
        r#"
        SELECT * FROM invoice_details
        WHERE ($1::uuid IS NULL OR invoice_id = $1)
        ORDER BY invoice_id, created_at, id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(query.invoice_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&state.db_pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM invoice_details WHERE ($1::uuid IS NULL OR invoice_id = $1)",
    )
    .bind(query.invoice_id)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(ListResponse::new(items, total, page)))
}

/// GET /api/v1/invoice-detail/:id
pub async fn get_invoice_detail(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<InvoiceDetail>, AppError> {
    sqlx::query_as::<_, InvoiceDetail>("SELECT * FROM invoice_details WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// POST /api/v1/invoice-detail
pub async fn create_invoice_detail(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateInvoiceDetailRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.check()?;

    let mut tx = state.db_pool.begin().await?;
    lock_draft_invoice(&mut tx, payload.invoice_id).await?;

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::bad_request(format!("Product {} does not exist", payload.product_id))
        })?;

    let unit_price = payload.unit_price.unwrap_or(product.unit_price);
    let amounts = LineAmounts::compute(payload.quantity, unit_price, payload.discount, product.tax_rate)?;
    let description = payload.description.unwrap_or(product.name);

    let detail = sqlx::query_as::<_, InvoiceDetail>(
        r#"
        INSERT INTO invoice_details (
            id, invoice_id, product_id, description, quantity, unit_price, discount,
            subtotal, tax_rate, tax_amount, total
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.invoice_id)
    .bind(product.id)
    .bind(description)
    .bind(payload.quantity)
    .bind(unit_price)
    .bind(payload.discount)
    .bind(amounts.subtotal)
    .bind(product.tax_rate)
    .bind(amounts.tax_amount)
    .bind(amounts.total)
    .fetch_one(&mut *tx)
    .await?;

    recompute_invoice_totals(&mut tx, detail.invoice_id).await?;
    tx.commit().await?;

    info!(
        id = %detail.id,
        invoice_id = %detail.invoice_id,
        total = %detail.total,
        "➕ Invoice detail added"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Invoice owning the line, read without locking so the invoice row can be
/// locked first.
async fn owning_invoice(state: &AppState, id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT invoice_id FROM invoice_details WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// PUT /api/v1/invoice-detail/:id
///
/// The line keeps the tax rate it was created with.
pub async fn update_invoice_detail(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdateInvoiceDetailRequest>,
) -> Result<Json<InvoiceDetail>, AppError> {
    payload.check()?;

    let invoice_id = owning_invoice(&state, id).await?;

    let mut tx = state.db_pool.begin().await?;
    lock_draft_invoice(&mut tx, invoice_id).await?;

    let current = sqlx::query_as::<_, InvoiceDetail>(
        "SELECT * FROM invoice_details WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))?;

    let quantity = payload.quantity.unwrap_or(current.quantity);
    let unit_price = payload.unit_price.unwrap_or(current.unit_price);
    let discount = payload.discount.unwrap_or(current.discount);
    let amounts = LineAmounts::compute(quantity, unit_price, discount, current.tax_rate)?;

    let detail = sqlx::query_as::<_, InvoiceDetail>(
        r#"
        UPDATE invoice_details
        SET description = COALESCE($2, description),
            quantity = $3,
            unit_price = $4,
            discount = $5,
            subtotal = $6,
            tax_amount = $7,
            total = $8,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.description)
    .bind(quantity)
    .bind(unit_price)
    .bind(discount)
    .bind(amounts.subtotal)
    .bind(amounts.tax_amount)
    .bind(amounts.total)
    .fetch_one(&mut *tx)
    .await?;

    recompute_invoice_totals(&mut tx, invoice_id).await?;
    tx.commit().await?;

    info!(id = %id, invoice_id = %invoice_id, total = %detail.total, "✏️ Invoice detail updated");
    Ok(Json(detail))
}

/// DELETE /api/v1/invoice-detail/:id
pub async fn delete_invoice_detail(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    let invoice_id = owning_invoice(&state, id).await?;

    let mut tx = state.db_pool.begin().await?;
    lock_draft_invoice(&mut tx, invoice_id).await?;

    let result = sqlx::query("DELETE FROM invoice_details WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("{} {}", RESOURCE, id)));
    }

    recompute_invoice_totals(&mut tx, invoice_id).await?;
    tx.commit().await?;

    info!(id = %id, invoice_id = %invoice_id, "➖ Invoice detail removed");
    Ok(StatusCode::NO_CONTENT)
}
