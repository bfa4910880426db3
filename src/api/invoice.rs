// ============================================================================
// INVOICES - Cabecera de factura, numeración secuencial y estados
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
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::common::{ApiJson, IdPath, ListResponse, Pagination},
    models::invoice::{
        format_invoice_number, CreateInvoiceRequest, Invoice, InvoiceDetail, InvoiceStatus,
        InvoiceWithDetails, UpdateInvoiceRequest,
    },
    state::AppState,
};

const RESOURCE: &str = "Invoice";

#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub client_id: Option<Uuid>,
    pub issuing_company_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route(
            "/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
}

// ============================================================================
// Helpers shared with the detail router
// ============================================================================

/// Locks the invoice row for the rest of the transaction and checks that its
/// lines may still change.
pub(crate) async fn lock_draft_invoice(
    conn: &mut PgConnection,
    invoice_id: Uuid,
) -> Result<(), AppError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM invoices WHERE id = $1 FOR UPDATE")
            .bind(invoice_id)
            .fetch_optional(&mut *conn)
            .await?;

    match status.as_deref().map(InvoiceStatus::parse) {
        None => Err(AppError::bad_request(format!(
            "Invoice {} does not exist",
            invoice_id
        ))),
        Some(Some(InvoiceStatus::Draft)) => Ok(()),
        Some(_) => {
            warn!(invoice_id = %invoice_id, "🚫 Attempt to modify lines of a non-draft invoice");
            Err(AppError::conflict(format!(
                "Invoice {} is no longer a draft, its details cannot change",
                invoice_id
            )))
        }
    }
}

/// Sets the invoice totals to the sum of its lines.
pub(crate) async fn recompute_invoice_totals(
    conn: &mut PgConnection,
    invoice_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE invoices
        SET subtotal = totals.subtotal,
            tax_total = totals.tax_total,
            total = totals.total,
            updated_at = now()
        FROM (
            SELECT COALESCE(SUM(subtotal), 0) AS subtotal,
                   COALESCE(SUM(tax_amount), 0) AS tax_total,
                   COALESCE(SUM(total), 0) AS total
            FROM invoice_details
            WHERE invoice_id = $1
        ) AS totals
        WHERE invoices.id = $1
        "#,
    )
    .bind(invoice_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_details(
    conn: &mut PgConnection,
    invoice_id: Uuid,
) -> Result<Vec<InvoiceDetail>, AppError> {
    let details = sqlx::query_as::<_, InvoiceDetail>(
        "SELECT * FROM invoice_details WHERE invoice_id = $1 ORDER BY created_at, id",
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(details)
}

// ============================================================================
// Endpoints
// ============================================================================

/// GET /api/v1/invoice
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<ListResponse<Invoice>>, AppError> {
    let page = Pagination::new(query.limit, query.offset);
    let status = query.status.map(|s| s.as_str());

    let items = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT * FROM invoices
        WHERE ($1::uuid IS NULL OR client_id = $1)
          AND ($2::uuid IS NULL OR issuing_company_id = $2)
          AND ($3::text IS NULL OR status = $3)
        ORDER BY issue_date DESC, invoice_number DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(query.client_id)
    .bind(query.issuing_company_id)
    .bind(status)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&state.db_pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM invoices
        WHERE ($1::uuid IS NULL OR client_id = $1)
          AND ($2::uuid IS NULL OR issuing_company_id = $2)
          AND ($3::text IS NULL OR status = $3)
        "#,
    )
    .bind(query.client_id)
    .bind(query.issuing_company_id)
    .bind(status)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(ListResponse::new(items, total, page)))
}

/// GET /api/v1/invoice/:id
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<InvoiceWithDetails>, AppError> {
    let mut conn = state.db_pool.acquire().await?;

    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))?;
    let details = fetch_details(&mut conn, id).await?;

    Ok(Json(InvoiceWithDetails { invoice, details }))
}

/// POST /api/v1/invoice
///
/// Takes the next sequential of the issuing company. The company row stays
/// locked until commit, so concurrent invoices never share a number.
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = state.db_pool.begin().await?;

    let numbering: Option<(i64, String, String)> = sqlx::query_as(
        r#"
        UPDATE issuing_companies
        SET next_sequential = next_sequential + 1, updated_at = now()
        WHERE id = $1
        RETURNING next_sequential - 1, establishment_code, emission_point
        "#,
    )
    .bind(payload.issuing_company_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (sequential, establishment_code, emission_point) = numbering.ok_or_else(|| {
        AppError::bad_request(format!(
            "Issuing company {} does not exist",
            payload.issuing_company_id
        ))
    })?;
    let invoice_number = format_invoice_number(&establishment_code, &emission_point, sequential);

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (
            id, issuing_company_id, client_id, sequential, invoice_number, issue_date, notes
        )
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, CURRENT_DATE), $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.issuing_company_id)
    .bind(payload.client_id)
    .bind(sequential)
    .bind(&invoice_number)
    .bind(payload.issue_date)
    .bind(payload.notes)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(id = %invoice.id, invoice_number = %invoice.invoice_number, "🧾 Invoice created");
    Ok((
        StatusCode::CREATED,
        Json(InvoiceWithDetails {
            invoice,
            details: Vec::new(),
        }),
    ))
}

/// PUT /api/v1/invoice/:id
pub async fn update_invoice(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdateInvoiceRequest>,
) -> Result<Json<InvoiceWithDetails>, AppError> {
    payload.validate()?;

    let mut tx = state.db_pool.begin().await?;

    let current = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))?;

    let current_status = current.status()?;
    let next_status = payload.status.unwrap_or(current_status);

    if !current_status.can_transition_to(next_status) {
        return Err(AppError::conflict(format!(
            "Invoice {} cannot change from {} to {}",
            current.invoice_number,
            current_status.as_str(),
            next_status.as_str()
        )));
    }
    if payload.issue_date.is_some() && current_status != InvoiceStatus::Draft {
        return Err(AppError::conflict(
            "issue_date can only change while the invoice is a draft",
        ));
    }

    let details = fetch_details(&mut tx, id).await?;
    if current_status == InvoiceStatus::Draft
        && next_status == InvoiceStatus::Issued
        && details.is_empty()
    {
        return Err(AppError::conflict("An invoice without details cannot be issued"));
    }

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET status = $2,
            issue_date = COALESCE($3, issue_date),
            notes = COALESCE($4, notes),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(next_status.as_str())
    .bind(payload.issue_date)
    .bind(payload.notes)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if next_status != current_status {
        info!(
            invoice_number = %invoice.invoice_number,
            from = current_status.as_str(),
            to = next_status.as_str(),
            "🔄 Invoice status changed"
        );
    }

    Ok(Json(InvoiceWithDetails { invoice, details }))
}

/// DELETE /api/v1/invoice/:id
///
/// Only drafts can be deleted; issued invoices must be cancelled instead.
pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM invoices WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    match status.as_deref() {
        None => return Err(AppError::not_found(format!("{} {}", RESOURCE, id))),
        Some("draft") => {}
        Some(other) => {
            return Err(AppError::conflict(format!(
                "Invoice {} is {}, only drafts can be deleted",
                id, other
            )))
        }
    }

    sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(id = %id, "🗑️ Draft invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}
