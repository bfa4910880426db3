// ============================================================================
// INVOICE PDF - Documento imprimible de la factura (JSON)
// ============================================================================

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use shared::AppError;
use std::sync::Arc;
use tracing::info;

use crate::{
    api::{common::IdPath, invoice::fetch_details},
    models::{
        client::Client,
        invoice::{Invoice, InvoiceDocument},
        issuing_company::IssuingCompany,
    },
    state::AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:invoice_id", get(get_invoice_document))
}

/// GET /api/v1/invoice-pdf/:invoice_id
pub async fn get_invoice_document(
    State(state): State<Arc<AppState>>,
    IdPath(invoice_id): IdPath,
) -> Result<Json<InvoiceDocument>, AppError> {
    let mut conn = state.db_pool.acquire().await?;

    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(invoice_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))?;

    let company = sqlx::query_as::<_, IssuingCompany>("SELECT * FROM issuing_companies WHERE id = $1")
        .bind(invoice.issuing_company_id)
        .fetch_one(&mut *conn)
        .await?;

    let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
        .bind(invoice.client_id)
        .fetch_one(&mut *conn)
        .await?;

    let identification_type: String =
        sqlx::query_scalar("SELECT name FROM identification_types WHERE id = $1")
            .bind(client.identification_type_id)
            .fetch_one(&mut *conn)
            .await?;

    let lines = fetch_details(&mut conn, invoice_id).await?;

    info!(invoice_number = %invoice.invoice_number, lines = lines.len(), "📄 Invoice document rendered");
    Ok(Json(InvoiceDocument::new(company, client, identification_type, invoice, lines)))
}
