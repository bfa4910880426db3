// ============================================================================
// ISSUING COMPANIES - Emisores (RUC, establecimiento y punto de emisión)
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
    models::issuing_company::{
        CreateIssuingCompanyRequest, IssuingCompany, UpdateIssuingCompanyRequest,
    },
    state::AppState,
};

const TABLE: &str = "issuing_companies";
const RESOURCE: &str = "Issuing company";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_issuing_companies).post(create_issuing_company))
        .route(
            "/:id",
            get(get_issuing_company)
                .put(update_issuing_company)
                .delete(delete_issuing_company),
        )
}

/// GET /api/v1/issuing-company
pub async fn list_issuing_companies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<IssuingCompany>>, AppError> {
    let page = query.pagination();

    let items = sqlx::query_as::<_, IssuingCompany>(
        "SELECT * FROM issuing_companies ORDER BY business_name LIMIT $1 OFFSET $2",
    )
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&state.db_pool)
    .await?;
    let total = count_rows(&state.db_pool, TABLE).await?;

    Ok(Json(ListResponse::new(items, total, page)))
}

/// GET /api/v1/issuing-company/:id
pub async fn get_issuing_company(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<IssuingCompany>, AppError> {
    sqlx::query_as::<_, IssuingCompany>("SELECT * FROM issuing_companies WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// POST /api/v1/issuing-company
pub async fn create_issuing_company(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateIssuingCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.check()?;

    let company = sqlx::query_as::<_, IssuingCompany>(
        r#"
        INSERT INTO issuing_companies (
            id, ruc, business_name, trade_name, main_address,
            establishment_code, emission_point, requires_accounting, email, phone
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&payload.ruc)
    .bind(payload.business_name.trim())
    .bind(payload.trade_name)
    .bind(payload.main_address.trim())
    .bind(&payload.establishment_code)
    .bind(&payload.emission_point)
    .bind(payload.requires_accounting)
    .bind(payload.email)
    .bind(payload.phone)
    .fetch_one(&state.db_pool)
    .await?;

    info!(id = %company.id, ruc = %company.ruc, "✅ Issuing company created");
    Ok((StatusCode::CREATED, Json(company)))
}

/// PUT /api/v1/issuing-company/:id
///
/// Changing the establishment or emission point does not renumber invoices
/// already issued.
pub async fn update_issuing_company(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdateIssuingCompanyRequest>,
) -> Result<Json<IssuingCompany>, AppError> {
    payload.check()?;

    sqlx::query_as::<_, IssuingCompany>(
        r#"
        UPDATE issuing_companies
        SET ruc = COALESCE($2, ruc),
            business_name = COALESCE($3, business_name),
            trade_name = COALESCE($4, trade_name),
            main_address = COALESCE($5, main_address),
            establishment_code = COALESCE($6, establishment_code),
            emission_point = COALESCE($7, emission_point),
            requires_accounting = COALESCE($8, requires_accounting),
            email = COALESCE($9, email),
            phone = COALESCE($10, phone),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.ruc)
    .bind(payload.business_name.as_deref().map(str::trim))
    .bind(payload.trade_name)
    .bind(payload.main_address.as_deref().map(str::trim))
    .bind(payload.establishment_code)
    .bind(payload.emission_point)
    .bind(payload.requires_accounting)
    .bind(payload.email)
    .bind(payload.phone)
    .fetch_optional(&state.db_pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// DELETE /api/v1/issuing-company/:id
pub async fn delete_issuing_company(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state.db_pool, TABLE, RESOURCE, id).await?;
    info!(id = %id, "🗑️ Issuing company deleted");
    Ok(StatusCode::NO_CONTENT)
}
