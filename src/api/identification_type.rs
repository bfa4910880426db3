// ============================================================================
// IDENTIFICATION TYPES - CRUD de tipos de identificación del comprador
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
use validator::Validate;

use crate::{
    api::common::{count_rows, delete_by_id, ApiJson, IdPath, ListQuery, ListResponse},
    models::identification_type::{
        CreateIdentificationTypeRequest, IdentificationType, UpdateIdentificationTypeRequest,
    },
    state::AppState,
};

const TABLE: &str = "identification_types";
const RESOURCE: &str = "Identification type";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_identification_types).post(create_identification_type))
        .route(
            "/:id",
            get(get_identification_type)
                .put(update_identification_type)
                .delete(delete_identification_type),
        )
}

/// GET /api/v1/identification-type
pub async fn list_identification_types(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<IdentificationType>>, AppError> {
    let page = query.pagination();

    let items = sqlx::query_as::<_, IdentificationType>(
        "SELECT * FROM identification_types ORDER BY code LIMIT $1 OFFSET $2",
    )
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&state.db_pool)
    .await?;
    let total = count_rows(&state.db_pool, TABLE).await?;

    Ok(Json(ListResponse::new(items, total, page)))
}

/// GET /api/v1/identification-type/:id
pub async fn get_identification_type(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<IdentificationType>, AppError> {
    sqlx::query_as::<_, IdentificationType>("SELECT * FROM identification_types WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// POST /api/v1/identification-type
pub async fn create_identification_type(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateIdentificationTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = sqlx::query_as::<_, IdentificationType>(
        r#"
        INSERT INTO identification_types (id, code, name, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.code.trim())
    .bind(payload.name.trim())
    .bind(payload.description)
    .fetch_one(&state.db_pool)
    .await?;

    info!(id = %item.id, code = %item.code, "✅ Identification type created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/v1/identification-type/:id
pub async fn update_identification_type(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdateIdentificationTypeRequest>,
) -> Result<Json<IdentificationType>, AppError> {
    payload.validate()?;

    sqlx::query_as::<_, IdentificationType>(
        r#"
        UPDATE identification_types
        SET code = COALESCE($2, code),
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.code.as_deref().map(str::trim))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.description)
    .fetch_optional(&state.db_pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// DELETE /api/v1/identification-type/:id
pub async fn delete_identification_type(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state.db_pool, TABLE, RESOURCE, id).await?;
    info!(id = %id, "🗑️ Identification type deleted");
    Ok(StatusCode::NO_CONTENT)
}
