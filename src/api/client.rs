// ============================================================================
// CLIENTS - Compradores a los que se emite factura
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
    models::client::{Client, CreateClientRequest, UpdateClientRequest},
    state::AppState,
};

const TABLE: &str = "clients";
const RESOURCE: &str = "Client";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

/// GET /api/v1/client
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Client>>, AppError> {
    let page = query.pagination();

    let items = sqlx::query_as::<_, Client>(
        "SELECT * FROM clients ORDER BY name, identification LIMIT $1 OFFSET $2",
    )
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&state.db_pool)
    .await?;
    let total = count_rows(&state.db_pool, TABLE).await?;

    Ok(Json(ListResponse::new(items, total, page)))
}

/// GET /api/v1/client/:id
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<Client>, AppError> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// POST /api/v1/client
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (id, identification_type_id, identification, name, email, phone, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.identification_type_id)
    .bind(payload.identification.trim())
    .bind(payload.name.trim())
    .bind(payload.email)
    .bind(payload.phone)
    .bind(payload.address)
    .fetch_one(&state.db_pool)
    .await?;

    info!(id = %client.id, identification = %client.identification, "✅ Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// PUT /api/v1/client/:id
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdateClientRequest>,
) -> Result<Json<Client>, AppError> {
    payload.validate()?;

    sqlx::query_as::<_, Client>(
        r#"
        UPDATE clients
        SET identification_type_id = COALESCE($2, identification_type_id),
            identification = COALESCE($3, identification),
            name = COALESCE($4, name),
            email = COALESCE($5, email),
            phone = COALESCE($6, phone),
            address = COALESCE($7, address),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.identification_type_id)
    .bind(payload.identification.as_deref().map(str::trim))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.email)
    .bind(payload.phone)
    .bind(payload.address)
    .fetch_optional(&state.db_pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::not_found(format!("{} {}", RESOURCE, id)))
}

/// DELETE /api/v1/client/:id
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state.db_pool, TABLE, RESOURCE, id).await?;
    info!(id = %id, "🗑️ Client deleted");
    Ok(StatusCode::NO_CONTENT)
}
