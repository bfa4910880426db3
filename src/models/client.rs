use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub identification_type_id: Uuid,
    pub identification: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    pub identification_type_id: Uuid,
    #[validate(length(min = 1, max = 20), custom(function = "validate_not_blank"))]
    pub identification: String,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    pub identification_type_id: Option<Uuid>,
    #[validate(length(min = 1, max = 20), custom(function = "validate_not_blank"))]
    pub identification: Option<String>,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
}
