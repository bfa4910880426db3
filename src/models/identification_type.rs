use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;

/// Buyer identification kind, e.g. `04` RUC, `05` cédula, `06` pasaporte.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdentificationType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIdentificationTypeRequest {
    #[validate(length(min = 1, max = 10), custom(function = "validate_not_blank"))]
    pub code: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIdentificationTypeRequest {
    #[validate(length(min = 1, max = 10), custom(function = "validate_not_blank"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}
