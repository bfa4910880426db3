use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::AppError;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{require_digits, validate_not_blank};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IssuingCompany {
    pub id: Uuid,
    pub ruc: String,
    pub business_name: String,
    pub trade_name: Option<String>,
    pub main_address: String,
    pub establishment_code: String,
    pub emission_point: String,
    pub requires_accounting: bool,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Next invoice sequential to hand out.
    pub next_sequential: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIssuingCompanyRequest {
    pub ruc: String,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub business_name: String,
    #[validate(length(max = 300))]
    pub trade_name: Option<String>,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub main_address: String,
    pub establishment_code: String,
    pub emission_point: String,
    #[serde(default)]
    pub requires_accounting: bool,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

impl CreateIssuingCompanyRequest {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        require_digits("ruc", &self.ruc, 13)?;
        require_digits("establishment_code", &self.establishment_code, 3)?;
        require_digits("emission_point", &self.emission_point, 3)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIssuingCompanyRequest {
    pub ruc: Option<String>,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub business_name: Option<String>,
    #[validate(length(max = 300))]
    pub trade_name: Option<String>,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub main_address: Option<String>,
    pub establishment_code: Option<String>,
    pub emission_point: Option<String>,
    pub requires_accounting: Option<bool>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

impl UpdateIssuingCompanyRequest {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if let Some(ruc) = &self.ruc {
            require_digits("ruc", ruc, 13)?;
        }
        if let Some(code) = &self.establishment_code {
            require_digits("establishment_code", code, 3)?;
        }
        if let Some(point) = &self.emission_point {
            require_digits("emission_point", point, 3)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateIssuingCompanyRequest {
        CreateIssuingCompanyRequest {
            ruc: "1790012345001".into(),
            business_name: "Comercial Andina S.A.".into(),
            trade_name: None,
            main_address: "Av. Amazonas N34-120, Quito".into(),
            establishment_code: "001".into(),
            emission_point: "002".into(),
            requires_accounting: true,
            email: Some("facturacion@andina.ec".into()),
            phone: None,
        }
    }

    #[test]
    fn test_valid_company_passes() {
        assert!(request().check().is_ok());
    }

    #[test]
    fn test_short_ruc_is_rejected() {
        let mut req = request();
        req.ruc = "17900123".into();
        assert!(matches!(req.check(), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let mut req = request();
        req.email = Some("not-an-email".into());
        assert!(matches!(req.check(), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_blank_business_name_is_rejected() {
        let mut req = request();
        req.business_name = "    ".into();
        assert!(matches!(req.check(), Err(AppError::Validation { .. })));
    }
}
