use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::AppError;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{require_fits_column, validate_not_blank, UNIT_AMOUNT_DIGITS};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    /// Percentage, 0 to 100.
    pub tax_rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 25), custom(function = "validate_not_blank"))]
    pub code: String,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
}

impl CreateProductRequest {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        check_price(self.unit_price)?;
        check_tax_rate(self.tax_rate)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 25), custom(function = "validate_not_blank"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
}

impl UpdateProductRequest {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if let Some(price) = self.unit_price {
            check_price(price)?;
        }
        if let Some(rate) = self.tax_rate {
            check_tax_rate(rate)?;
        }
        Ok(())
    }
}

fn check_price(price: Decimal) -> Result<(), AppError> {
    if price < Decimal::ZERO {
        return Err(AppError::validation("unit_price must not be negative"));
    }
    require_fits_column("unit_price", price, UNIT_AMOUNT_DIGITS)
}

fn check_tax_rate(rate: Decimal) -> Result<(), AppError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(AppError::validation("tax_rate must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn request(unit_price: Decimal, tax_rate: Decimal) -> CreateProductRequest {
        CreateProductRequest {
            code: "SKU-001".into(),
            name: "Resma papel A4".into(),
            description: None,
            unit_price,
            tax_rate,
        }
    }

    #[test]
    fn test_product_limits() {
        assert!(request(d("4.50"), d("15")).check().is_ok());
        assert!(request(d("0"), d("0")).check().is_ok());
        assert!(request(d("-0.01"), d("15")).check().is_err());
        assert!(request(d("1"), d("100.01")).check().is_err());
        assert!(request(d("1"), d("-1")).check().is_err());
        assert!(request(d("9999999999.9999"), d("15")).check().is_ok());
        assert!(request(d("10000000000"), d("15")).check().is_err());
    }

    #[test]
    fn test_blank_code_and_name_are_rejected() {
        let mut blank_code = request(d("1"), d("15"));
        blank_code.code = "   ".into();
        assert!(blank_code.check().is_err());

        let update = UpdateProductRequest {
            code: None,
            name: Some(" \t ".into()),
            description: None,
            unit_price: Some(d("2.50")),
            tax_rate: None,
        };
        assert!(update.check().is_err());
    }
}
