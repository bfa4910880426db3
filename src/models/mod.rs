pub mod client;
pub mod identification_type;
pub mod invoice;
pub mod issuing_company;
pub mod product;
pub mod user;

use rust_decimal::Decimal;
use shared::AppError;
use validator::ValidationError;

/// `NUMERIC(14, 4)` columns: quantities and unit prices.
pub(crate) const UNIT_AMOUNT_DIGITS: (u32, u32) = (14, 4);
/// `NUMERIC(14, 2)` columns: discounts and every money total.
pub(crate) const MONEY_DIGITS: (u32, u32) = (14, 2);

/// Exactly `len` ASCII digits.
pub(crate) fn require_digits(field: &str, value: &str, len: usize) -> Result<(), AppError> {
    if value.len() == len && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "{} must be exactly {} digits",
            field, len
        )))
    }
}

/// Rejects values whose integer part does not fit a `NUMERIC(precision, scale)` column.
pub(crate) fn require_fits_column(
    field: &str,
    value: Decimal,
    (precision, scale): (u32, u32),
) -> Result<(), AppError> {
    let limit = Decimal::from(10u64.pow(precision - scale));
    if value.abs() < limit {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "{} must be less than {}",
            field, limit
        )))
    }
}

/// Text fields that must carry something besides whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
