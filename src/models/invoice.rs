//! Invoices, their detail lines and the arithmetic that ties them together.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use shared::AppError;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use super::{
    client::Client, issuing_company::IssuingCompany, require_fits_column, validate_not_blank,
    MONEY_DIGITS, UNIT_AMOUNT_DIGITS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(InvoiceStatus::Draft),
            "issued" => Some(InvoiceStatus::Issued),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }

    /// draft → issued → cancelled, and draft → cancelled.
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Draft)
                | (Draft, Issued)
                | (Draft, Cancelled)
                | (Issued, Issued)
                | (Issued, Cancelled)
                | (Cancelled, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub issuing_company_id: Uuid,
    pub client_id: Uuid,
    pub sequential: i64,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn status(&self) -> Result<InvoiceStatus, AppError> {
        InvoiceStatus::parse(&self.status)
            .ok_or_else(|| AppError::internal(format!("Unknown invoice status '{}'", self.status)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceDetail {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceWithDetails {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub details: Vec<InvoiceDetail>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub issuing_company_id: Uuid,
    pub client_id: Uuid,
    pub issue_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
    pub status: Option<InvoiceStatus>,
    pub issue_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceDetailRequest {
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Defaults to the product's price.
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount: Decimal,
    /// Defaults to the product's name.
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub description: Option<String>,
}

impl CreateInvoiceDetailRequest {
    /// Everything that can be rejected before the invoice is locked.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        check_line_inputs(Some(self.quantity), self.unit_price, Some(self.discount))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvoiceDetailRequest {
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub description: Option<String>,
}

impl UpdateInvoiceDetailRequest {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        check_line_inputs(self.quantity, self.unit_price, self.discount)
    }
}

fn check_line_inputs(
    quantity: Option<Decimal>,
    unit_price: Option<Decimal>,
    discount: Option<Decimal>,
) -> Result<(), AppError> {
    if let Some(quantity) = quantity {
        require_fits_column("quantity", quantity, UNIT_AMOUNT_DIGITS)?;
    }
    if let Some(unit_price) = unit_price {
        require_fits_column("unit_price", unit_price, UNIT_AMOUNT_DIGITS)?;
    }
    if let Some(discount) = discount {
        require_fits_column("discount", discount, MONEY_DIGITS)?;
    }
    Ok(())
}

/// `EEE-PPP-SSSSSSSSS`
pub fn format_invoice_number(establishment_code: &str, emission_point: &str, sequential: i64) -> String {
    format!("{}-{}-{:09}", establishment_code, emission_point, sequential)
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Amounts of one detail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl LineAmounts {
    pub fn compute(
        quantity: Decimal,
        unit_price: Decimal,
        discount: Decimal,
        tax_rate: Decimal,
    ) -> Result<Self, AppError> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::validation("quantity must be greater than 0"));
        }
        if unit_price < Decimal::ZERO {
            return Err(AppError::validation("unit_price must not be negative"));
        }
        if discount < Decimal::ZERO {
            return Err(AppError::validation("discount must not be negative"));
        }

        check_line_inputs(Some(quantity), Some(unit_price), Some(discount))?;

        let out_of_range = || AppError::validation("line amount is out of range");
        let gross = quantity.checked_mul(unit_price).ok_or_else(out_of_range)?;
        let subtotal = round_money(gross.checked_sub(discount).ok_or_else(out_of_range)?);
        if subtotal < Decimal::ZERO {
            return Err(AppError::validation("discount exceeds the line amount"));
        }
        let tax_amount = round_money(
            subtotal
                .checked_mul(tax_rate)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(out_of_range)?,
        );
        let total = subtotal.checked_add(tax_amount).ok_or_else(out_of_range)?;
        require_fits_column("line total", total, MONEY_DIGITS)?;

        Ok(Self {
            subtotal,
            tax_amount,
            total,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub tax_rate: Decimal,
    pub taxable_base: Decimal,
    pub tax_amount: Decimal,
}

/// Groups line amounts by tax rate, lowest rate first.
pub fn tax_breakdown(details: &[InvoiceDetail]) -> Vec<TaxBreakdown> {
    let mut by_rate: BTreeMap<Decimal, (Decimal, Decimal)> = BTreeMap::new();
    for detail in details {
        let entry = by_rate.entry(detail.tax_rate.normalize()).or_default();
        entry.0 += detail.subtotal;
        entry.1 += detail.tax_amount;
    }

    by_rate
        .into_iter()
        .map(|(tax_rate, (taxable_base, tax_amount))| TaxBreakdown {
            tax_rate,
            taxable_base,
            tax_amount,
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    pub taxes: Vec<TaxBreakdown>,
}

/// Printable rendition of an invoice, the payload of the invoice-pdf router.
#[derive(Debug, Serialize)]
pub struct InvoiceDocument {
    pub company: IssuingCompany,
    pub client: Client,
    pub client_identification_type: String,
    pub invoice: Invoice,
    pub lines: Vec<InvoiceDetail>,
    pub totals: InvoiceTotals,
    pub generated_at: DateTime<Utc>,
}

impl InvoiceDocument {
    pub fn new(
        company: IssuingCompany,
        client: Client,
        client_identification_type: String,
        invoice: Invoice,
        lines: Vec<InvoiceDetail>,
    ) -> Self {
        let totals = InvoiceTotals {
            subtotal: invoice.subtotal,
            tax_total: invoice.tax_total,
            total: invoice.total,
            taxes: tax_breakdown(&lines),
        };

        Self {
            company,
            client,
            client_identification_type,
            invoice,
            lines,
            totals,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn detail(subtotal: &str, tax_rate: &str, tax_amount: &str) -> InvoiceDetail {
        InvoiceDetail {
            id: Uuid::new_v4(),
            invoice_id: Uuid::nil(),
            product_id: Uuid::new_v4(),
            description: "item".into(),
            quantity: d("1"),
            unit_price: d(subtotal),
            discount: Decimal::ZERO,
            subtotal: d(subtotal),
            tax_rate: d(tax_rate),
            tax_amount: d(tax_amount),
            total: d(subtotal) + d(tax_amount),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_number_is_zero_padded() {
        assert_eq!(format_invoice_number("001", "002", 42), "001-002-000000042");
        assert_eq!(format_invoice_number("001", "001", 123456789), "001-001-123456789");
    }

    #[test]
    fn test_line_amounts_with_discount() {
        let amounts = LineAmounts::compute(d("3"), d("10.50"), d("1.50"), d("15")).unwrap();
        assert_eq!(amounts.subtotal, d("30.00"));
        assert_eq!(amounts.tax_amount, d("4.50"));
        assert_eq!(amounts.total, d("34.50"));
    }

    #[test]
    fn test_line_amounts_round_half_up() {
        // 0.3333 * 12% = 0.0396 → 0.04
        let amounts = LineAmounts::compute(d("1"), d("0.3333"), d("0"), d("12")).unwrap();
        assert_eq!(amounts.subtotal, d("0.33"));
        assert_eq!(amounts.tax_amount, d("0.04"));
        assert_eq!(amounts.total, d("0.37"));

        // 0.25 * 10% = 0.025 → 0.03
        let amounts = LineAmounts::compute(d("1"), d("0.25"), d("0"), d("10")).unwrap();
        assert_eq!(amounts.tax_amount, d("0.03"));
    }

    #[test]
    fn test_line_amounts_reject_bad_input() {
        assert!(LineAmounts::compute(d("0"), d("1"), d("0"), d("15")).is_err());
        assert!(LineAmounts::compute(d("1"), d("-1"), d("0"), d("15")).is_err());
        assert!(LineAmounts::compute(d("1"), d("1"), d("-1"), d("15")).is_err());
        assert!(LineAmounts::compute(d("1"), d("5"), d("5.01"), d("15")).is_err());
    }

    #[test]
    fn test_line_amounts_out_of_range_are_validation_errors() {
        let huge = d("79228162514264337593543950335");
        let err = LineAmounts::compute(huge, d("2"), d("0"), d("100")).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        // Each input fits its column, the product does not.
        let err = LineAmounts::compute(d("9999999999"), d("9999999999"), d("0"), d("15")).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        // Subtotal fits, subtotal plus tax does not.
        let err = LineAmounts::compute(d("100"), d("9999999999"), d("0"), d("100")).unwrap_err();
        assert!(err.to_string().contains("line total"));
    }

    #[test]
    fn test_detail_request_bounds_amounts_and_description() {
        let request = CreateInvoiceDetailRequest {
            invoice_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: d("99999999999"),
            unit_price: None,
            discount: Decimal::ZERO,
            description: None,
        };
        assert!(request.check().unwrap_err().to_string().contains("quantity"));

        let request = UpdateInvoiceDetailRequest {
            quantity: None,
            unit_price: None,
            discount: None,
            description: Some("   ".into()),
        };
        assert!(request.check().is_err());

        let request = UpdateInvoiceDetailRequest {
            quantity: Some(d("2")),
            unit_price: Some(d("10.25")),
            discount: None,
            description: Some("Resma papel A4".into()),
        };
        assert!(request.check().is_ok());
    }

    #[test]
    fn test_status_transitions() {
        use InvoiceStatus::*;
        assert!(Draft.can_transition_to(Issued));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Issued.can_transition_to(Cancelled));
        assert!(!Issued.can_transition_to(Draft));
        assert!(!Cancelled.can_transition_to(Draft));
        assert!(!Cancelled.can_transition_to(Issued));
    }

    #[test]
    fn test_status_round_trips_through_its_name() {
        for status in [InvoiceStatus::Draft, InvoiceStatus::Issued, InvoiceStatus::Cancelled] {
            assert_eq!(InvoiceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(InvoiceStatus::parse("paid"), None);
    }

    #[test]
    fn test_tax_breakdown_groups_by_rate() {
        let details = vec![
            detail("10.00", "15", "1.50"),
            detail("4.00", "0", "0.00"),
            detail("20.00", "15.00", "3.00"),
        ];

        let breakdown = tax_breakdown(&details);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].tax_rate, d("0"));
        assert_eq!(breakdown[0].taxable_base, d("4.00"));
        assert_eq!(breakdown[1].tax_rate, d("15"));
        assert_eq!(breakdown[1].taxable_base, d("30.00"));
        assert_eq!(breakdown[1].tax_amount, d("4.50"));
    }
}
