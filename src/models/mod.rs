pub mod activity;
pub mod payroll;
pub mod payslip;
pub mod report;
pub mod user;

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::errors::AppError;

/// Parse kolom uang TEXT dari database menjadi Decimal.
pub(crate) fn parse_amount(column: &str, raw: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw).map_err(|_| {
        AppError::Internal(format!("Nilai uang tidak valid di kolom {}: '{}'", column, raw))
    })
}
