//! Input validation and sanitization module
//!
//! Centralized validation for:
//! - Identity input (usernames, emails, names, passwords)
//! - Monetary amounts
//! - Date and payroll-period parameters

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::errors::AppError;

/// Validation result type
pub type ValidationResult = Result<(), AppError>;

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Validate a username
/// - Length: 3-50 characters
/// - Allowed: alphanumeric, underscore, hyphen
/// - Must start with letter
pub fn validate_username(username: &str) -> ValidationResult {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(invalid("Username tidak boleh kosong"));
    }

    if trimmed.len() < 3 || trimmed.len() > 50 {
        return Err(invalid("Username harus 3-50 karakter"));
    }

    if !trimmed.chars().next().is_some_and(|c| c.is_alphabetic()) {
        return Err(invalid("Username harus dimulai dengan huruf"));
    }

    if !trimmed.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(invalid(
            "Username hanya boleh berisi huruf, angka, underscore, dan hyphen",
        ));
    }

    Ok(())
}

/// Validate a full name
/// - Length: 2-100 characters
/// - Allowed: letters, spaces, basic punctuation
pub fn validate_name(name: &str) -> ValidationResult {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(invalid("Nama tidak boleh kosong"));
    }

    if trimmed.len() < 2 || trimmed.len() > 100 {
        return Err(invalid("Nama harus 2-100 karakter"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || ".-'".contains(c))
    {
        return Err(invalid("Nama hanya boleh berisi huruf, spasi, dan karakter .-'"));
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> ValidationResult {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(invalid("Email tidak boleh kosong"));
    }

    if trimmed.len() > 254 {
        return Err(invalid("Email terlalu panjang (max 254 karakter)"));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(invalid("Email harus berisi '@'"));
    };

    if local.is_empty() || local.len() > 64 {
        return Err(invalid("Bagian lokal email tidak valid"));
    }

    if !domain.contains('.') {
        return Err(invalid("Domain email tidak valid"));
    }

    Ok(())
}

/// Validate password strength
/// - Minimum length: 8 characters
/// - Must contain: uppercase, lowercase, number
pub fn validate_password(password: &str) -> ValidationResult {
    if password.len() < 8 {
        return Err(invalid("Password minimal 8 karakter"));
    }

    if password.len() > 128 {
        return Err(invalid("Password maksimal 128 karakter"));
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_upper || !has_lower || !has_digit {
        return Err(invalid(
            "Password harus mengandung huruf kapital, huruf kecil, dan angka",
        ));
    }

    Ok(())
}

/// Parse tanggal `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(format!("Format tanggal tidak valid: '{}'. Gunakan YYYY-MM-DD", value)))
}

/// Parse periode payroll (`YYYY-MM` atau `YYYY-MM-DD`), dinormalisasi ke
/// tanggal 1 bulan tersebut.
pub fn parse_period(value: &str) -> Result<NaiveDate, AppError> {
    let trimmed = value.trim();

    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d"))
        .map_err(|_| {
            invalid(format!(
                "Format periode tidak valid: '{}'. Gunakan YYYY-MM atau YYYY-MM-DD",
                value
            ))
        })?;

    // with_day(1) selalu valid untuk tanggal yang sudah ter-parse
    date.with_day(1)
        .ok_or_else(|| invalid("Periode tidak valid"))
}

/// Validate rentang tanggal laporan (start <= end).
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult {
    if start > end {
        return Err(invalid("Tanggal awal harus sebelum atau sama dengan tanggal akhir"));
    }
    Ok(())
}

/// Validate monetary amount (non-negative)
pub fn validate_amount(label: &str, amount: Decimal) -> ValidationResult {
    if amount.is_sign_negative() {
        return Err(invalid(format!("{} tidak boleh negatif", label)));
    }
    Ok(())
}

/// Validate alasan penolakan slip gaji
pub fn validate_rejection_reason(reason: &str) -> ValidationResult {
    if reason.len() > 500 {
        return Err(invalid("Alasan terlalu panjang (max 500 karakter)"));
    }
    Ok(())
}
