use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::parse_amount;
use crate::errors::AppError;

/// Status slip gaji. `Paid` dan `Verified by Finance` hanya ditulis oleh
/// kolaborator finance di luar core ini; di sini keduanya sekadar nilai
/// at-rest yang valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayslipStatus {
    Pending,
    Processed,
    Approved,
    Rejected,
    Paid,
    #[serde(rename = "Verified by Finance")]
    VerifiedByFinance,
}

impl PayslipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayslipStatus::Pending => "Pending",
            PayslipStatus::Processed => "Processed",
            PayslipStatus::Approved => "Approved",
            PayslipStatus::Rejected => "Rejected",
            PayslipStatus::Paid => "Paid",
            PayslipStatus::VerifiedByFinance => "Verified by Finance",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Pending" => Ok(PayslipStatus::Pending),
            "Processed" => Ok(PayslipStatus::Processed),
            "Approved" => Ok(PayslipStatus::Approved),
            "Rejected" => Ok(PayslipStatus::Rejected),
            "Paid" => Ok(PayslipStatus::Paid),
            "Verified by Finance" => Ok(PayslipStatus::VerifiedByFinance),
            other => Err(AppError::Validation(format!(
                "Status payslip tidak dikenal: '{}'",
                other
            ))),
        }
    }

    /// Slip yang sudah final tidak boleh dihitung ulang.
    pub fn is_finalized(&self) -> bool {
        matches!(
            self,
            PayslipStatus::Approved
                | PayslipStatus::Rejected
                | PayslipStatus::Paid
                | PayslipStatus::VerifiedByFinance
        )
    }
}

/// Baris payslips dari database. Uang sebagai TEXT, details sebagai JSON TEXT.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbPayslip {
    pub id: i64,
    pub user_id: i64,
    pub payroll_process_id: i64,
    pub period: NaiveDate,
    pub gross_salary: String,
    pub total_allowances: String,
    pub overtime: String,
    pub total_deductions: String,
    pub net_salary: String,
    pub tax_amount: String,
    pub bpjs_kesehatan_amount: String,
    pub bpjs_ketenagakerjaan_amount: String,
    pub status: String,
    pub details: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Slip gaji satu karyawan untuk satu periode dalam satu run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payslip {
    pub id: i64,
    pub user_id: i64,
    pub payroll_process_id: i64,
    pub period: NaiveDate,
    pub gross_salary: Decimal,
    pub total_allowances: Decimal,
    pub overtime: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
    pub tax_amount: Decimal,
    pub bpjs_kesehatan_amount: Decimal,
    pub bpjs_ketenagakerjaan_amount: Decimal,
    pub status: PayslipStatus,
    pub details: Option<serde_json::Value>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl TryFrom<DbPayslip> for Payslip {
    type Error = AppError;

    fn try_from(p: DbPayslip) -> Result<Self, AppError> {
        let details = p
            .details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Details payslip bukan JSON valid: {}", e)))?;

        Ok(Self {
            id: p.id,
            user_id: p.user_id,
            payroll_process_id: p.payroll_process_id,
            period: p.period,
            gross_salary: parse_amount("gross_salary", &p.gross_salary)?,
            total_allowances: parse_amount("total_allowances", &p.total_allowances)?,
            overtime: parse_amount("overtime", &p.overtime)?,
            total_deductions: parse_amount("total_deductions", &p.total_deductions)?,
            net_salary: parse_amount("net_salary", &p.net_salary)?,
            tax_amount: parse_amount("tax_amount", &p.tax_amount)?,
            bpjs_kesehatan_amount: parse_amount(
                "bpjs_kesehatan_amount",
                &p.bpjs_kesehatan_amount,
            )?,
            bpjs_ketenagakerjaan_amount: parse_amount(
                "bpjs_ketenagakerjaan_amount",
                &p.bpjs_ketenagakerjaan_amount,
            )?,
            status: PayslipStatus::parse(&p.status)?,
            details,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
    }
}

/// Hasil perhitungan dari kolaborator kalkulasi eksternal. Core ini hanya
/// menyimpan nilainya; aritmetika pajak/BPJS bukan urusan sini.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipCalculation {
    pub gross_salary: Decimal,
    pub total_allowances: Decimal,
    pub overtime: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
    pub tax_amount: Decimal,
    pub bpjs_kesehatan_amount: Decimal,
    pub bpjs_ketenagakerjaan_amount: Decimal,
    /// Rincian komponen (itemized), disimpan apa adanya.
    pub details: Option<serde_json::Value>,
}

/// Baris antrean persetujuan Manager HR (payslip + metadata tampilan).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbApprovalQueueEntry {
    pub id: i64,
    pub user_id: i64,
    pub payroll_process_id: i64,
    pub period: NaiveDate,
    pub net_salary: String,
    pub gross_salary: String,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
    pub employee_name: String,
    pub employee_email: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub payroll_period: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalQueueEntry {
    pub id: i64,
    pub user_id: i64,
    pub payroll_process_id: i64,
    /// Periode "YYYY-MM"
    pub period: String,
    pub net_salary: Decimal,
    pub gross_salary: Decimal,
    pub status: PayslipStatus,
    pub employee_name: String,
    pub employee_email: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl TryFrom<DbApprovalQueueEntry> for ApprovalQueueEntry {
    type Error = AppError;

    fn try_from(e: DbApprovalQueueEntry) -> Result<Self, AppError> {
        Ok(Self {
            id: e.id,
            user_id: e.user_id,
            payroll_process_id: e.payroll_process_id,
            period: e.period.format("%Y-%m").to_string(),
            net_salary: parse_amount("net_salary", &e.net_salary)?,
            gross_salary: parse_amount("gross_salary", &e.gross_salary)?,
            status: PayslipStatus::parse(&e.status)?,
            employee_name: e.employee_name,
            employee_email: e.employee_email,
            department: e.department,
            position: e.position,
            created_at: e.created_at,
        })
    }
}
