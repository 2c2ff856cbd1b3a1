use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Status satu run penggajian. Turunan murni dari distribusi status payslip,
/// tidak pernah di-increment in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Processing,
    Completed,
    #[serde(rename = "No Employees")]
    NoEmployees,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "Pending",
            RunStatus::Processing => "Processing",
            RunStatus::Completed => "Completed",
            RunStatus::NoEmployees => "No Employees",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Pending" => Ok(RunStatus::Pending),
            "Processing" => Ok(RunStatus::Processing),
            "Completed" => Ok(RunStatus::Completed),
            "No Employees" => Ok(RunStatus::NoEmployees),
            other => Err(AppError::Validation(format!(
                "Status proses payroll tidak dikenal: '{}'",
                other
            ))),
        }
    }
}

/// Turunkan status run dari hitungan payslip saat ini.
///
/// `processed` = payslip Processed/Paid, `pending` = Pending,
/// `completed` = semua yang bukan Pending (termasuk Approved/Rejected/
/// Verified by Finance). Run dinyatakan Completed saat tidak ada lagi
/// payslip Pending, bukan saat semuanya persis Processed/Paid.
pub fn derive_run_status(processed: i64, pending: i64, completed: i64, total: i64) -> RunStatus {
    if total == 0 {
        RunStatus::NoEmployees
    } else if completed == total {
        RunStatus::Completed
    } else if processed == 0 && pending == total {
        RunStatus::Pending
    } else {
        RunStatus::Processing
    }
}

/// Baris payroll_processes dari database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbPayrollProcess {
    pub id: i64,
    pub payroll_period: NaiveDate,
    pub payment_date: NaiveDate,
    pub total_employees: i64,
    pub processed_count: i64,
    pub pending_count: i64,
    pub status: String,
    pub started_by_user_id: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Satu run penggajian.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollProcess {
    pub id: i64,
    pub payroll_period: NaiveDate,
    pub payment_date: NaiveDate,
    pub total_employees: i64,
    pub processed_count: i64,
    pub pending_count: i64,
    pub status: RunStatus,
    pub started_by_user_id: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl TryFrom<DbPayrollProcess> for PayrollProcess {
    type Error = AppError;

    fn try_from(p: DbPayrollProcess) -> Result<Self, AppError> {
        Ok(Self {
            id: p.id,
            payroll_period: p.payroll_period,
            payment_date: p.payment_date,
            total_employees: p.total_employees,
            processed_count: p.processed_count,
            pending_count: p.pending_count,
            status: RunStatus::parse(&p.status)?,
            started_by_user_id: p.started_by_user_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
    }
}

/// Tampilan status payroll berjalan untuk dashboard HR.
/// `status` None berarti belum ada proses sama sekali; `total_employees`
/// dan `pending` lalu diisi dari jumlah user aktif saat ini.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatusView {
    /// Periode "YYYY-MM"
    pub payroll_period: Option<String>,
    /// Tanggal pembayaran "YYYY-MM-DD"
    pub payment_date: Option<String>,
    pub total_employees: i64,
    pub processed: i64,
    pub pending: i64,
    pub status: Option<RunStatus>,
}

/// Ringkasan run yang baru dimulai.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub process_id: i64,
    /// Periode "YYYY-MM"
    pub payroll_period: String,
    pub payment_date: NaiveDate,
    pub total_employees: i64,
    pub processed: i64,
    pub pending: i64,
    pub status: RunStatus,
}

/// Payload untuk memulai proses payroll.
#[derive(Debug, Clone, Deserialize)]
pub struct StartPayrollPayload {
    /// "YYYY-MM" atau "YYYY-MM-01"
    pub payroll_period: String,
    /// "YYYY-MM-DD"
    pub payment_date: String,
}
