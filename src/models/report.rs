use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ringkasan dashboard Staff/Manager HR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrSummary {
    pub total_employees: i64,
    /// Total gaji bersih periode berjalan (payslip Processed/Paid)
    pub payroll_this_month: Decimal,
    /// Payslip berstatus Processed yang menunggu keputusan Manager HR
    pub pending_approval: i64,
    pub compliance_rate: i64,
}

/// Ringkasan dashboard Staff Finance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub payroll_verified: i64,
    /// Total gaji bersih yang sudah dibayar
    pub total_payments: Decimal,
    pub pending_payment: i64,
    pub tax_compliance: i64,
}

/// Ringkasan dashboard karyawan (scoped ke satu user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub payroll_this_month: Decimal,
    pub work_days: i64,
    /// Estimasi jam lembur dari nominal lembur dibagi tarif per jam tersirat
    /// (gross / hari kerja / jam per hari) — pendekatan, bukan catatan absensi.
    pub overtime_hours: i64,
    pub pph21_amount: Decimal,
}

/// Satu baris laporan payroll bulanan (group by periode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReportRow {
    /// Periode "YYYY-MM"
    pub period: String,
    pub total_gross_salary: Decimal,
    pub total_net_salary: Decimal,
    pub total_tax: Decimal,
    pub total_bpjs_kesehatan: Decimal,
    pub total_bpjs_ketenagakerjaan: Decimal,
    pub employee_count: i64,
}

/// Satu baris laporan pemotongan PPh21.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pph21ReportEntry {
    pub employee_name: String,
    pub employee_email: String,
    pub npwp: Option<String>,
    /// Periode "YYYY-MM"
    pub period: String,
    pub gross_salary: Decimal,
    pub tax_amount: Decimal,
}
