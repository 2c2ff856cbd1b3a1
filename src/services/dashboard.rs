use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::auth::{guard, roles, Principal};
use crate::errors::AppError;
use crate::models::activity::ActivityLogWithUser;
use crate::models::report::{EmployeeSummary, FinanceSummary, HrSummary};
use crate::services::activity;
use crate::AppState;

/// Jendela satu bulan: [awal bulan, awal bulan berikutnya).
fn month_window(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let next = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    (start, next.unwrap_or(start))
}

/// Ringkasan HR dengan tanggal acuan eksplisit.
pub async fn hr_summary_at(db: &SqlitePool, today: NaiveDate) -> Result<HrSummary, AppError> {
    let (start, next) = month_window(today);

    let (total_employees,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;

    // Penjumlahan uang di Rust, bukan SUM di SQL, supaya tetap eksak.
    let nets: Vec<(String,)> = sqlx::query_as(
        "SELECT net_salary FROM payslips
         WHERE period >= ? AND period < ? AND status IN ('Processed', 'Paid')",
    )
    .bind(start)
    .bind(next)
    .fetch_all(db)
    .await?;

    let mut payroll_this_month = Decimal::ZERO;
    for (raw,) in &nets {
        payroll_this_month += crate::models::parse_amount("net_salary", raw)?;
    }

    let (pending_approval,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM payslips
         WHERE period >= ? AND period < ? AND status = 'Processed'",
    )
    .bind(start)
    .bind(next)
    .fetch_one(db)
    .await?;

    Ok(HrSummary {
        total_employees,
        payroll_this_month,
        pending_approval,
        // TODO: hitung dari data kepatuhan sungguhan begitu modul compliance ada
        compliance_rate: 98,
    })
}

/// Ringkasan dashboard Staff/Manager HR untuk bulan berjalan.
pub async fn get_hr_summary(
    state: &AppState,
    principal: &Principal,
) -> Result<HrSummary, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR, roles::MANAGER_HR])?;
    hr_summary_at(&state.db, Local::now().date_naive()).await
}

/// Ringkasan finance: verifikasi dan pembayaran tidak dibatasi bulan,
/// keduanya antrean kumulatif lintas periode.
pub async fn finance_summary(db: &SqlitePool) -> Result<FinanceSummary, AppError> {
    let (payroll_verified,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM payslips WHERE status = 'Verified by Finance'")
            .fetch_one(db)
            .await?;

    let nets: Vec<(String,)> =
        sqlx::query_as("SELECT net_salary FROM payslips WHERE status = 'Paid'")
            .fetch_all(db)
            .await?;

    let mut total_payments = Decimal::ZERO;
    for (raw,) in &nets {
        total_payments += crate::models::parse_amount("net_salary", raw)?;
    }

    Ok(FinanceSummary {
        payroll_verified,
        total_payments,
        // Slip terverifikasi menunggu pembayaran
        pending_payment: payroll_verified,
        tax_compliance: 100,
    })
}

pub async fn get_finance_summary(
    state: &AppState,
    principal: &Principal,
) -> Result<FinanceSummary, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_FINANCE, roles::MANAGER_HR])?;
    finance_summary(&state.db).await
}

/// Ringkasan karyawan dengan tanggal acuan eksplisit. Mengambil payslip
/// terbaru milik user di bulan acuan yang sudah Processed/Paid.
pub async fn employee_summary_at(
    db: &SqlitePool,
    user_id: i64,
    today: NaiveDate,
) -> Result<EmployeeSummary, AppError> {
    let (start, next) = month_window(today);
    let payroll = &crate::config::get_config().payroll;

    let latest: Option<(String, String, String, String)> = sqlx::query_as(
        "SELECT net_salary, gross_salary, overtime, tax_amount FROM payslips
         WHERE user_id = ? AND period >= ? AND period < ?
           AND status IN ('Processed', 'Paid')
         ORDER BY created_at DESC, id DESC
         LIMIT 1",
    )
    .bind(user_id)
    .bind(start)
    .bind(next)
    .fetch_optional(db)
    .await?;

    let (net, gross, overtime, pph21_amount) = match latest {
        Some((net_raw, gross_raw, overtime_raw, tax_raw)) => (
            crate::models::parse_amount("net_salary", &net_raw)?,
            crate::models::parse_amount("gross_salary", &gross_raw)?,
            crate::models::parse_amount("overtime", &overtime_raw)?,
            crate::models::parse_amount("tax_amount", &tax_raw)?,
        ),
        None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
    };

    let overtime_hours = estimate_overtime_hours(
        gross,
        overtime,
        payroll.assumed_work_days,
        payroll.work_hours_per_day,
    );

    Ok(EmployeeSummary {
        payroll_this_month: net,
        work_days: payroll.assumed_work_days,
        overtime_hours,
        pph21_amount,
    })
}

/// Jam lembur diestimasi dari nominal lembur dibagi tarif per jam tersirat
/// (gross / hari kerja / jam per hari). Pendekatan, bukan catatan absensi.
/// Gross nol atau konfigurasi jam nol berarti tidak ada tarif tersirat.
fn estimate_overtime_hours(
    gross: Decimal,
    overtime: Decimal,
    work_days: i64,
    hours_per_day: i64,
) -> i64 {
    let hours_in_month = Decimal::from(work_days * hours_per_day);
    if gross <= Decimal::ZERO || hours_in_month <= Decimal::ZERO {
        return 0;
    }
    (overtime / (gross / hours_in_month)).round().to_i64().unwrap_or(0)
}

/// Dashboard karyawan, selalu scoped ke principal sendiri.
pub async fn get_employee_summary(
    state: &AppState,
    principal: &Principal,
) -> Result<EmployeeSummary, AppError> {
    guard::require_any_role(principal, &[roles::KARYAWAN])?;
    employee_summary_at(&state.db, principal.id, Local::now().date_naive()).await
}

/// Aktivitas terbaru untuk widget dashboard HR.
pub async fn get_recent_activities(
    state: &AppState,
    principal: &Principal,
    limit: i64,
) -> Result<Vec<ActivityLogWithUser>, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR, roles::MANAGER_HR])?;
    activity::get_recent_activities(&state.db, limit).await
}
