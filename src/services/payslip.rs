use sqlx::SqlitePool;

use crate::auth::{guard, roles, Principal};
use crate::errors::AppError;
use crate::models::payslip::{DbPayslip, Payslip, PayslipCalculation, PayslipStatus};
use crate::services::payroll;
use crate::validation;
use crate::AppState;

/// Terapkan hasil kalkulasi ke satu payslip dan tandai Processed.
/// Slip yang sudah final (Approved/Rejected/Paid/Verified by Finance)
/// tidak boleh dihitung ulang.
pub async fn apply_payslip_calculation(
    state: &AppState,
    principal: &Principal,
    payslip_id: i64,
    calc: PayslipCalculation,
) -> Result<Payslip, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR, roles::MANAGER_HR])?;

    validation::validate_amount("gross_salary", calc.gross_salary)?;
    validation::validate_amount("total_allowances", calc.total_allowances)?;
    validation::validate_amount("overtime", calc.overtime)?;
    validation::validate_amount("total_deductions", calc.total_deductions)?;
    validation::validate_amount("net_salary", calc.net_salary)?;
    validation::validate_amount("tax_amount", calc.tax_amount)?;
    validation::validate_amount("bpjs_kesehatan_amount", calc.bpjs_kesehatan_amount)?;
    validation::validate_amount("bpjs_ketenagakerjaan_amount", calc.bpjs_ketenagakerjaan_amount)?;

    let mut tx = state.db.begin().await?;

    let target: Option<(String, i64)> =
        sqlx::query_as("SELECT status, payroll_process_id FROM payslips WHERE id = ?")
            .bind(payslip_id)
            .fetch_optional(&mut *tx)
            .await?;

    let (status_raw, process_id) = target.ok_or_else(|| {
        AppError::NotFound(format!("Payslip id {} tidak ditemukan", payslip_id))
    })?;

    let status = PayslipStatus::parse(&status_raw)?;
    if status.is_finalized() {
        return Err(AppError::InvalidState(format!(
            "Payslip berstatus {} sudah final dan tidak bisa dihitung ulang",
            status.as_str()
        )));
    }

    let details_text = calc.details.as_ref().map(|v| v.to_string());

    sqlx::query(
        "UPDATE payslips
         SET gross_salary = ?, total_allowances = ?, overtime = ?, total_deductions = ?,
             net_salary = ?, tax_amount = ?, bpjs_kesehatan_amount = ?,
             bpjs_ketenagakerjaan_amount = ?, details = ?,
             status = 'Processed', updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(calc.gross_salary.to_string())
    .bind(calc.total_allowances.to_string())
    .bind(calc.overtime.to_string())
    .bind(calc.total_deductions.to_string())
    .bind(calc.net_salary.to_string())
    .bind(calc.tax_amount.to_string())
    .bind(calc.bpjs_kesehatan_amount.to_string())
    .bind(calc.bpjs_ketenagakerjaan_amount.to_string())
    .bind(details_text)
    .bind(payslip_id)
    .execute(&mut *tx)
    .await?;

    payroll::reconcile_in_tx(&mut *tx, process_id).await?;

    let row = sqlx::query_as::<_, DbPayslip>("SELECT * FROM payslips WHERE id = ?")
        .bind(payslip_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Payslip::try_from(row)
}

/// Ambil satu payslip berdasarkan id, tanpa guard. Internal.
pub(crate) async fn fetch_payslip(db: &SqlitePool, payslip_id: i64) -> Result<Payslip, AppError> {
    let row = sqlx::query_as::<_, DbPayslip>("SELECT * FROM payslips WHERE id = ?")
        .bind(payslip_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payslip id {} tidak ditemukan", payslip_id)))?;

    Payslip::try_from(row)
}

/// Slip gaji milik principal sendiri, periode terbaru dulu.
pub async fn get_my_payslips(
    state: &AppState,
    principal: &Principal,
) -> Result<Vec<Payslip>, AppError> {
    let rows = sqlx::query_as::<_, DbPayslip>(
        "SELECT * FROM payslips WHERE user_id = ? ORDER BY period DESC, id DESC",
    )
    .bind(principal.id)
    .fetch_all(&state.db)
    .await?;

    rows.into_iter().map(Payslip::try_from).collect()
}

/// Semua payslip lintas karyawan, untuk staf HR dan finance.
pub async fn get_all_payslips(
    state: &AppState,
    principal: &Principal,
) -> Result<Vec<Payslip>, AppError> {
    guard::require_any_role(
        principal,
        &[roles::STAFF_HR, roles::MANAGER_HR, roles::STAFF_FINANCE],
    )?;

    let rows = sqlx::query_as::<_, DbPayslip>(
        "SELECT * FROM payslips ORDER BY period DESC, id DESC",
    )
    .fetch_all(&state.db)
    .await?;

    rows.into_iter().map(Payslip::try_from).collect()
}

/// Satu payslip berdasarkan id. Karyawan hanya boleh melihat miliknya
/// sendiri; staf HR boleh melihat semua.
pub async fn get_payslip_by_id(
    state: &AppState,
    principal: &Principal,
    payslip_id: i64,
) -> Result<Payslip, AppError> {
    let payslip = fetch_payslip(&state.db, payslip_id).await?;
    guard::require_self_or_any_role(
        principal,
        payslip.user_id,
        &[roles::STAFF_HR, roles::MANAGER_HR],
    )?;
    Ok(payslip)
}
