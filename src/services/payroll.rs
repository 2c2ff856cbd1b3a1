use sqlx::{SqliteConnection, SqlitePool};

use crate::auth::{guard, roles, Principal};
use crate::errors::AppError;
use crate::models::payroll::{
    derive_run_status, DbPayrollProcess, PayrollProcess, RunStatus, RunStatusView, RunSummary,
    StartPayrollPayload,
};
use crate::validation;
use crate::AppState;

/// Status proses payroll berjalan untuk dashboard HR. Tanpa side effect.
/// Jika belum ada proses sama sekali, view disintesis dari jumlah user aktif.
pub async fn get_current_payroll_status(
    state: &AppState,
    principal: &Principal,
) -> Result<RunStatusView, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR, roles::MANAGER_HR])?;

    let latest = sqlx::query_as::<_, DbPayrollProcess>(
        "SELECT * FROM payroll_processes ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(&state.db)
    .await?;

    match latest {
        Some(row) => {
            let process = PayrollProcess::try_from(row)?;
            Ok(RunStatusView {
                payroll_period: Some(process.payroll_period.format("%Y-%m").to_string()),
                payment_date: Some(process.payment_date.format("%Y-%m-%d").to_string()),
                total_employees: process.total_employees,
                processed: process.processed_count,
                pending: process.pending_count,
                status: Some(process.status),
            })
        }
        None => {
            let (active_users,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM users WHERE status = 'active'")
                    .fetch_one(&state.db)
                    .await?;

            Ok(RunStatusView {
                payroll_period: None,
                payment_date: None,
                total_employees: active_users,
                processed: 0,
                pending: active_users,
                status: None,
            })
        }
    }
}

/// Mulai proses payroll untuk satu periode: snapshot user aktif, buat run,
/// dan buat satu payslip kosong per user — semuanya dalam satu transaksi.
///
/// Pre-check Pending/Processing memberi pesan konflik yang ramah; penjaga
/// race yang sesungguhnya adalah UNIQUE(payroll_period) di database.
pub async fn initiate_payroll_process(
    state: &AppState,
    principal: &Principal,
    payload: StartPayrollPayload,
) -> Result<RunSummary, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR])?;

    let period = validation::parse_period(&payload.payroll_period)?;
    let payment_date = validation::parse_date(&payload.payment_date)?;

    let mut tx = state.db.begin().await?;

    let existing: Option<(String,)> = sqlx::query_as(
        "SELECT status FROM payroll_processes
         WHERE payroll_period = ? AND status IN ('Pending', 'Processing')",
    )
    .bind(period)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some((status,)) = existing {
        return Err(AppError::Conflict(format!(
            "Proses payroll untuk periode {} sudah ada dan berstatus {}",
            period.format("%Y-%m"),
            status
        )));
    }

    let active_users: Vec<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE status = 'active' ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;
    let total = active_users.len() as i64;
    let initial_status = if total == 0 {
        RunStatus::NoEmployees
    } else {
        RunStatus::Pending
    };

    let inserted = sqlx::query(
        "INSERT INTO payroll_processes
            (payroll_period, payment_date, total_employees, processed_count, pending_count,
             status, started_by_user_id)
         VALUES (?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(period)
    .bind(payment_date)
    .bind(total)
    .bind(total)
    .bind(initial_status.as_str())
    .bind(principal.id)
    .execute(&mut *tx)
    .await;

    let process_id = match inserted {
        Ok(res) => res.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(format!(
                "Proses payroll untuk periode {} sudah ada",
                period.format("%Y-%m")
            )));
        }
        Err(e) => return Err(e.into()),
    };

    // Payslip kosong per user aktif. OR IGNORE = de-duplikasi defensif pada
    // UNIQUE(user_id, period, payroll_process_id).
    for (user_id,) in &active_users {
        sqlx::query(
            "INSERT OR IGNORE INTO payslips (user_id, payroll_process_id, period, status)
             VALUES (?, ?, ?, 'Pending')",
        )
        .bind(user_id)
        .bind(process_id)
        .bind(period)
        .execute(&mut *tx)
        .await?;
    }

    crate::services::activity::record_in_tx(
        &mut *tx,
        &format!(
            "Payroll process for {} started ({} employees).",
            period.format("%Y-%m"),
            total
        ),
        "Payroll Process",
        Some(principal.id),
    )
    .await?;

    tx.commit().await?;

    crate::log_info!(
        "PAYROLL",
        "Proses payroll dimulai",
        serde_json::json!({
            "process_id": process_id,
            "period": period.format("%Y-%m").to_string(),
            "total_employees": total,
            "started_by": principal.id,
        })
    );

    Ok(RunSummary {
        process_id,
        payroll_period: period.format("%Y-%m").to_string(),
        payment_date,
        total_employees: total,
        processed: 0,
        pending: total,
        status: initial_status,
    })
}

/// Hitung ulang counter run dari distribusi status payslip saat ini.
/// Selalu rekomputasi penuh, tidak pernah increment, supaya tidak drift.
pub async fn reconcile_payroll_counts(
    state: &AppState,
    process_id: i64,
) -> Result<PayrollProcess, AppError> {
    let mut tx = state.db.begin().await?;
    reconcile_in_tx(&mut *tx, process_id).await?;
    tx.commit().await?;

    get_payroll_process(&state.db, process_id).await
}

/// Versi dalam-transaksi, dipanggil setiap mutasi payslip
/// (kalkulasi, approve, reject) di transaksi yang sama.
pub(crate) async fn reconcile_in_tx(
    conn: &mut SqliteConnection,
    process_id: i64,
) -> Result<(), AppError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM payroll_processes WHERE id = ?")
        .bind(process_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Proses payroll id {} tidak ditemukan",
            process_id
        )));
    }

    let (processed,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM payslips
         WHERE payroll_process_id = ? AND status IN ('Processed', 'Paid')",
    )
    .bind(process_id)
    .fetch_one(&mut *conn)
    .await?;

    let (pending,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM payslips WHERE payroll_process_id = ? AND status = 'Pending'",
    )
    .bind(process_id)
    .fetch_one(&mut *conn)
    .await?;

    let (completed,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM payslips WHERE payroll_process_id = ? AND status != 'Pending'",
    )
    .bind(process_id)
    .fetch_one(&mut *conn)
    .await?;

    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM payslips WHERE payroll_process_id = ?")
            .bind(process_id)
            .fetch_one(&mut *conn)
            .await?;

    let status = derive_run_status(processed, pending, completed, total);

    sqlx::query(
        "UPDATE payroll_processes
         SET processed_count = ?, pending_count = ?, status = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(processed)
    .bind(pending)
    .bind(status.as_str())
    .bind(process_id)
    .execute(&mut *conn)
    .await?;

    crate::log_debug!(
        "PAYROLL",
        &format!(
            "Rekonsiliasi run {}: processed={} pending={} total={} status={}",
            process_id,
            processed,
            pending,
            total,
            status.as_str()
        )
    );

    Ok(())
}

/// Ambil satu run berdasarkan id.
pub async fn get_payroll_process(
    db: &SqlitePool,
    process_id: i64,
) -> Result<PayrollProcess, AppError> {
    let row = sqlx::query_as::<_, DbPayrollProcess>("SELECT * FROM payroll_processes WHERE id = ?")
        .bind(process_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Proses payroll id {} tidak ditemukan", process_id))
        })?;

    PayrollProcess::try_from(row)
}
