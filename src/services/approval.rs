use chrono::Utc;
use serde_json::{Map, Value};

use crate::auth::{guard, roles, Principal};
use crate::errors::AppError;
use crate::models::payslip::{
    ApprovalQueueEntry, DbApprovalQueueEntry, DbPayslip, Payslip, PayslipStatus,
};
use crate::services::{activity, payroll};
use crate::validation;
use crate::AppState;

/// Antrean persetujuan Manager HR: semua payslip berstatus Processed,
/// urut paling lama dulu (FIFO).
pub async fn list_payslips_for_approval(
    state: &AppState,
    principal: &Principal,
) -> Result<Vec<ApprovalQueueEntry>, AppError> {
    guard::require_any_role(principal, &[roles::MANAGER_HR])?;

    let rows = sqlx::query_as::<_, DbApprovalQueueEntry>(
        r#"
        SELECT ps.id, ps.user_id, ps.payroll_process_id, ps.period,
               ps.net_salary, ps.gross_salary, ps.status, ps.created_at,
               u.name AS employee_name, u.email AS employee_email,
               u.department, u.position,
               pp.payroll_period
        FROM payslips ps
        JOIN users u ON ps.user_id = u.id
        JOIN payroll_processes pp ON ps.payroll_process_id = pp.id
        WHERE ps.status = 'Processed'
        ORDER BY ps.created_at ASC, ps.id ASC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    rows.into_iter().map(ApprovalQueueEntry::try_from).collect()
}

/// Setujui satu payslip. Hanya dari status Processed; transisi, log
/// aktivitas, dan rekonsiliasi counter run berjalan dalam satu transaksi.
pub async fn approve_payslip(
    state: &AppState,
    principal: &Principal,
    payslip_id: i64,
) -> Result<Payslip, AppError> {
    guard::require_any_role(principal, &[roles::MANAGER_HR])?;

    let mut tx = state.db.begin().await?;

    let target: Option<(String, chrono::NaiveDate, i64, String)> = sqlx::query_as(
        r#"
        SELECT ps.status, ps.period, ps.payroll_process_id, u.name
        FROM payslips ps
        JOIN users u ON ps.user_id = u.id
        WHERE ps.id = ?
        "#,
    )
    .bind(payslip_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (status_raw, period, process_id, employee_name) = target.ok_or_else(|| {
        AppError::NotFound(format!("Payslip id {} tidak ditemukan", payslip_id))
    })?;

    let status = PayslipStatus::parse(&status_raw)?;
    if status != PayslipStatus::Processed {
        return Err(AppError::InvalidState(format!(
            "Payslip berstatus {} tidak bisa disetujui, harus Processed",
            status.as_str()
        )));
    }

    // Guard WHERE status menolak pemenang kedua kalau ada dua approval
    // bersamaan untuk slip yang sama.
    let updated = sqlx::query(
        "UPDATE payslips
         SET status = 'Approved', updated_at = CURRENT_TIMESTAMP
         WHERE id = ? AND status = 'Processed'",
    )
    .bind(payslip_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::InvalidState(
            "Payslip sudah berubah status, persetujuan dibatalkan".to_string(),
        ));
    }

    activity::record_in_tx(
        &mut *tx,
        &format!(
            "Payslip for {} for {} approved.",
            employee_name,
            period.format("%Y-%m")
        ),
        "Payroll Approval",
        Some(principal.id),
    )
    .await?;

    payroll::reconcile_in_tx(&mut *tx, process_id).await?;

    let row = sqlx::query_as::<_, DbPayslip>("SELECT * FROM payslips WHERE id = ?")
        .bind(payslip_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    crate::log_info!(
        "APPROVAL",
        "Payslip disetujui",
        serde_json::json!({
            "payslip_id": payslip_id,
            "process_id": process_id,
            "approved_by": principal.id,
        })
    );

    Payslip::try_from(row)
}

/// Tolak satu payslip. Alasan (atau alasan default dari config) disimpan di
/// kolom `details` bersama stempel waktu dan id penolak; key lain dipertahankan.
pub async fn reject_payslip(
    state: &AppState,
    principal: &Principal,
    payslip_id: i64,
    reason: Option<String>,
) -> Result<Payslip, AppError> {
    guard::require_any_role(principal, &[roles::MANAGER_HR])?;

    if let Some(ref r) = reason {
        validation::validate_rejection_reason(r)?;
    }

    let mut tx = state.db.begin().await?;

    let target: Option<(String, chrono::NaiveDate, i64, Option<String>, String)> = sqlx::query_as(
        r#"
        SELECT ps.status, ps.period, ps.payroll_process_id, ps.details, u.name
        FROM payslips ps
        JOIN users u ON ps.user_id = u.id
        WHERE ps.id = ?
        "#,
    )
    .bind(payslip_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (status_raw, period, process_id, details_raw, employee_name) = target.ok_or_else(|| {
        AppError::NotFound(format!("Payslip id {} tidak ditemukan", payslip_id))
    })?;

    let status = PayslipStatus::parse(&status_raw)?;
    if status != PayslipStatus::Processed {
        return Err(AppError::InvalidState(format!(
            "Payslip berstatus {} tidak bisa ditolak, harus Processed",
            status.as_str()
        )));
    }

    let reason_text = reason.unwrap_or_else(|| {
        crate::config::get_config()
            .payroll
            .default_rejection_reason
            .clone()
    });

    let details = merge_rejection_details(details_raw.as_deref(), &reason_text, principal.id)?;

    let updated = sqlx::query(
        "UPDATE payslips
         SET status = 'Rejected', details = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ? AND status = 'Processed'",
    )
    .bind(details.to_string())
    .bind(payslip_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::InvalidState(
            "Payslip sudah berubah status, penolakan dibatalkan".to_string(),
        ));
    }

    activity::record_in_tx(
        &mut *tx,
        &format!(
            "Payslip for {} for {} rejected. Reason: {}",
            employee_name,
            period.format("%Y-%m"),
            reason_text
        ),
        "Payroll Approval",
        Some(principal.id),
    )
    .await?;

    payroll::reconcile_in_tx(&mut *tx, process_id).await?;

    let row = sqlx::query_as::<_, DbPayslip>("SELECT * FROM payslips WHERE id = ?")
        .bind(payslip_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    crate::log_info!(
        "APPROVAL",
        "Payslip ditolak",
        serde_json::json!({
            "payslip_id": payslip_id,
            "process_id": process_id,
            "rejected_by": principal.id,
            "reason": reason_text,
        })
    );

    Payslip::try_from(row)
}

/// Gabungkan metadata penolakan ke details existing tanpa membuang
/// rincian kalkulasi yang sudah ada.
fn merge_rejection_details(
    existing: Option<&str>,
    reason: &str,
    rejected_by: i64,
) -> Result<Value, AppError> {
    let mut map: Map<String, Value> = match existing {
        Some(raw) => serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default(),
        None => Map::new(),
    };

    map.insert("rejectionReason".to_string(), Value::String(reason.to_string()));
    map.insert(
        "rejectedAt".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    map.insert("rejectedBy".to_string(), Value::from(rejected_by));

    Ok(Value::Object(map))
}
