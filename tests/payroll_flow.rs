mod common;

use common::*;
use payroll_sarana::errors::AppError;
use payroll_sarana::models::payroll::{RunStatus, StartPayrollPayload};
use payroll_sarana::models::payslip::PayslipStatus;
use payroll_sarana::services::{approval, dashboard, payroll, payslip};
use rust_decimal::Decimal;

fn start_payload(period: &str) -> StartPayrollPayload {
    StartPayrollPayload {
        payroll_period: period.to_string(),
        payment_date: format!("{}-28", period),
    }
}

#[tokio::test]
async fn initiate_creates_run_and_pending_payslips() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", Some("10000000"), "active", &["Karyawan"]).await;
    seed_user(&state, "citra", "Citra Lestari", Some("8500000"), "active", &["Karyawan"]).await;
    seed_user(&state, "dodi", "Dodi Resign", Some("9000000"), "inactive", &["Karyawan"]).await;

    let summary = payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();

    // HR sendiri ikut digaji: 3 user aktif termasuk staff HR
    assert_eq!(summary.payroll_period, "2025-06");
    assert_eq!(summary.total_employees, 3);
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.pending, 3);
    assert_eq!(summary.status, RunStatus::Pending);

    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();
    assert_eq!(slips.len(), 3);
    assert!(slips.iter().all(|s| s.status == PayslipStatus::Pending));
    assert!(slips.iter().all(|s| s.net_salary == Decimal::ZERO));
}

#[tokio::test]
async fn initiate_same_period_twice_conflicts() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();

    let before: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payslips")
        .fetch_one(&state.db)
        .await
        .unwrap();

    let err = payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Kegagalan tidak menambah payslip baru
    let after: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payslips")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn initiate_requires_staff_hr() {
    let state = setup().await;
    let emp = seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    let err = payroll::initiate_payroll_process(&state, &karyawan(emp), start_payload("2025-06"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err =
        payroll::initiate_payroll_process(&state, &manager_hr(emp), start_payload("2025-06"))
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn initiate_without_active_employees_marks_no_employees() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "inactive", &["Staff HR"]).await;

    let summary = payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    assert_eq!(summary.total_employees, 0);
    assert_eq!(summary.status, RunStatus::NoEmployees);
}

#[tokio::test]
async fn status_view_is_synthesized_before_any_run() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    let view = payroll::get_current_payroll_status(&state, &staff_hr(hr)).await.unwrap();
    assert!(view.payroll_period.is_none());
    assert!(view.status.is_none());
    assert_eq!(view.total_employees, 2);
    assert_eq!(view.pending, 2);
}

#[tokio::test]
async fn full_lifecycle_calculate_approve_to_completed() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    let mgr = seed_user(&state, "rina_mgr", "Rina Manajer", None, "active", &["Manager HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", Some("10000000"), "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();

    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();
    assert_eq!(slips.len(), 3);

    // Kalkulasi slip pertama -> Processed, run jadi Processing
    let first = payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        slips[0].id,
        calculation("10750000", "750000", "250000"),
    )
    .await
    .unwrap();
    assert_eq!(first.status, PayslipStatus::Processed);
    assert_eq!(first.net_salary, dec("10200000"));

    let run = payroll::get_payroll_process(&state.db, first.payroll_process_id)
        .await
        .unwrap();
    assert_eq!(run.processed_count, 1);
    assert_eq!(run.pending_count, 2);
    assert_eq!(run.status, RunStatus::Processing);

    // Antrean persetujuan hanya berisi slip Processed
    let queue = approval::list_payslips_for_approval(&state, &manager_hr(mgr))
        .await
        .unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, first.id);
    assert_eq!(queue[0].period, "2025-06");

    // Setujui slip pertama; proses + setujui sisanya
    let approved = approval::approve_payslip(&state, &manager_hr(mgr), first.id)
        .await
        .unwrap();
    assert_eq!(approved.status, PayslipStatus::Approved);

    for s in &slips[1..] {
        payslip::apply_payslip_calculation(
            &state,
            &staff_hr(hr),
            s.id,
            calculation("9000000", "0", "150000"),
        )
        .await
        .unwrap();
        approval::approve_payslip(&state, &manager_hr(mgr), s.id).await.unwrap();
    }

    let run = payroll::get_payroll_process(&state.db, run.id).await.unwrap();
    assert_eq!(run.pending_count, 0);
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn approve_requires_manager_hr() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();

    let err = approval::approve_payslip(&state, &staff_hr(hr), slips[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = approval::list_payslips_for_approval(&state, &staff_hr(hr))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn approve_rejects_payslip_that_is_not_processed() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    let mgr = seed_user(&state, "rina_mgr", "Rina Manajer", None, "active", &["Manager HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();

    let logs_before: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_logs")
        .fetch_one(&state.db)
        .await
        .unwrap();

    // Masih Pending
    let err = approval::approve_payslip(&state, &manager_hr(mgr), slips[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let err = approval::reject_payslip(&state, &manager_hr(mgr), slips[0].id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    // Kegagalan adalah no-op: status, details, dan log tidak berubah
    let untouched = payslip::get_payslip_by_id(&state, &manager_hr(mgr), slips[0].id)
        .await
        .unwrap();
    assert_eq!(untouched.status, PayslipStatus::Pending);
    assert!(untouched.details.is_none());
    let logs_after: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_logs")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(logs_before, logs_after);

    // Sudah Approved
    payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        slips[0].id,
        calculation("10750000", "0", "250000"),
    )
    .await
    .unwrap();
    approval::approve_payslip(&state, &manager_hr(mgr), slips[0].id).await.unwrap();

    let err = approval::approve_payslip(&state, &manager_hr(mgr), slips[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let err = approval::approve_payslip(&state, &manager_hr(mgr), 99999)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn reject_records_reason_and_metadata_in_details() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    let mgr = seed_user(&state, "rina_mgr", "Rina Manajer", None, "active", &["Manager HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();
    let target = slips[0].id;

    payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        target,
        calculation("10750000", "0", "250000"),
    )
    .await
    .unwrap();

    let rejected = approval::reject_payslip(
        &state,
        &manager_hr(mgr),
        target,
        Some("Data lembur belum diverifikasi".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(rejected.status, PayslipStatus::Rejected);
    let details = rejected.details.unwrap();
    assert_eq!(details["rejectionReason"], "Data lembur belum diverifikasi");
    assert_eq!(details["rejectedBy"], mgr);
    assert!(details["rejectedAt"].is_string());
    // Rincian kalkulasi yang sudah ada tidak hilang
    assert_eq!(details["baseSalary"], "10000000");

    // Run ikut terekonsiliasi: slip Rejected keluar dari processed,
    // dua slip lain (hr dan mgr) masih Pending
    let run = payroll::get_payroll_process(&state.db, rejected.payroll_process_id)
        .await
        .unwrap();
    assert_eq!(run.processed_count, 0);
    assert_eq!(run.pending_count, 2);
    assert_eq!(run.total_employees, 3);
}

#[tokio::test]
async fn reject_without_reason_uses_default() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    let mgr = seed_user(&state, "rina_mgr", "Rina Manajer", None, "active", &["Manager HR"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();
    payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        slips[0].id,
        calculation("10750000", "0", "250000"),
    )
    .await
    .unwrap();

    let rejected = approval::reject_payslip(&state, &manager_hr(mgr), slips[0].id, None)
        .await
        .unwrap();
    let details = rejected.details.unwrap();
    assert_eq!(details["rejectionReason"], "Rejected by Manager HR");
}

#[tokio::test]
async fn finalized_payslip_cannot_be_recalculated() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    let mgr = seed_user(&state, "rina_mgr", "Rina Manajer", None, "active", &["Manager HR"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();
    let target = slips[0].id;

    payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        target,
        calculation("10750000", "0", "250000"),
    )
    .await
    .unwrap();
    approval::approve_payslip(&state, &manager_hr(mgr), target).await.unwrap();

    let err = payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        target,
        calculation("11000000", "0", "260000"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn stored_calculation_satisfies_net_salary_identity() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", Some("10000000"), "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2024-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();

    // Gross sudah termasuk tunjangan dan lembur; total_deductions adalah
    // agregat pajak + BPJS, sehingga net = gross - total_deductions.
    let calc = payroll_sarana::models::payslip::PayslipCalculation {
        gross_salary: dec("10750000"),
        total_allowances: dec("1500000"),
        overtime: dec("750000"),
        total_deductions: dec("1200000"),
        net_salary: dec("9550000"),
        tax_amount: dec("850000"),
        bpjs_kesehatan_amount: dec("200000"),
        bpjs_ketenagakerjaan_amount: dec("150000"),
        details: Some(serde_json::json!({ "basic": "9250000" })),
    };

    let stored = payslip::apply_payslip_calculation(&state, &staff_hr(hr), slips[0].id, calc)
        .await
        .unwrap();

    assert_eq!(stored.status, PayslipStatus::Processed);
    assert_eq!(stored.net_salary, dec("9550000"));
    assert_eq!(
        stored.total_deductions,
        stored.tax_amount + stored.bpjs_kesehatan_amount + stored.bpjs_ketenagakerjaan_amount
    );
    assert_eq!(stored.net_salary, stored.gross_salary - stored.total_deductions);
}

#[tokio::test]
async fn calculation_rejects_negative_amounts() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();

    let mut calc = calculation("10750000", "0", "250000");
    calc.net_salary = dec("-1");
    let err = payslip::apply_payslip_calculation(&state, &staff_hr(hr), slips[0].id, calc)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    let summary = payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap()[0].id,
        calculation("10750000", "0", "250000"),
    )
    .await
    .unwrap();

    let once = payroll::reconcile_payroll_counts(&state, summary.process_id).await.unwrap();
    let twice = payroll::reconcile_payroll_counts(&state, summary.process_id).await.unwrap();
    assert_eq!(once.processed_count, twice.processed_count);
    assert_eq!(once.pending_count, twice.pending_count);
    assert_eq!(once.status, twice.status);

    let err = payroll::reconcile_payroll_counts(&state, 99999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn employees_only_see_their_own_payslips() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    let budi = seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;
    let citra = seed_user(&state, "citra", "Citra Lestari", None, "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();

    let mine = payslip::get_my_payslips(&state, &karyawan(budi)).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].user_id, budi);

    // Slip milik Citra tidak boleh dibuka Budi, tapi boleh oleh staf HR
    let citra_slip = payslip::get_my_payslips(&state, &karyawan(citra)).await.unwrap()[0].id;
    let err = payslip::get_payslip_by_id(&state, &karyawan(budi), citra_slip)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(payslip::get_payslip_by_id(&state, &staff_hr(hr), citra_slip).await.is_ok());

    let err = payslip::get_all_payslips(&state, &karyawan(budi)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn approval_activity_appears_in_recent_activities() {
    let state = setup().await;
    let hr = seed_user(&state, "sari_hr", "Sari Dewi", None, "active", &["Staff HR"]).await;
    let mgr = seed_user(&state, "rina_mgr", "Rina Manajer", None, "active", &["Manager HR"]).await;
    seed_user(&state, "budi", "Budi Santoso", None, "active", &["Karyawan"]).await;

    payroll::initiate_payroll_process(&state, &staff_hr(hr), start_payload("2025-06"))
        .await
        .unwrap();
    let slips = payslip::get_all_payslips(&state, &staff_hr(hr)).await.unwrap();
    let budi_slip = slips.iter().find(|s| s.user_id != hr && s.user_id != mgr).unwrap();

    payslip::apply_payslip_calculation(
        &state,
        &staff_hr(hr),
        budi_slip.id,
        calculation("10750000", "0", "250000"),
    )
    .await
    .unwrap();
    approval::approve_payslip(&state, &manager_hr(mgr), budi_slip.id).await.unwrap();

    payroll_sarana::services::activity::record(&state.db, "Manual note", "System", None)
        .await
        .unwrap();

    let logs = dashboard::get_recent_activities(&state, &staff_hr(hr), 10).await.unwrap();
    // Inisiasi, persetujuan, dan catatan manual semuanya terekam
    assert!(logs.iter().any(|l| l.r#type == "Payroll Process"));
    assert!(logs.iter().any(|l| l.r#type == "System" && l.user_id.is_none()));
    let entry = logs
        .iter()
        .find(|l| l.r#type == "Payroll Approval")
        .expect("approval log entry");
    assert!(entry.activity.contains("Budi Santoso"));
    assert!(entry.activity.contains("2025-06"));
    assert!(entry.activity.contains("approved"));
    assert_eq!(entry.user_id, Some(mgr));
    assert_eq!(entry.user_name.as_deref(), Some("Rina Manajer"));

    // Limit membatasi hasil
    let bounded = dashboard::get_recent_activities(&state, &staff_hr(hr), 1).await.unwrap();
    assert_eq!(bounded.len(), 1);

    let err = dashboard::get_recent_activities(&state, &karyawan(mgr), 10).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
