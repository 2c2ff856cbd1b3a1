use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::auth::{guard, roles, Principal};
use crate::errors::AppError;
use crate::models::payslip::DbPayslip;
use crate::models::report::{MonthlyReportRow, Pph21ReportEntry};
use crate::validation;
use crate::AppState;

const REPORT_ROLES: &[&str] = &[roles::STAFF_HR, roles::MANAGER_HR, roles::STAFF_FINANCE];

#[derive(Default)]
struct PeriodAccumulator {
    total_gross_salary: Decimal,
    total_net_salary: Decimal,
    total_tax: Decimal,
    total_bpjs_kesehatan: Decimal,
    total_bpjs_ketenagakerjaan: Decimal,
    users: BTreeSet<i64>,
}

/// Laporan payroll bulanan: agregat per periode untuk slip Processed/Paid
/// dalam rentang [start, end]. Grouping dan penjumlahan dilakukan di Rust
/// atas Decimal supaya nilai uang tetap eksak.
pub async fn get_monthly_payroll_summary(
    state: &AppState,
    principal: &Principal,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<MonthlyReportRow>, AppError> {
    guard::require_any_role(principal, REPORT_ROLES)?;

    let start = validation::parse_date(start_date)?;
    let end = validation::parse_date(end_date)?;
    validation::validate_date_range(start, end)?;

    let rows = sqlx::query_as::<_, DbPayslip>(
        "SELECT * FROM payslips
         WHERE period >= ? AND period <= ? AND status IN ('Processed', 'Paid')
         ORDER BY period ASC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    let mut groups: BTreeMap<NaiveDate, PeriodAccumulator> = BTreeMap::new();
    for row in &rows {
        let acc = groups.entry(row.period).or_default();
        acc.total_gross_salary += crate::models::parse_amount("gross_salary", &row.gross_salary)?;
        acc.total_net_salary += crate::models::parse_amount("net_salary", &row.net_salary)?;
        acc.total_tax += crate::models::parse_amount("tax_amount", &row.tax_amount)?;
        acc.total_bpjs_kesehatan +=
            crate::models::parse_amount("bpjs_kesehatan_amount", &row.bpjs_kesehatan_amount)?;
        acc.total_bpjs_ketenagakerjaan += crate::models::parse_amount(
            "bpjs_ketenagakerjaan_amount",
            &row.bpjs_ketenagakerjaan_amount,
        )?;
        acc.users.insert(row.user_id);
    }

    Ok(groups
        .into_iter()
        .map(|(period, acc)| MonthlyReportRow {
            period: period.format("%Y-%m").to_string(),
            total_gross_salary: acc.total_gross_salary,
            total_net_salary: acc.total_net_salary,
            total_tax: acc.total_tax,
            total_bpjs_kesehatan: acc.total_bpjs_kesehatan,
            total_bpjs_ketenagakerjaan: acc.total_bpjs_ketenagakerjaan,
            employee_count: acc.users.len() as i64,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct DbPph21Row {
    period: NaiveDate,
    gross_salary: String,
    tax_amount: String,
    employee_name: String,
    employee_email: String,
    npwp: Option<String>,
}

/// Laporan pemotongan PPh21 per karyawan per periode. Hanya slip
/// Processed/Paid dengan potongan pajak lebih dari nol yang muncul.
pub async fn get_pph21_report(
    state: &AppState,
    principal: &Principal,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<Pph21ReportEntry>, AppError> {
    guard::require_any_role(principal, REPORT_ROLES)?;

    let start = validation::parse_date(start_date)?;
    let end = validation::parse_date(end_date)?;
    validation::validate_date_range(start, end)?;

    let rows = sqlx::query_as::<_, DbPph21Row>(
        r#"
        SELECT ps.period, ps.gross_salary, ps.tax_amount,
               u.name AS employee_name, u.email AS employee_email, u.npwp
        FROM payslips ps
        JOIN users u ON ps.user_id = u.id
        WHERE ps.period >= ? AND ps.period <= ?
          AND ps.status IN ('Processed', 'Paid')
        ORDER BY ps.period ASC, u.name ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    let mut entries = Vec::new();
    for row in rows {
        let tax_amount = crate::models::parse_amount("tax_amount", &row.tax_amount)?;
        if tax_amount <= Decimal::ZERO {
            continue;
        }
        entries.push(Pph21ReportEntry {
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            npwp: row.npwp,
            period: row.period.format("%Y-%m").to_string(),
            gross_salary: crate::models::parse_amount("gross_salary", &row.gross_salary)?,
            tax_amount,
        });
    }

    Ok(entries)
}
