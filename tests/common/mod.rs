use payroll_sarana::auth::{roles, Principal};
use payroll_sarana::database::connection::init_memory_db;
use payroll_sarana::models::payslip::PayslipCalculation;
use payroll_sarana::AppState;
use rust_decimal::Decimal;

/// State dengan database in-memory segar (migrasi sudah jalan).
pub async fn setup() -> AppState {
    let db = init_memory_db().await.expect("in-memory db");
    AppState::new(db)
}

/// Seed satu user langsung lewat SQL, tanpa lewat service (hash dummy,
/// autentikasi bukan urusan pengujian ini).
pub async fn seed_user(
    state: &AppState,
    username: &str,
    name: &str,
    salary: Option<&str>,
    status: &str,
    user_roles: &[&str],
) -> i64 {
    let res = sqlx::query(
        "INSERT INTO users (username, email, password_hash, name, salary, status, npwp)
         VALUES (?, ?, 'x', ?, ?, ?, ?)",
    )
    .bind(username)
    .bind(format!("{}@example.com", username))
    .bind(name)
    .bind(salary)
    .bind(status)
    .bind(format!("09.{}.000.0-000.000", username.len()))
    .execute(&state.db)
    .await
    .expect("seed user");

    let id = res.last_insert_rowid();
    for role in user_roles {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(id)
            .bind(role)
            .execute(&state.db)
            .await
            .expect("seed role");
    }
    id
}

pub fn staff_hr(id: i64) -> Principal {
    Principal::new(id, vec![roles::STAFF_HR.to_string()])
}

pub fn manager_hr(id: i64) -> Principal {
    Principal::new(id, vec![roles::MANAGER_HR.to_string()])
}

pub fn staff_finance(id: i64) -> Principal {
    Principal::new(id, vec![roles::STAFF_FINANCE.to_string()])
}

pub fn karyawan(id: i64) -> Principal {
    Principal::new(id, vec![roles::KARYAWAN.to_string()])
}

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

/// Kalkulasi realistis: gross 10.750.000 (gaji 10jt + tunjangan 500rb +
/// lembur 250rb... disesuaikan per argumen), net = gross - deductions.
pub fn calculation(gross: &str, overtime: &str, tax: &str) -> PayslipCalculation {
    let gross_d = dec(gross);
    let tax_d = dec(tax);
    let bpjs_kes = dec("100000");
    let bpjs_tk = dec("200000");
    let deductions = tax_d + bpjs_kes + bpjs_tk;

    PayslipCalculation {
        gross_salary: gross_d,
        total_allowances: dec("500000"),
        overtime: dec(overtime),
        total_deductions: deductions,
        net_salary: gross_d - deductions,
        tax_amount: tax_d,
        bpjs_kesehatan_amount: bpjs_kes,
        bpjs_ketenagakerjaan_amount: bpjs_tk,
        details: Some(serde_json::json!({
            "baseSalary": "10000000",
            "allowances": [{ "name": "Transport", "amount": "500000" }],
        })),
    }
}
