use sqlx::SqlitePool;

/// Menjalankan semua migrasi database (CREATE TABLE IF NOT EXISTS, idempoten).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ═══════════════════════════════════════
    // TABLE: users
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id            INTEGER  PRIMARY KEY AUTOINCREMENT,
            username      TEXT     NOT NULL UNIQUE,
            email         TEXT     NOT NULL UNIQUE,
            password_hash TEXT     NOT NULL,
            name          TEXT     NOT NULL,
            department    TEXT,
            position      TEXT,
            salary        TEXT,
            status        TEXT     NOT NULL DEFAULT 'active'
                          CHECK(status IN ('active', 'inactive')),
            join_date     DATE,
            created_at    DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at    DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_status ON users(status)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: user_roles (label peran, multi-valued per user)
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_roles (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role    TEXT    NOT NULL,
            UNIQUE(user_id, role)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_roles_user ON user_roles(user_id)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: payroll_processes (satu run penggajian per periode)
    // ═══════════════════════════════════════
    // UNIQUE(payroll_period) adalah penjaga race untuk inisiasi ganda:
    // duplicate insert harus gagal di constraint, bukan cuma di pre-check.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS payroll_processes (
            id                 INTEGER  PRIMARY KEY AUTOINCREMENT,
            payroll_period     DATE     NOT NULL UNIQUE,
            payment_date       DATE     NOT NULL,
            total_employees    INTEGER  NOT NULL DEFAULT 0,
            processed_count    INTEGER  NOT NULL DEFAULT 0,
            pending_count      INTEGER  NOT NULL DEFAULT 0,
            status             TEXT     NOT NULL DEFAULT 'Pending'
                               CHECK(status IN ('Pending', 'Processing', 'Completed', 'No Employees')),
            started_by_user_id INTEGER  REFERENCES users(id) ON DELETE SET NULL,
            created_at         DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at         DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payroll_processes_status ON payroll_processes(status)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: payslips
    // ═══════════════════════════════════════
    // Nilai uang disimpan sebagai TEXT desimal kanonik; agregasi dilakukan
    // di Rust dengan Decimal supaya penjumlahan tetap eksak.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS payslips (
            id                          INTEGER  PRIMARY KEY AUTOINCREMENT,
            user_id                     INTEGER  NOT NULL REFERENCES users(id),
            payroll_process_id          INTEGER  NOT NULL REFERENCES payroll_processes(id),
            period                      DATE     NOT NULL,
            gross_salary                TEXT     NOT NULL DEFAULT '0',
            total_allowances            TEXT     NOT NULL DEFAULT '0',
            overtime                    TEXT     NOT NULL DEFAULT '0',
            total_deductions            TEXT     NOT NULL DEFAULT '0',
            net_salary                  TEXT     NOT NULL DEFAULT '0',
            tax_amount                  TEXT     NOT NULL DEFAULT '0',
            bpjs_kesehatan_amount       TEXT     NOT NULL DEFAULT '0',
            bpjs_ketenagakerjaan_amount TEXT     NOT NULL DEFAULT '0',
            status                      TEXT     NOT NULL DEFAULT 'Pending'
                                        CHECK(status IN ('Pending', 'Processed', 'Approved',
                                                         'Rejected', 'Paid', 'Verified by Finance')),
            details                     TEXT,
            created_at                  DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at                  DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, period, payroll_process_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payslips_process ON payslips(payroll_process_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payslips_status ON payslips(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payslips_period ON payslips(period)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: activity_logs (audit trail, append-only)
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS activity_logs (
            id         INTEGER  PRIMARY KEY AUTOINCREMENT,
            user_id    INTEGER  REFERENCES users(id) ON DELETE SET NULL,
            activity   TEXT     NOT NULL,
            type       TEXT     NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_activity_logs_created ON activity_logs(created_at)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // MIGRASI: Kolom baru (ALTER TABLE — aman untuk data existing)
    // ═══════════════════════════════════════

    // NPWP karyawan untuk laporan PPh21
    safe_add_column(pool, "users", "npwp", "TEXT").await;

    Ok(())
}

/// Helper: ALTER TABLE ADD COLUMN yang aman (abaikan jika kolom sudah ada).
async fn safe_add_column(pool: &SqlitePool, table: &str, column: &str, col_type: &str) {
    let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, col_type);
    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => {}
        Err(e) => {
            let msg = e.to_string();
            // SQLite error jika kolom sudah ada: "duplicate column name"
            if !msg.contains("duplicate column") {
                crate::log_warn!(
                    "DB",
                    &format!("Migrasi kolom {}.{} gagal: {}", table, column, msg)
                );
            }
        }
    }
}
