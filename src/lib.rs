//! Payroll Sarana — core penggajian multi-peran di atas SQLite.
//!
//! Crate ini adalah lapisan domain: run payroll per periode, siklus hidup
//! payslip (kalkulasi, persetujuan, penolakan), dashboard per peran,
//! laporan bulanan dan PPh21, manajemen user, dan audit trail. Autentikasi
//! (siapa principal-nya) terjadi di luar; di sini setiap operasi hanya
//! memeriksa peran principal yang sudah diverifikasi.

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod logger;
pub mod models;
pub mod services;
pub mod validation;

use std::path::Path;

use sqlx::SqlitePool;

pub use auth::Principal;
pub use errors::AppError;

/// State aplikasi yang dibagikan ke semua operasi.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Inisialisasi lengkap: config, logger global, lalu database + migrasi.
/// Dipanggil sekali saat startup host.
pub async fn init_app(app_data_dir: &Path) -> Result<AppState, AppError> {
    let config = config::init_config();

    if let Err(e) = logger::init_global_logger(app_data_dir) {
        eprintln!("Logger init gagal, lanjut tanpa file log: {}", e);
    }

    log_info!(
        "APP",
        "Memulai aplikasi",
        serde_json::json!({
            "name": config.app_name,
            "version": config.version,
            "environment": config.environment.as_str(),
        })
    );

    let db = match database::connection::init_db(app_data_dir).await {
        Ok(pool) => pool,
        Err(e) => {
            log_error!("APP", "Inisialisasi database gagal", e.to_string());
            return Err(e);
        }
    };
    log_info!("APP", "Database siap");

    Ok(AppState::new(db))
}
