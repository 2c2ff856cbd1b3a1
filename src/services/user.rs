use sqlx::SqlitePool;

use crate::auth::{guard, roles, Principal};
use crate::errors::AppError;
use crate::models::user::{CreateUserPayload, DbUser, UpdateUserPayload, User};
use crate::services::activity;
use crate::validation;
use crate::AppState;

/// Daftar peran satu user, urut alfabetis.
pub(crate) async fn load_roles(db: &SqlitePool, user_id: i64) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT role FROM user_roles WHERE user_id = ? ORDER BY role")
            .bind(user_id)
            .fetch_all(db)
            .await?;
    Ok(rows.into_iter().map(|(r,)| r).collect())
}

async fn fetch_user(db: &SqlitePool, user_id: i64) -> Result<User, AppError> {
    let row = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User id {} tidak ditemukan", user_id)))?;

    let roles = load_roles(db, user_id).await?;
    User::from_db(row, roles)
}

/// Semua user beserta perannya, urut nama.
pub async fn get_all_users(
    state: &AppState,
    principal: &Principal,
) -> Result<Vec<User>, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR, roles::MANAGER_HR])?;

    let rows = sqlx::query_as::<_, DbUser>("SELECT * FROM users ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        let role_list = load_roles(&state.db, row.id).await?;
        users.push(User::from_db(row, role_list)?);
    }
    Ok(users)
}

/// Satu user berdasarkan id. Karyawan hanya boleh melihat profilnya sendiri.
pub async fn get_user_by_id(
    state: &AppState,
    principal: &Principal,
    user_id: i64,
) -> Result<User, AppError> {
    guard::require_self_or_any_role(principal, user_id, &[roles::STAFF_HR, roles::MANAGER_HR])?;
    fetch_user(&state.db, user_id).await
}

/// Buat user baru beserta perannya (default Karyawan).
pub async fn create_user(
    state: &AppState,
    principal: &Principal,
    payload: CreateUserPayload,
) -> Result<User, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR, roles::MANAGER_HR])?;

    validation::validate_username(&payload.username)?;
    validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;
    validation::validate_name(&payload.name)?;
    if let Some(salary) = payload.salary {
        validation::validate_amount("salary", salary)?;
    }
    let join_date = payload
        .join_date
        .as_deref()
        .map(validation::parse_date)
        .transpose()?;

    let password_hash = bcrypt::hash(&payload.password, 12)
        .map_err(|e| AppError::Internal(format!("Gagal hash password: {}", e)))?;

    let role_names = payload
        .role_names
        .unwrap_or_else(|| vec![roles::KARYAWAN.to_string()]);

    let mut tx = state.db.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO users (username, email, password_hash, name, department, position,
                            salary, status, join_date, npwp)
         VALUES (?, ?, ?, ?, ?, ?, ?, 'active', ?, ?)",
    )
    .bind(payload.username.trim())
    .bind(payload.email.trim())
    .bind(&password_hash)
    .bind(payload.name.trim())
    .bind(&payload.department)
    .bind(&payload.position)
    .bind(payload.salary.map(|s| s.to_string()))
    .bind(join_date)
    .bind(&payload.npwp)
    .execute(&mut *tx)
    .await;

    let user_id = match inserted {
        Ok(res) => res.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(
                "Username atau email sudah digunakan".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    for role in &role_names {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role)
            .execute(&mut *tx)
            .await?;
    }

    activity::record_in_tx(
        &mut *tx,
        &format!("User {} created.", payload.username.trim()),
        "User Management",
        Some(principal.id),
    )
    .await?;

    tx.commit().await?;

    crate::log_info!(
        "USER",
        "User baru dibuat",
        serde_json::json!({ "user_id": user_id, "created_by": principal.id })
    );

    fetch_user(&state.db, user_id).await
}

/// Update sebagian field user. `role_names` Some berarti seluruh peran
/// diganti dengan daftar baru.
pub async fn update_user(
    state: &AppState,
    principal: &Principal,
    user_id: i64,
    payload: UpdateUserPayload,
) -> Result<User, AppError> {
    guard::require_any_role(principal, &[roles::STAFF_HR, roles::MANAGER_HR])?;

    if let Some(ref email) = payload.email {
        validation::validate_email(email)?;
    }
    if let Some(ref password) = payload.password {
        validation::validate_password(password)?;
    }
    if let Some(ref name) = payload.name {
        validation::validate_name(name)?;
    }
    if let Some(salary) = payload.salary {
        validation::validate_amount("salary", salary)?;
    }
    if let Some(ref status) = payload.status {
        if status != "active" && status != "inactive" {
            return Err(AppError::Validation(
                "Status harus 'active' atau 'inactive'".to_string(),
            ));
        }
    }

    let password_hash = payload
        .password
        .as_deref()
        .map(|p| bcrypt::hash(p, 12))
        .transpose()
        .map_err(|e| AppError::Internal(format!("Gagal hash password: {}", e)))?;

    let mut tx = state.db.begin().await?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "User id {} tidak ditemukan",
            user_id
        )));
    }

    let updated = sqlx::query(
        "UPDATE users SET
            email = COALESCE(?, email),
            password_hash = COALESCE(?, password_hash),
            name = COALESCE(?, name),
            department = COALESCE(?, department),
            position = COALESCE(?, position),
            salary = COALESCE(?, salary),
            status = COALESCE(?, status),
            npwp = COALESCE(?, npwp),
            updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(payload.email.as_deref().map(str::trim))
    .bind(&password_hash)
    .bind(payload.name.as_deref().map(str::trim))
    .bind(&payload.department)
    .bind(&payload.position)
    .bind(payload.salary.map(|s| s.to_string()))
    .bind(&payload.status)
    .bind(&payload.npwp)
    .bind(user_id)
    .execute(&mut *tx)
    .await;

    if let Err(e) = updated {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Err(AppError::Conflict("Email sudah digunakan".to_string()));
            }
        }
        return Err(e.into());
    }

    if let Some(role_names) = &payload.role_names {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for role in role_names {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
                .bind(user_id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }
    }

    activity::record_in_tx(
        &mut *tx,
        &format!("User id {} updated.", user_id),
        "User Management",
        Some(principal.id),
    )
    .await?;

    tx.commit().await?;

    fetch_user(&state.db, user_id).await
}

/// Hapus user. Hanya Manager HR, dan tidak boleh menghapus diri sendiri.
/// User yang sudah punya payslip tidak bisa dihapus (riwayat payroll harus
/// tetap utuh) — nonaktifkan lewat `update_user` status 'inactive'.
pub async fn delete_user(
    state: &AppState,
    principal: &Principal,
    user_id: i64,
) -> Result<(), AppError> {
    guard::require_any_role(principal, &[roles::MANAGER_HR])?;

    if principal.id == user_id {
        return Err(AppError::Forbidden(
            "tidak dapat menghapus akun sendiri".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let target: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    let (username,) = target.ok_or_else(|| {
        AppError::NotFound(format!("User id {} tidak ditemukan", user_id))
    })?;

    let (payslip_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM payslips WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
    if payslip_count > 0 {
        return Err(AppError::Conflict(format!(
            "User {} memiliki {} payslip dan tidak bisa dihapus, nonaktifkan saja",
            username, payslip_count
        )));
    }

    sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "User id {} tidak ditemukan",
            user_id
        )));
    }

    activity::record_in_tx(
        &mut *tx,
        &format!("User {} deleted.", username),
        "User Management",
        Some(principal.id),
    )
    .await?;

    tx.commit().await?;

    crate::log_info!(
        "USER",
        "User dihapus",
        serde_json::json!({ "user_id": user_id, "deleted_by": principal.id })
    );

    Ok(())
}
