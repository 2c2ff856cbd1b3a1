use sqlx::{SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::activity::ActivityLogWithUser;

/// Catat satu aktivitas (statement sendiri, auto-commit).
pub async fn record(
    db: &SqlitePool,
    activity: &str,
    log_type: &str,
    user_id: Option<i64>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO activity_logs (user_id, activity, type) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(activity)
        .bind(log_type)
        .execute(db)
        .await?;
    Ok(())
}

/// Catat aktivitas di dalam transaksi pemanggil. Dipakai alur persetujuan:
/// tulisan status dan entri log harus commit atau rollback bersama.
pub async fn record_in_tx(
    conn: &mut SqliteConnection,
    activity: &str,
    log_type: &str,
    user_id: Option<i64>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO activity_logs (user_id, activity, type) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(activity)
        .bind(log_type)
        .execute(conn)
        .await?;
    Ok(())
}

/// Ambil aktivitas terbaru, urut paling baru dulu, dibatasi `limit`.
pub async fn get_recent_activities(
    db: &SqlitePool,
    limit: i64,
) -> Result<Vec<ActivityLogWithUser>, AppError> {
    let logs = sqlx::query_as::<_, ActivityLogWithUser>(
        r#"
        SELECT al.id, al.user_id, u.name AS user_name, al.activity, al.type, al.created_at
        FROM activity_logs al
        LEFT JOIN users u ON al.user_id = u.id
        ORDER BY al.created_at DESC, al.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(logs)
}
