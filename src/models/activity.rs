use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Satu entri audit trail. Append-only: tidak ada jalur update/delete.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub activity: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub created_at: Option<NaiveDateTime>,
}

/// Entri log digabung nama user untuk tampilan dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLogWithUser {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub activity: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub created_at: Option<NaiveDateTime>,
}
