use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::parse_amount;
use crate::errors::AppError;

/// Struct dari database — untuk query_as. Gaji disimpan sebagai TEXT desimal.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub salary: Option<String>,
    pub status: String,
    pub join_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub npwp: Option<String>,
}

/// Representasi user yang keluar dari core (tanpa password_hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub status: String,
    pub join_date: Option<NaiveDate>,
    pub npwp: Option<String>,
    pub roles: Vec<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl User {
    /// Gabungkan baris database dengan daftar perannya.
    pub fn from_db(u: DbUser, roles: Vec<String>) -> Result<Self, AppError> {
        let salary = u
            .salary
            .as_deref()
            .map(|s| parse_amount("salary", s))
            .transpose()?;

        Ok(Self {
            id: u.id,
            username: u.username,
            email: u.email,
            name: u.name,
            department: u.department,
            position: u.position,
            salary,
            status: u.status,
            join_date: u.join_date,
            npwp: u.npwp,
            roles,
            created_at: u.created_at,
            updated_at: u.updated_at,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Payload untuk membuat user baru.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub join_date: Option<String>,
    pub npwp: Option<String>,
    /// Default ["Karyawan"] jika tidak diisi.
    pub role_names: Option<Vec<String>>,
}

/// Payload untuk mengupdate user. Field None = tidak diubah;
/// `role_names` Some = seluruh peran diganti.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub status: Option<String>,
    pub npwp: Option<String>,
    pub role_names: Option<Vec<String>>,
}
