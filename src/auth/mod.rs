pub mod guard;

use serde::{Deserialize, Serialize};

/// Nama-nama peran yang dikenal sistem. Peran adalah label bebas per user
/// (multi-valued), bukan hirarki.
pub mod roles {
    pub const MANAGER_HR: &str = "Manager HR";
    pub const STAFF_HR: &str = "Staff HR";
    pub const STAFF_FINANCE: &str = "Staff Finance";
    pub const KARYAWAN: &str = "Karyawan";
}

/// Principal terautentikasi yang disuplai oleh auth gate eksternal.
/// Core ini hanya memakai `id` untuk atribusi audit dan `roles` sebagai
/// himpunan label untuk otorisasi.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(id: i64, roles: Vec<String>) -> Self {
        Self { id, roles }
    }

    /// True jika principal memegang minimal satu peran dari himpunan yang diminta.
    pub fn has_any_role(&self, required: &[&str]) -> bool {
        self.roles.iter().any(|r| required.contains(&r.as_str()))
    }
}
