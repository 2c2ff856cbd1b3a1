use super::Principal;
use crate::errors::AppError;

/// Helper: pastikan principal memegang salah satu peran yang diminta.
pub fn require_any_role(principal: &Principal, required: &[&str]) -> Result<(), AppError> {
    if principal.has_any_role(required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "memerlukan salah satu peran: {}",
            required.join(", ")
        )))
    }
}

/// Helper: operasi yang hanya boleh menyentuh data milik sendiri,
/// kecuali principal memegang salah satu peran staf yang diberikan.
pub fn require_self_or_any_role(
    principal: &Principal,
    owner_id: i64,
    staff_roles: &[&str],
) -> Result<(), AppError> {
    if principal.id == owner_id || principal.has_any_role(staff_roles) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "hanya boleh mengakses data milik sendiri".into(),
        ))
    }
}
