//! Role gate for privileged operations.

use super::Identity;
use crate::account::Role;
use crate::error::{ServiceError, ServiceResult};

/// Pure comparison against the caller's role; no I/O.
pub fn require_role(identity: &Identity, role: Role) -> ServiceResult<()> {
    if identity.role == role {
        Ok(())
    } else {
        tracing::warn!(
            "User '{}' with role '{}' denied access requiring '{}'",
            identity.username,
            identity.role,
            role
        );
        Err(ServiceError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: 1,
            username: "u".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_passes() {
        assert!(require_role(&identity(Role::Admin), Role::Admin).is_ok());
    }

    #[test]
    fn test_doctor_is_forbidden() {
        let err = require_role(&identity(Role::Doctor), Role::Admin).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
    }

    #[test]
    fn test_case_variant_never_becomes_admin() {
        for raw in ["Admin", "ADMIN", "admin ", "administrator"] {
            let role = Role::from_db(raw);
            assert!(
                require_role(&identity(role), Role::Admin).is_err(),
                "{raw} must not pass the admin gate"
            );
        }
    }
}
