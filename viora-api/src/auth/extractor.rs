use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use bson::oid::ObjectId;

use crate::domain::Role;
use crate::routes::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Identity of the verified caller, forwarded by the auth gateway in trusted
/// headers after it has validated the session token. Returns 401 when the
/// headers are missing or malformed.
///
/// A missing role header falls back to `customer`, the least privileged role.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: ObjectId,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins pass every gate.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if self.is_admin() || allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Insufficient permissions"))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| ObjectId::parse_str(value).ok())
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Role>().ok())
            .unwrap_or(Role::Customer);

        Ok(AuthUser { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_any_gate() {
        let admin = AuthUser {
            id: ObjectId::new(),
            role: Role::Admin,
        };
        assert!(admin.require_role(&[Role::Owner]).is_ok());
    }

    #[test]
    fn customer_cannot_pass_an_owner_gate() {
        let customer = AuthUser {
            id: ObjectId::new(),
            role: Role::Customer,
        };
        assert!(customer.require_role(&[Role::Owner, Role::Provider]).is_err());
        assert!(customer.require_role(&[Role::Customer]).is_ok());
    }
}
