//! Caller identity from trusted gateway headers.
//!
//! Authentication happens in front of this service; the core trusts the
//! identity the gateway verified. `x-user-id` carries the authenticated
//! user and `x-user-role` the role. No token verification happens here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::UserId;

use crate::error::ApiError;

/// The caller's role as asserted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// The authenticated caller, extracted from trusted headers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthUser {
    /// Rejects non-admin callers.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Forbidden".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<UserId>().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid x-user-id header".to_string())
            })?;

        let role = match parts.headers.get("x-user-role").and_then(|v| v.to_str().ok()) {
            Some("admin") => Role::Admin,
            _ => Role::Customer,
        };

        Ok(AuthUser { user_id, role })
    }
}
