//! services/api/src/web/middleware.rs
//!
//! Authentication and role middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use job_board_core::domain::Role;
use job_board_core::ports::PortError;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The acting user, resolved from the bearer token and inserted into the
/// request extensions by `require_auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub is_approved: bool,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns_or_admin(&self, owner: Uuid) -> bool {
        self.id == owner || self.is_admin()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that verifies the bearer token and resolves the user it names.
///
/// On success, inserts an `AuthUser` into the request extensions for handlers
/// and later middleware. Fails with 401 when the token is missing or invalid,
/// or when the user no longer exists.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthenticated("Not authorized, no token".to_string()))?;
    let claims = state.tokens.verify(token)?;

    let user = match state.db.get_user_by_id(claims.sub).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Err(ApiError::Unauthenticated(
                "Not authorized, user no longer exists".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        role: user.role,
        is_approved: user.is_approved,
    });
    Ok(next.run(req).await)
}

fn auth_user(req: &Request) -> Result<AuthUser, ApiError> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| ApiError::Unauthenticated("Not authorized".to_string()))
}

/// Lets the request through only when the resolved role is in `allowed`.
pub async fn authorize(
    allowed: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = auth_user(&req)?;
    if !allowed.contains(&user.role) {
        return Err(ApiError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )));
    }
    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    authorize(&[Role::Admin], req, next).await
}

pub async fn require_recruiter(req: Request, next: Next) -> Result<Response, ApiError> {
    authorize(&[Role::Recruiter], req, next).await
}

pub async fn require_job_seeker(req: Request, next: Next) -> Result<Response, ApiError> {
    authorize(&[Role::JobSeeker], req, next).await
}

pub async fn require_recruiter_or_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    authorize(&[Role::Recruiter, Role::Admin], req, next).await
}

/// Recruiters wait for admin approval before they may post jobs.
pub async fn require_approved_recruiter(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = auth_user(&req)?;
    if user.role == Role::Recruiter && !user.is_approved {
        return Err(ApiError::Forbidden(
            "Your account is pending approval by an admin".to_string(),
        ));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_parsed() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn ownership_includes_admins() {
        let owner = Uuid::new_v4();
        let recruiter = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Recruiter,
            is_approved: true,
        };
        let admin = AuthUser {
            role: Role::Admin,
            ..recruiter
        };
        assert!(!recruiter.owns_or_admin(owner));
        assert!(recruiter.owns_or_admin(recruiter.id));
        assert!(admin.owns_or_admin(owner));
    }
}
