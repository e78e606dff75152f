//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login and the current user.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use job_board_core::domain::{Company, NewUser, Role, User};
use job_board_core::ports::PortError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::ApiJson;
use crate::web::middleware::AuthUser;
use crate::web::response::UserResponse;
use crate::web::state::AppState;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `JOB_SEEKER`.
    pub role: Option<Role>,
    pub phone: Option<String>,
    /// Required for recruiters.
    pub company: Option<Company>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

//=========================================================================================
// Password Hashing
//=========================================================================================

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn is_valid_email(email: &str) -> Result<bool, ApiError> {
    let re = Regex::new(EMAIL_PATTERN).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(re.is_match(email))
}

impl RegisterRequest {
    /// Checks the per-role rules and returns the normalized account fields.
    fn validate(self) -> Result<(NewUser, String), ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::Validation("Please provide a name".to_string()));
        }
        let email = self.email.trim().to_lowercase();
        if !is_valid_email(&email)? {
            return Err(ApiError::Validation(
                "Please provide a valid email".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let role = self.role.unwrap_or(Role::JobSeeker);
        let company = match role {
            Role::Admin => {
                return Err(ApiError::Validation(
                    "Cannot register as an admin".to_string(),
                ))
            }
            Role::Recruiter => match self.company {
                Some(company) if !company.name.trim().is_empty() => Some(company),
                _ => {
                    return Err(ApiError::Validation(
                        "Company name is required for recruiters".to_string(),
                    ))
                }
            },
            Role::JobSeeker => None,
        };

        let mut new_user = NewUser::new(name, email, String::new(), role);
        new_user.phone = self.phone.filter(|p| !p.trim().is_empty());
        new_user.company = company;
        Ok((new_user, self.password))
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (mut new_user, password) = req.validate()?;
    new_user.hashed_password = hash_password(&password)?;

    let user = state.db.create_user(new_user).await?;
    info!("Registered {} account {}", user.role, user.id);

    let token = state.tokens.issue(user.id, user.role)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user,
        }),
    ))
}

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let invalid = || ApiError::Unauthenticated("Invalid credentials".to_string());

    let creds = match state.db.get_user_by_email(&req.email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(e.into()),
    };
    if !verify_password(&req.password, &creds.hashed_password)? {
        return Err(invalid());
    }

    let user = creds.user;
    let token = state.tokens.issue(user.id, user.role)?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
    }))
}

/// GET /api/auth/me - The authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.db.get_user_by_id(auth.id).await?;
    Ok(Json(UserResponse::new(user)))
}
