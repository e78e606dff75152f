//! services/api/src/web/admin.rs
//!
//! Admin-only endpoints: user management, recruiter approval and analytics.

use axum::{extract::State, Json};
use job_board_core::domain::{
    Analytics, ApplicationStats, ApplicationStatus, JobStats, Page, Role, User, UserFilter,
    UserStats,
};
use job_board_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::jobs::MAX_PAGE_SIZE;
use crate::web::response::MessageResponse;
use crate::web::state::AppState;

pub const DEFAULT_USER_PAGE_SIZE: u32 = 20;
const RECENT_USERS: u32 = 5;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// `ADMIN`, `RECRUITER` or `JOB_SEEKER`.
    pub role: Option<String>,
    pub is_approved: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub is_approved: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub users: Vec<User>,
}

#[derive(Serialize, ToSchema)]
pub struct PendingRecruitersResponse {
    pub success: bool,
    pub count: usize,
    pub recruiters: Vec<User>,
}

#[derive(Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub success: bool,
    pub message: String,
    pub recruiter: User,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub analytics: Analytics,
}

fn parse_role(raw: Option<String>) -> Result<Option<Role>, ApiError> {
    raw.map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .map(|r| {
            r.parse::<Role>()
                .map_err(|e| ApiError::Validation(e.to_string()))
        })
        .transpose()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/admin/users - Users, newest first
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(UserListQuery),
    responses(
        (status = 200, description = "A page of users", body = UserListResponse),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let filter = UserFilter {
        role: parse_role(query.role)?,
        is_approved: query.is_approved,
    };
    let page = Page::new(
        query.page.unwrap_or(1),
        query
            .limit
            .unwrap_or(DEFAULT_USER_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
    );

    let users = state.db.list_users(&filter, Some(page)).await?;
    Ok(Json(UserListResponse {
        success: true,
        count: users.items.len(),
        total: users.total,
        total_pages: page.total_pages(users.total),
        current_page: page.number,
        users: users.items,
    }))
}

/// GET /api/admin/pending-recruiters - Recruiters awaiting approval
#[utoipa::path(
    get,
    path = "/api/admin/pending-recruiters",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unapproved recruiters, newest first", body = PendingRecruitersResponse),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn pending_recruiters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PendingRecruitersResponse>, ApiError> {
    let recruiters = state
        .db
        .list_users(&UserFilter::pending_recruiters(), None)
        .await?
        .items;
    Ok(Json(PendingRecruitersResponse {
        success: true,
        count: recruiters.len(),
        recruiters,
    }))
}

/// PUT /api/admin/approve-recruiter/{id} - Approve or reject a recruiter
#[utoipa::path(
    put,
    path = "/api/admin/approve-recruiter/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Recruiter id")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Approval updated", body = ApprovalResponse),
        (status = 400, description = "User is not a recruiter", body = ErrorBody),
        (status = 404, description = "Recruiter not found", body = ErrorBody)
    )
)]
pub async fn approve_recruiter(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ApprovalRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let recruiter = match state.db.get_user_by_id(user_id).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Err(ApiError::NotFound("Recruiter not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if recruiter.role != Role::Recruiter {
        return Err(ApiError::Validation("User is not a recruiter".to_string()));
    }

    let recruiter = state.db.set_approval(recruiter.id, req.is_approved).await?;
    let verdict = if recruiter.is_approved {
        "approved"
    } else {
        "rejected"
    };
    info!("Recruiter {} {}", recruiter.id, verdict);

    Ok(Json(ApprovalResponse {
        success: true,
        message: format!("Recruiter {verdict} successfully"),
        recruiter,
    }))
}

/// DELETE /api/admin/users/{id} - Delete a non-admin user and everything they own
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Admins cannot be deleted", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.db.get_user_by_id(user_id).await?;
    if user.role == Role::Admin {
        return Err(ApiError::Validation("Cannot delete admin user".to_string()));
    }

    state.db.delete_user(user.id).await?;
    if let Some(resume) = user.resume() {
        if let Err(e) = state.file_storage.delete(&resume.public_id).await {
            warn!("Failed to delete résumé {}: {}", resume.public_id, e);
        }
    }
    info!("Deleted {} account {}", user.role, user.id);
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// GET /api/admin/analytics - Platform-wide counts and the newest users
#[utoipa::path(
    get,
    path = "/api/admin/analytics",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Aggregated counts", body = AnalyticsResponse),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let db = &state.db;
    let everyone = UserFilter::default();
    let job_seekers_only = UserFilter {
        role: Some(Role::JobSeeker),
        is_approved: None,
    };
    let all_recruiters = UserFilter {
        role: Some(Role::Recruiter),
        is_approved: None,
    };
    let pending_recruiters = UserFilter::pending_recruiters();
    let approved_recruiters = UserFilter {
        is_approved: Some(true),
        ..all_recruiters
    };

    let (total, job_seekers, recruiters, pending, approved, jobs_total, jobs_active, recent) =
        tokio::try_join!(
            db.count_users(&everyone),
            db.count_users(&job_seekers_only),
            db.count_users(&all_recruiters),
            db.count_users(&pending_recruiters),
            db.count_users(&approved_recruiters),
            db.count_jobs(false),
            db.count_jobs(true),
            db.list_users(&everyone, Some(Page::new(1, RECENT_USERS))),
        )?;

    let mut applications = ApplicationStats {
        total: db.count_applications(None).await?,
        ..Default::default()
    };
    for status in ApplicationStatus::ALL {
        applications.record(status, db.count_applications(Some(status)).await?);
    }

    Ok(Json(AnalyticsResponse {
        success: true,
        analytics: Analytics {
            users: UserStats {
                total,
                job_seekers,
                recruiters,
                pending_recruiters: pending,
                approved_recruiters: approved,
            },
            jobs: JobStats {
                total: jobs_total,
                active: jobs_active,
            },
            applications,
            recent_users: recent.items,
        },
    }))
}
