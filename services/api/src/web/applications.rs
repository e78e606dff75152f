//! services/api/src/web/applications.rs
//!
//! Application endpoints: applying, listing from either side, and the
//! recruiter's status workflow.

use axum::{extract::State, http::StatusCode, Extension, Json};
use job_board_core::domain::{
    ApplicantSummary, Application, ApplicationDetails, ApplicationStatus, ApplicationUpdate,
    JobSummary, NewApplication,
};
use job_board_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// An application as the applicant sees it: the job reference is populated.
pub type SeekerApplication = ApplicationDetails<Option<JobSummary>, Uuid>;
/// An application as the recruiter sees it: the applicant reference is populated.
pub type RecruiterApplication = ApplicationDetails<Uuid, Option<ApplicantSummary>>;
/// Both references populated.
pub type FullApplication = ApplicationDetails<Option<JobSummary>, Option<ApplicantSummary>>;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub job_id: Uuid,
    pub cover_letter: Option<String>,
}

/// Empty strings count as absent.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub recruiter_notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ApplicationResponse {
    pub success: bool,
    pub application: Application,
}

#[derive(Serialize, ToSchema)]
pub struct ApplicationDetailResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub application: FullApplication,
}

#[derive(Serialize, ToSchema)]
pub struct SeekerApplicationsResponse {
    pub success: bool,
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub applications: Vec<SeekerApplication>,
}

#[derive(Serialize, ToSchema)]
pub struct JobApplicationsResponse {
    pub success: bool,
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub applications: Vec<RecruiterApplication>,
}

impl StatusUpdateRequest {
    fn into_update(self) -> Result<ApplicationUpdate, ApiError> {
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<ApplicationStatus>()
                    .map_err(|e| ApiError::Validation(e.to_string()))
            })
            .transpose()?;
        let recruiter_notes = self.recruiter_notes.filter(|n| !n.trim().is_empty());
        Ok(ApplicationUpdate {
            status,
            recruiter_notes,
        })
    }
}

//=========================================================================================
// Reference Population
//=========================================================================================

async fn job_summary(state: &AppState, job_id: Uuid) -> Result<Option<JobSummary>, ApiError> {
    match state.db.get_job_by_id(job_id).await {
        Ok(job) => Ok(Some(job.summary())),
        Err(PortError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn applicant_summary(
    state: &AppState,
    seeker_id: Uuid,
) -> Result<Option<ApplicantSummary>, ApiError> {
    match state.db.get_user_by_id(seeker_id).await {
        Ok(user) => Ok(Some(user.applicant_summary())),
        Err(PortError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/applications - Apply to a job (job seekers only)
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "applications",
    security(("bearer_auth" = [])),
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "No résumé on file", body = ErrorBody),
        (status = 404, description = "Job not found", body = ErrorBody),
        (status = 409, description = "Already applied", body = ErrorBody)
    )
)]
pub async fn apply(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>), ApiError> {
    let job = state.db.get_job_by_id(req.job_id).await?;
    let seeker = state.db.get_user_by_id(auth.id).await?;
    let resume = seeker.resume().ok_or_else(|| {
        ApiError::Validation("Please upload your resume before applying".to_string())
    })?;

    let application = state
        .db
        .create_application(NewApplication {
            job_id: job.id,
            job_seeker_id: seeker.id,
            resume_url: resume.url.clone(),
            cover_letter: req.cover_letter.filter(|c| !c.trim().is_empty()),
        })
        .await?;
    info!("User {} applied to job {}", seeker.id, job.id);

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            success: true,
            application,
        }),
    ))
}

/// GET /api/applications/my-applications - The caller's applications
#[utoipa::path(
    get,
    path = "/api/applications/my-applications",
    tag = "applications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Applications with job summaries, newest first", body = SeekerApplicationsResponse),
        (status = 403, description = "Not a job seeker", body = ErrorBody)
    )
)]
pub async fn my_applications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<SeekerApplicationsResponse>, ApiError> {
    let applications = state.db.list_applications_by_seeker(auth.id).await?;

    let mut jobs: HashMap<Uuid, Option<JobSummary>> = HashMap::new();
    let mut populated = Vec::with_capacity(applications.len());
    for application in applications {
        if !jobs.contains_key(&application.job_id) {
            let summary = job_summary(&state, application.job_id).await?;
            jobs.insert(application.job_id, summary);
        }
        let job = jobs.get(&application.job_id).cloned().flatten();
        let seeker = application.job_seeker_id;
        populated.push(application.with_refs(job, seeker));
    }

    Ok(Json(SeekerApplicationsResponse {
        success: true,
        count: populated.len(),
        applications: populated,
    }))
}

/// GET /api/applications/job/{job_id} - Applicants for a job (owner or admin)
#[utoipa::path(
    get,
    path = "/api/applications/job/{job_id}",
    tag = "applications",
    security(("bearer_auth" = [])),
    params(("job_id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Applications with applicant summaries", body = JobApplicationsResponse),
        (status = 403, description = "Not the job owner", body = ErrorBody),
        (status = 404, description = "Job not found", body = ErrorBody)
    )
)]
pub async fn job_applications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<Json<JobApplicationsResponse>, ApiError> {
    let job = state.db.get_job_by_id(job_id).await?;
    if !auth.owns_or_admin(job.recruiter_id) {
        return Err(ApiError::Forbidden(
            "Not authorized to view these applications".to_string(),
        ));
    }

    let applications = state.db.list_applications_by_job(job.id).await?;
    let mut populated = Vec::with_capacity(applications.len());
    for application in applications {
        let applicant = applicant_summary(&state, application.job_seeker_id).await?;
        let job_id = application.job_id;
        populated.push(application.with_refs(job_id, applicant));
    }

    Ok(Json(JobApplicationsResponse {
        success: true,
        count: populated.len(),
        applications: populated,
    }))
}

/// PUT /api/applications/{id}/status - Update status and notes (job owner or admin)
#[utoipa::path(
    put,
    path = "/api/applications/{id}/status",
    tag = "applications",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated application", body = ApplicationResponse),
        (status = 400, description = "Unknown status", body = ErrorBody),
        (status = 403, description = "Not the job owner", body = ErrorBody),
        (status = 404, description = "Application not found", body = ErrorBody)
    )
)]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(application_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let update = req.into_update()?;
    let application = state.db.get_application_by_id(application_id).await?;
    let job = state.db.get_job_by_id(application.job_id).await?;
    if !auth.owns_or_admin(job.recruiter_id) {
        return Err(ApiError::Forbidden(
            "Not authorized to update this application".to_string(),
        ));
    }

    let application = state
        .db
        .update_application(application.id, &update)
        .await?;
    info!(
        "Application {} is now {} (by {})",
        application.id, application.status, auth.id
    );
    Ok(Json(ApplicationResponse {
        success: true,
        application,
    }))
}

/// GET /api/applications/{id} - One application (applicant, job owner or admin)
#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    tag = "applications",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "The application with both references populated", body = ApplicationDetailResponse),
        (status = 403, description = "Not a party to the application", body = ErrorBody),
        (status = 404, description = "Application not found", body = ErrorBody)
    )
)]
pub async fn get_application(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(application_id): ApiPath<Uuid>,
) -> Result<Json<ApplicationDetailResponse>, ApiError> {
    let application = state.db.get_application_by_id(application_id).await?;
    let job = state.db.get_job_by_id(application.job_id).await?;
    let allowed = auth.id == application.job_seeker_id || auth.owns_or_admin(job.recruiter_id);
    if !allowed {
        return Err(ApiError::Forbidden(
            "Not authorized to view this application".to_string(),
        ));
    }

    let applicant = applicant_summary(&state, application.job_seeker_id).await?;
    Ok(Json(ApplicationDetailResponse {
        success: true,
        application: application.with_refs(Some(job.summary()), applicant),
    }))
}
