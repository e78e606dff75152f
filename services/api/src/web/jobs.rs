//! services/api/src/web/jobs.rs
//!
//! Job endpoints. Listings merge the internal page with a small batch of
//! provider listings; everything else works on stored jobs only.

use axum::{extract::State, http::StatusCode, Extension, Json};
use job_board_core::domain::{
    provider_job_id, Job, JobFilter, JobListing, JobPatch, JobType, NewJob, Page, PostedJob,
    RecruiterSummary, SalaryRange, User,
};
use job_board_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::middleware::AuthUser;
use crate::web::response::MessageResponse;
use crate::web::state::AppState;

/// How many provider listings are appended to each page.
pub const EXTERNAL_BATCH_SIZE: usize = 5;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_CURRENCY: &str = "USD";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryInput {
    pub min: i64,
    pub max: i64,
    pub currency: Option<String>,
}

/// The body of job create and update requests. Create requires every field
/// except `skillsRequired` and `salaryRange`; update takes any subset.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub location: Option<String>,
    pub experience_required: Option<String>,
    pub job_type: Option<JobType>,
    pub salary_range: Option<SalaryInput>,
    /// Ignored on create.
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct JobListQuery {
    /// Free text matched against title and description.
    pub search: Option<String>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Defaults to true.
    pub include_external: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub internal_count: usize,
    pub external_count: usize,
    pub jobs: Vec<JobListing>,
}

#[derive(Serialize, ToSchema)]
pub struct JobResponse {
    pub success: bool,
    pub job: Job,
}

#[derive(Serialize, ToSchema)]
pub struct JobDetailResponse {
    pub success: bool,
    pub job: JobListing,
}

#[derive(Serialize, ToSchema)]
pub struct JobsResponse {
    pub success: bool,
    pub count: usize,
    pub jobs: Vec<Job>,
}

//=========================================================================================
// Validation
//=========================================================================================

fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ApiError::Validation(format!(
            "{field} cannot be empty"
        ))),
        Some(v) => Ok(Some(v.trim().to_string())),
        None => Ok(None),
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("Please provide {field}")))
}

fn salary_range(input: SalaryInput) -> Result<SalaryRange, ApiError> {
    if input.min < 0 || input.max < 0 {
        return Err(ApiError::Validation(
            "Salary cannot be negative".to_string(),
        ));
    }
    if input.min > input.max {
        return Err(ApiError::Validation(
            "Minimum salary cannot exceed maximum salary".to_string(),
        ));
    }
    let currency = input
        .currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    Ok(SalaryRange {
        min: input.min,
        max: input.max,
        currency,
    })
}

fn clean_skills(skills: Vec<String>) -> Vec<String> {
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl JobPayload {
    /// Validates whatever fields are present.
    pub fn into_patch(self) -> Result<JobPatch, ApiError> {
        Ok(JobPatch {
            title: non_blank(self.title, "title")?,
            description: non_blank(self.description, "description")?,
            skills_required: self.skills_required.map(clean_skills),
            location: non_blank(self.location, "location")?,
            experience_required: non_blank(self.experience_required, "experienceRequired")?,
            job_type: self.job_type,
            salary_range: self.salary_range.map(salary_range).transpose()?,
            is_active: self.is_active,
        })
    }

    /// Validates a create request on behalf of `recruiter`.
    pub fn into_new_job(self, recruiter: &User) -> Result<NewJob, ApiError> {
        let patch = self.into_patch()?;
        Ok(NewJob {
            title: required(patch.title, "a job title")?,
            description: required(patch.description, "a job description")?,
            skills_required: patch.skills_required.unwrap_or_default(),
            location: required(patch.location, "a location")?,
            experience_required: required(patch.experience_required, "the experience required")?,
            job_type: required(patch.job_type, "a job type")?,
            salary_range: patch.salary_range,
            recruiter_id: recruiter.id,
            company_name: recruiter.display_company(),
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn job_not_found() -> ApiError {
    ApiError::NotFound("Job not found".to_string())
}

/// Loads a stored job and checks the caller may change it.
async fn owned_job(state: &AppState, auth: &AuthUser, job_id: Uuid, action: &str) -> Result<Job, ApiError> {
    let job = state.db.get_job_by_id(job_id).await?;
    if !auth.owns_or_admin(job.recruiter_id) {
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {action} this job"
        )));
    }
    Ok(job)
}

/// Joins each job with its recruiter's summary. Recruiters are fetched once each.
async fn with_recruiters(state: &AppState, jobs: Vec<Job>) -> Result<Vec<PostedJob>, ApiError> {
    let mut recruiters: HashMap<Uuid, Option<RecruiterSummary>> = HashMap::new();
    let mut posted = Vec::with_capacity(jobs.len());
    for job in jobs {
        if !recruiters.contains_key(&job.recruiter_id) {
            let summary = match state.db.get_user_by_id(job.recruiter_id).await {
                Ok(user) => Some(user.recruiter_summary()),
                Err(PortError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };
            recruiters.insert(job.recruiter_id, summary);
        }
        let recruiter = recruiters.get(&job.recruiter_id).cloned().flatten();
        posted.push(PostedJob { job, recruiter });
    }
    Ok(posted)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/jobs - Create a job (approved recruiters only)
#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "jobs",
    security(("bearer_auth" = [])),
    request_body = JobPayload,
    responses(
        (status = 201, description = "Job created", body = JobResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not an approved recruiter", body = ErrorBody)
    )
)]
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<JobPayload>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let recruiter = state.db.get_user_by_id(auth.id).await?;
    let new_job = payload.into_new_job(&recruiter)?;
    let job = state.db.create_job(new_job).await?;
    info!("Recruiter {} posted job {}", recruiter.id, job.id);
    Ok((
        StatusCode::CREATED,
        Json(JobResponse { success: true, job }),
    ))
}

/// GET /api/jobs - Active jobs, newest first, plus provider listings
#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "jobs",
    params(JobListQuery),
    responses(
        (status = 200, description = "A page of jobs", body = JobListResponse),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<JobListQuery>,
) -> Result<Json<JobListResponse>, ApiError> {
    let job_type = blank_to_none(query.job_type)
        .map(|raw| {
            raw.parse::<JobType>()
                .map_err(|e| ApiError::Validation(e.to_string()))
        })
        .transpose()?;
    let filter = JobFilter {
        search: blank_to_none(query.search),
        location: blank_to_none(query.location),
        job_type,
    };
    let page = Page::new(
        query.page.unwrap_or(1),
        query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
    );
    let include_external = query.include_external.unwrap_or(true);

    let search = filter.search.clone().unwrap_or_default();
    let location = filter.location.clone().unwrap_or_default();
    let external = async {
        if include_external {
            state
                .external_jobs
                .search(&search, &location, EXTERNAL_BATCH_SIZE)
                .await
        } else {
            Vec::new()
        }
    };
    let (internal, external) = tokio::join!(state.db.list_active_jobs(&filter, page), external);
    let internal = internal?;

    let internal_jobs = with_recruiters(&state, internal.items).await?;
    let internal_count = internal_jobs.len();
    let external_count = external.len();

    let jobs: Vec<JobListing> = internal_jobs
        .into_iter()
        .map(JobListing::Internal)
        .chain(external.into_iter().map(JobListing::External))
        .collect();

    Ok(Json(JobListResponse {
        success: true,
        count: jobs.len(),
        total: internal.total,
        total_pages: page.total_pages(internal.total),
        current_page: page.number,
        internal_count,
        external_count,
        jobs,
    }))
}

/// GET /api/jobs/{id} - A stored job, or a provider listing for `external_*` ids
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = String, Path, description = "Job id, or `external_<provider id>`")),
    responses(
        (status = 200, description = "The job", body = JobDetailResponse),
        (status = 404, description = "Job not found", body = ErrorBody)
    )
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<JobDetailResponse>, ApiError> {
    let listing = if provider_job_id(&id).is_some() {
        let external = state
            .external_jobs
            .fetch_by_id(&id)
            .await
            .ok_or_else(job_not_found)?;
        JobListing::External(external)
    } else {
        let job_id = Uuid::parse_str(&id).map_err(|_| job_not_found())?;
        let job = state.db.get_job_by_id(job_id).await?;
        let posted = with_recruiters(&state, vec![job])
            .await?
            .into_iter()
            .next()
            .ok_or_else(job_not_found)?;
        JobListing::Internal(posted)
    };
    Ok(Json(JobDetailResponse {
        success: true,
        job: listing,
    }))
}

/// GET /api/jobs/recruiter/my-jobs - Every job the caller posted
#[utoipa::path(
    get,
    path = "/api/jobs/recruiter/my-jobs",
    tag = "jobs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's jobs, newest first", body = JobsResponse),
        (status = 403, description = "Not a recruiter", body = ErrorBody)
    )
)]
pub async fn my_jobs(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<JobsResponse>, ApiError> {
    let jobs = state.db.list_jobs_by_recruiter(auth.id).await?;
    Ok(Json(JobsResponse {
        success: true,
        count: jobs.len(),
        jobs,
    }))
}

/// PUT /api/jobs/{id} - Partially update a job (owner or admin)
#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    tag = "jobs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Job id")),
    request_body = JobPayload,
    responses(
        (status = 200, description = "Updated job", body = JobResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Job not found", body = ErrorBody)
    )
)]
pub async fn update_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(job_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<JobPayload>,
) -> Result<Json<JobResponse>, ApiError> {
    owned_job(&state, &auth, job_id, "update").await?;
    let patch = payload.into_patch()?;
    let job = state.db.update_job(job_id, &patch).await?;
    Ok(Json(JobResponse { success: true, job }))
}

/// DELETE /api/jobs/{id} - Delete a job and its applications (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "jobs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Job not found", body = ErrorBody)
    )
)]
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_job(&state, &auth, job_id, "delete").await?;
    let removed = state.db.delete_job(job_id).await?;
    if removed > 0 {
        warn!("Deleting job {} removed {} applications", job_id, removed);
    }
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}
