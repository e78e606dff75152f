//! services/api/src/web/rest.rs
//!
//! Assembles the HTTP router and holds the master definition for the OpenAPI
//! specification.

use crate::web::{
    admin, applications, auth, jobs,
    middleware::{
        require_admin, require_approved_recruiter, require_auth, require_job_seeker,
        require_recruiter, require_recruiter_or_admin,
    },
    response::{MessageResponse, UserResponse},
    state::AppState,
    users,
};
use crate::error::{ApiError, ErrorBody};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Json, Router,
};
use job_board_core::domain::{
    Analytics, ApplicantSummary, Application, ApplicationStats, ApplicationStatus, Company,
    CompanyPatch, ExternalJob, ExternalJobData, Job, JobListing, JobSeekerProfile, JobStats,
    JobSummary, JobType, PostedJob, ProfilePatch, RecruiterSummary, Resume, Role, SalaryRange,
    User, UserStats,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// Upper bound for request bodies, résumé uploads included.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::register,
        auth::login,
        auth::me,
        users::update_profile,
        users::upload_resume,
        users::get_public_profile,
        jobs::create_job,
        jobs::list_jobs,
        jobs::get_job,
        jobs::my_jobs,
        jobs::update_job,
        jobs::delete_job,
        applications::apply,
        applications::my_applications,
        applications::job_applications,
        applications::update_status,
        applications::get_application,
        admin::list_users,
        admin::pending_recruiters,
        admin::approve_recruiter,
        admin::delete_user,
        admin::analytics,
    ),
    components(
        schemas(
            ErrorBody, MessageResponse, UserResponse,
            Role, JobType, ApplicationStatus, Resume, JobSeekerProfile, Company, CompanyPatch,
            User, ProfilePatch, RecruiterSummary, ApplicantSummary, SalaryRange, Job, PostedJob,
            ExternalJobData, ExternalJob, JobListing, JobSummary, Application,
            UserStats, JobStats, ApplicationStats, Analytics,
            auth::RegisterRequest, auth::LoginRequest, auth::AuthResponse,
            users::ResumeUploadResponse,
            jobs::SalaryInput, jobs::JobPayload, jobs::JobListResponse, jobs::JobResponse,
            jobs::JobDetailResponse, jobs::JobsResponse,
            applications::ApplyRequest, applications::StatusUpdateRequest,
            applications::ApplicationResponse, applications::ApplicationDetailResponse,
            applications::SeekerApplicationsResponse, applications::JobApplicationsResponse,
            admin::ApprovalRequest, admin::UserListResponse, admin::PendingRecruitersResponse,
            admin::ApprovalResponse, admin::AnalyticsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and the current user."),
        (name = "users", description = "Profiles and résumés."),
        (name = "jobs", description = "Job postings, merged with provider listings."),
        (name = "applications", description = "Applying and the recruiter status workflow."),
        (name = "admin", description = "User management and platform analytics.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "auth",
    responses((status = 200, description = "The service is up", body = MessageResponse))
)]
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new("OK"))
}

/// Unknown `/api` paths answer in the usual error shape, never with the client bundle.
async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

//=========================================================================================
// Router
//=========================================================================================

/// Builds the complete application: the `/api` routes behind their role
/// guards, uploaded files, Swagger UI and, when configured, the client bundle.
pub fn app_router(state: Arc<AppState>) -> Router {
    let authenticated = || from_fn_with_state(state.clone(), require_auth);

    // Route layers run outermost-last, so `require_auth` is always added last.
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/profile/{id}", get(users::get_public_profile))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job));

    let user_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users/profile", put(users::update_profile))
        .route("/applications/{id}", get(applications::get_application))
        .route_layer(authenticated());

    let job_seeker_routes = Router::new()
        .route("/users/upload-resume", post(users::upload_resume))
        .route("/applications", post(applications::apply))
        .route(
            "/applications/my-applications",
            get(applications::my_applications),
        )
        .route_layer(from_fn(require_job_seeker))
        .route_layer(authenticated());

    let recruiter_routes = Router::new()
        .route("/jobs/recruiter/my-jobs", get(jobs::my_jobs))
        .route_layer(from_fn(require_recruiter))
        .route_layer(authenticated());

    let posting_routes = Router::new()
        .route("/jobs", post(jobs::create_job))
        .route_layer(from_fn(require_approved_recruiter))
        .route_layer(from_fn(require_recruiter))
        .route_layer(authenticated());

    let job_owner_routes = Router::new()
        .route("/jobs/{id}", put(jobs::update_job).delete(jobs::delete_job))
        .route(
            "/applications/job/{job_id}",
            get(applications::job_applications),
        )
        .route(
            "/applications/{id}/status",
            put(applications::update_status),
        )
        .route_layer(from_fn(require_recruiter_or_admin))
        .route_layer(authenticated());

    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/pending-recruiters", get(admin::pending_recruiters))
        .route(
            "/admin/approve-recruiter/{id}",
            put(admin::approve_recruiter),
        )
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route("/admin/analytics", get(admin::analytics))
        .route_layer(from_fn(require_admin))
        .route_layer(authenticated());

    let api_router = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(job_seeker_routes)
        .merge(recruiter_routes)
        .merge(posting_routes)
        .merge(job_owner_routes)
        .merge(admin_routes)
        .fallback(route_not_found);

    let cors = CorsLayer::new()
        .allow_origin(state.config.client_origin.clone())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(dist) = &state.config.client_dist_dir {
        let index = ServeFile::new(dist.join("index.html"));
        app = app.fallback_service(ServeDir::new(dist).fallback(index));
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
