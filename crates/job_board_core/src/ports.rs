//! crates/job_board_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the job board.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! handlers independent of the concrete store, object storage and job provider.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationStatus, ApplicationUpdate, ExternalJob, Job, JobFilter, JobPatch,
    NewApplication, NewJob, NewUser, Page, Paginated, ProfilePatch, Resume, User,
    UserCredentials, UserFilter,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---

    /// Fails with `Conflict` when the (case-insensitive) email is taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// Merges the patch into the stored user. Approval and résumé are left alone.
    async fn update_profile(&self, user_id: Uuid, patch: &ProfilePatch) -> PortResult<User>;

    async fn set_approval(&self, user_id: Uuid, is_approved: bool) -> PortResult<User>;

    /// Points the user at a new résumé and returns the one it replaced.
    async fn replace_resume(
        &self,
        user_id: Uuid,
        resume: &Resume,
    ) -> PortResult<(User, Option<Resume>)>;

    /// Removes the user with everything they own. Job application counts stay exact.
    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    /// Newest first. `None` returns every match.
    async fn list_users(&self, filter: &UserFilter, page: Option<Page>)
        -> PortResult<Paginated<User>>;

    async fn count_users(&self, filter: &UserFilter) -> PortResult<u64>;

    // --- Jobs ---

    async fn create_job(&self, new_job: NewJob) -> PortResult<Job>;

    async fn get_job_by_id(&self, job_id: Uuid) -> PortResult<Job>;

    /// Active jobs only, newest first.
    async fn list_active_jobs(&self, filter: &JobFilter, page: Page) -> PortResult<Paginated<Job>>;

    /// Every job of the recruiter regardless of `is_active`, newest first.
    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> PortResult<Vec<Job>>;

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> PortResult<Job>;

    /// Deletes the job and its applications, returning how many applications went with it.
    async fn delete_job(&self, job_id: Uuid) -> PortResult<u64>;

    async fn count_jobs(&self, active_only: bool) -> PortResult<u64>;

    // --- Applications ---

    /// Inserts the application and increments the job's `application_count` atomically.
    /// Fails with `Conflict` when the seeker already applied to the job.
    async fn create_application(&self, new_application: NewApplication)
        -> PortResult<Application>;

    async fn get_application_by_id(&self, application_id: Uuid) -> PortResult<Application>;

    async fn list_applications_by_seeker(&self, seeker_id: Uuid) -> PortResult<Vec<Application>>;

    async fn list_applications_by_job(&self, job_id: Uuid) -> PortResult<Vec<Application>>;

    async fn update_application(
        &self,
        application_id: Uuid,
        update: &ApplicationUpdate,
    ) -> PortResult<Application>;

    async fn count_applications(&self, status: Option<ApplicationStatus>) -> PortResult<u64>;
}

/// A third-party job search provider. Failures never escape this boundary.
#[async_trait]
pub trait ExternalJobService: Send + Sync {
    /// Returns at most `limit` normalized listings, or nothing when the provider fails.
    async fn search(&self, query: &str, location: &str, limit: usize) -> Vec<ExternalJob>;

    /// Resolves an `external_*` identifier, or `None` when the provider has no such job.
    async fn fetch_by_id(&self, external_id: &str) -> Option<ExternalJob>;
}

#[async_trait]
pub trait FileStorageService: Send + Sync {
    /// Stores the file and returns where it can be downloaded.
    async fn upload(&self, file_name: &str, data: Bytes) -> PortResult<Resume>;

    async fn delete(&self, public_id: &str) -> PortResult<()>;
}
