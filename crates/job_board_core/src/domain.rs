//! crates/job_board_core/src/domain.rs
//!
//! Defines the pure, core data structures for the job board.
//! Field names serialize to the camelCase JSON contract the client consumes,
//! with record identifiers exposed as `_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Prefix that marks a job identifier as belonging to the external provider.
pub const EXTERNAL_ID_PREFIX: &str = "external_";

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

//=========================================================================================
// Enumerations
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Recruiter,
    JobSeeker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Recruiter => "RECRUITER",
            Role::JobSeeker => "JOB_SEEKER",
        }
    }

    /// Recruiters start unapproved and wait for an admin.
    pub fn approved_by_default(&self) -> bool {
        !matches!(self, Role::Recruiter)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "RECRUITER" => Ok(Role::Recruiter),
            "JOB_SEEKER" => Ok(Role::JobSeeker),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Internship,
    Remote,
    Contract,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Internship => "Internship",
            JobType::Remote => "Remote",
            JobType::Contract => "Contract",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Full-time" => Ok(JobType::FullTime),
            "Part-time" => Ok(JobType::PartTime),
            "Internship" => Ok(JobType::Internship),
            "Remote" => Ok(JobType::Remote),
            "Contract" => Ok(JobType::Contract),
            other => Err(ParseEnumError {
                kind: "job type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Shortlisted,
    Interview,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interview,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Hired => "Hired",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "application status",
                value: s.to_string(),
            })
    }
}

//=========================================================================================
// Users
//=========================================================================================

/// A reference to a file held by the external object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerProfile {
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub resume: Option<Resume>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// A user as it may be shown to clients. The password hash never lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    /// Present for job seekers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<JobSeekerProfile>,
    /// Present for recruiters only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn resume(&self) -> Option<&Resume> {
        self.profile.as_ref().and_then(|p| p.resume.as_ref())
    }

    /// The name denormalized onto jobs: the company name, or the recruiter's own.
    pub fn display_company(&self) -> String {
        self.company
            .as_ref()
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.name.as_str())
            .to_string()
    }

    /// Merges a profile patch field by field. Seeker fields only apply to job
    /// seekers and company fields only to recruiters.
    pub fn apply_profile_patch(&mut self, patch: ProfilePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }

        match self.role {
            Role::JobSeeker => {
                let profile = self.profile.get_or_insert_with(JobSeekerProfile::default);
                if let Some(bio) = patch.bio {
                    profile.bio = Some(bio);
                }
                if let Some(skills) = patch.skills {
                    profile.skills = skills;
                }
                if let Some(experience) = patch.experience {
                    profile.experience = Some(experience);
                }
                if let Some(education) = patch.education {
                    profile.education = Some(education);
                }
            }
            Role::Recruiter => {
                if let Some(company_patch) = patch.company {
                    let company = self.company.get_or_insert_with(Company::default);
                    company_patch.apply_to(company);
                }
            }
            Role::Admin => {}
        }
    }

    pub fn recruiter_summary(&self) -> RecruiterSummary {
        RecruiterSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
        }
    }

    pub fn applicant_summary(&self) -> ApplicantSummary {
        ApplicantSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            profile: self.profile.clone(),
        }
    }
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// Everything needed to persist a freshly registered account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub company: Option<Company>,
    pub is_approved: bool,
}

impl NewUser {
    pub fn new(name: String, email: String, hashed_password: String, role: Role) -> Self {
        Self {
            name,
            email,
            hashed_password,
            role,
            phone: None,
            company: None,
            is_approved: role.approved_by_default(),
        }
    }

    /// The profile a new account starts with.
    pub fn initial_profile(&self) -> Option<JobSeekerProfile> {
        (self.role == Role::JobSeeker).then(JobSeekerProfile::default)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl CompanyPatch {
    pub fn apply_to(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(website) = self.website {
            company.website = Some(website);
        }
        if let Some(description) = self.description {
            company.description = Some(description);
        }
        if let Some(location) = self.location {
            company.location = Some(location);
        }
    }
}

/// A self-service profile update. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub company: Option<CompanyPatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<JobSeekerProfile>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_approved: Option<bool>,
}

impl UserFilter {
    pub fn pending_recruiters() -> Self {
        Self {
            role: Some(Role::Recruiter),
            is_approved: Some(false),
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |role| user.role == role)
            && self.is_approved.map_or(true, |approved| user.is_approved == approved)
    }
}

//=========================================================================================
// Jobs
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
    pub currency: String,
}

/// A posting owned by exactly one recruiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub experience_required: String,
    pub job_type: JobType,
    pub salary_range: Option<SalaryRange>,
    pub recruiter_id: Uuid,
    pub company_name: String,
    pub application_count: i64,
    pub is_active: bool,
    pub posted_at: DateTime<Utc>,
}

impl Job {
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.to_string(),
            title: self.title.clone(),
            company_name: self.company_name.clone(),
            location: self.location.clone(),
            job_type: self.job_type,
            salary_range: self.salary_range.clone(),
            is_external: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub experience_required: String,
    pub job_type: JobType,
    pub salary_range: Option<SalaryRange>,
    pub recruiter_id: Uuid,
    pub company_name: String,
}

/// A partial update of the editable job fields.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub location: Option<String>,
    pub experience_required: Option<String>,
    pub job_type: Option<JobType>,
    pub salary_range: Option<SalaryRange>,
    pub is_active: Option<bool>,
}

impl JobPatch {
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(title) = &self.title {
            job.title = title.clone();
        }
        if let Some(description) = &self.description {
            job.description = description.clone();
        }
        if let Some(skills) = &self.skills_required {
            job.skills_required = skills.clone();
        }
        if let Some(location) = &self.location {
            job.location = location.clone();
        }
        if let Some(experience) = &self.experience_required {
            job.experience_required = experience.clone();
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(salary) = &self.salary_range {
            job.salary_range = Some(salary.clone());
        }
        if let Some(is_active) = self.is_active {
            job.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// Free text matched against title and description.
    pub search: Option<String>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    pub job_type: Option<JobType>,
}

/// Splits free text into lowercase alphanumeric search terms.
pub fn search_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A job posting joined with its recruiter for display.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostedJob {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recruiter: Option<RecruiterSummary>,
}

/// Provider metadata passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalJobData {
    pub publisher: Option<String>,
    pub employer_logo: Option<String>,
    pub job_id: String,
    pub highlights: Option<serde_json::Value>,
    pub benefits: Option<serde_json::Value>,
}

/// A third-party listing normalized into the internal job shape. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalJob {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub experience_required: String,
    pub job_type: JobType,
    pub salary_range: Option<SalaryRange>,
    pub company_name: String,
    pub application_count: i64,
    pub is_active: bool,
    pub posted_at: DateTime<Utc>,
    pub is_external: bool,
    pub source: String,
    pub external_url: String,
    pub external_data: ExternalJobData,
}

impl ExternalJob {
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            company_name: self.company_name.clone(),
            location: self.location.clone(),
            job_type: self.job_type,
            salary_range: self.salary_range.clone(),
            is_external: true,
        }
    }
}

/// Builds the identifier under which an external listing can be fetched again.
pub fn external_job_id(provider_job_id: &str) -> String {
    format!("{EXTERNAL_ID_PREFIX}{provider_job_id}")
}

/// Returns the provider's own id when `id` names an external listing.
pub fn provider_job_id(id: &str) -> Option<&str> {
    id.strip_prefix(EXTERNAL_ID_PREFIX)
}

/// Either a stored posting or a transient provider listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum JobListing {
    Internal(PostedJob),
    External(ExternalJob),
}

impl JobListing {
    pub fn id(&self) -> String {
        match self {
            JobListing::Internal(posted) => posted.job.id.to_string(),
            JobListing::External(external) => external.id.clone(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, JobListing::External(_))
    }

    pub fn summary(&self) -> JobSummary {
        match self {
            JobListing::Internal(posted) => posted.job.summary(),
            JobListing::External(external) => external.summary(),
        }
    }
}

/// The display projection shared by internal and external jobs.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub salary_range: Option<SalaryRange>,
    pub is_external: bool,
}

//=========================================================================================
// Applications
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_seeker_id: Uuid,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub recruiter_notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Replaces the job and seeker ids with whatever the caller resolved them to.
    pub fn with_refs<J, S>(self, job: J, seeker: S) -> ApplicationDetails<J, S> {
        ApplicationDetails {
            id: self.id,
            job_id: job,
            job_seeker_id: seeker,
            resume_url: self.resume_url,
            cover_letter: self.cover_letter,
            status: self.status,
            recruiter_notes: self.recruiter_notes,
            applied_at: self.applied_at,
            updated_at: self.updated_at,
        }
    }
}

/// An application with its references populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails<J, S> {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub job_id: J,
    pub job_seeker_id: S,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub recruiter_notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub job_seeker_id: Uuid,
    pub resume_url: String,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationUpdate {
    pub status: Option<ApplicationStatus>,
    pub recruiter_notes: Option<String>,
}

//=========================================================================================
// Pagination & Analytics
//=========================================================================================

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(number: u32, limit: u32) -> Self {
        Self {
            number: number.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    pub job_seekers: u64,
    pub recruiters: u64,
    pub pending_recruiters: u64,
    pub approved_recruiters: u64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct JobStats {
    pub total: u64,
    pub active: u64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ApplicationStats {
    pub total: u64,
    pub applied: u64,
    pub shortlisted: u64,
    pub interview: u64,
    pub rejected: u64,
    pub hired: u64,
}

impl ApplicationStats {
    pub fn record(&mut self, status: ApplicationStatus, count: u64) {
        let slot = match status {
            ApplicationStatus::Applied => &mut self.applied,
            ApplicationStatus::Shortlisted => &mut self.shortlisted,
            ApplicationStatus::Interview => &mut self.interview,
            ApplicationStatus::Rejected => &mut self.rejected,
            ApplicationStatus::Hired => &mut self.hired,
        };
        *slot = count;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub users: UserStats,
    pub jobs: JobStats,
    pub applications: ApplicationStats,
    pub recent_users: Vec<User>,
}
