//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Uniqueness (email, one application per job and seeker) is enforced by the
//! schema, and the application count is incremented in the same transaction
//! that inserts the application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use job_board_core::domain::{
    search_terms, Application, ApplicationStatus, ApplicationUpdate, Company, Job, JobFilter,
    JobPatch, JobSeekerProfile, NewApplication, NewJob, NewUser, Page, Paginated, ProfilePatch,
    Resume, Role, SalaryRange, User, UserCredentials, UserFilter,
};
use job_board_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone, is_approved, bio, \
    skills, experience, education, resume_url, resume_public_id, company_name, \
    company_website, company_description, company_location, created_at";

const JOB_COLUMNS: &str = "id, title, description, skills_required, location, \
    experience_required, job_type, salary_min, salary_max, salary_currency, recruiter_id, \
    company_name, application_count, is_active, posted_at";

const APPLICATION_COLUMNS: &str = "id, job_id, job_seeker_id, resume_url, cover_letter, \
    status, recruiter_notes, applied_at, updated_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn user_not_found() -> PortError {
    PortError::NotFound("User not found".to_string())
}

fn job_not_found() -> PortError {
    PortError::NotFound("Job not found".to_string())
}

fn application_not_found() -> PortError {
    PortError::NotFound("Application not found".to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn to_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_user_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(approved) = filter.is_approved {
        qb.push(" AND is_approved = ").push_bind(approved);
    }
}

fn push_active_job_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    qb.push(" WHERE is_active = TRUE");
    if let Some(search) = &filter.search {
        // Terms are alphanumeric, so joining them with `|` is a valid tsquery.
        let terms = search_terms(search);
        if !terms.is_empty() {
            qb.push(" AND to_tsvector('english', title || ' ' || description) @@ to_tsquery('english', ")
                .push_bind(terms.join(" | "))
                .push(")");
        }
    }
    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ")
            .push_bind(format!("%{}%", escape_like(location)));
    }
    if let Some(job_type) = filter.job_type {
        qb.push(" AND job_type = ").push_bind(job_type.as_str());
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    phone: Option<String>,
    is_approved: bool,
    bio: Option<String>,
    skills: Vec<String>,
    experience: Option<String>,
    education: Option<String>,
    resume_url: Option<String>,
    resume_public_id: Option<String>,
    company_name: Option<String>,
    company_website: Option<String>,
    company_description: Option<String>,
    company_location: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: job_board_core::domain::ParseEnumError| {
                PortError::Unexpected(e.to_string())
            })?;

        let profile = if role == Role::JobSeeker {
            let resume = match (self.resume_url, self.resume_public_id) {
                (Some(url), Some(public_id)) => Some(Resume { url, public_id }),
                _ => None,
            };
            Some(JobSeekerProfile {
                bio: self.bio,
                skills: self.skills,
                experience: self.experience,
                education: self.education,
                resume,
            })
        } else {
            None
        };

        let company = self.company_name.map(|name| Company {
            name,
            website: self.company_website,
            description: self.company_description,
            location: self.company_location,
        });

        Ok(UserCredentials {
            user: User {
                id: self.id,
                name: self.name,
                email: self.email,
                role,
                phone: self.phone,
                profile,
                company,
                is_approved: self.is_approved,
                created_at: self.created_at,
            },
            hashed_password: self.password_hash,
        })
    }

    fn to_user(self) -> PortResult<User> {
        self.to_domain().map(|creds| creds.user)
    }
}

#[derive(FromRow)]
struct JobRecord {
    id: Uuid,
    title: String,
    description: String,
    skills_required: Vec<String>,
    location: String,
    experience_required: String,
    job_type: String,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_currency: Option<String>,
    recruiter_id: Uuid,
    company_name: String,
    application_count: i64,
    is_active: bool,
    posted_at: DateTime<Utc>,
}
impl JobRecord {
    fn to_domain(self) -> PortResult<Job> {
        let job_type = self
            .job_type
            .parse()
            .map_err(|e: job_board_core::domain::ParseEnumError| {
                PortError::Unexpected(e.to_string())
            })?;
        let salary_range = match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) => Some(SalaryRange {
                min,
                max,
                currency: self.salary_currency.unwrap_or_else(|| "USD".to_string()),
            }),
            _ => None,
        };
        Ok(Job {
            id: self.id,
            title: self.title,
            description: self.description,
            skills_required: self.skills_required,
            location: self.location,
            experience_required: self.experience_required,
            job_type,
            salary_range,
            recruiter_id: self.recruiter_id,
            company_name: self.company_name,
            application_count: self.application_count,
            is_active: self.is_active,
            posted_at: self.posted_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicationRecord {
    id: Uuid,
    job_id: Uuid,
    job_seeker_id: Uuid,
    resume_url: String,
    cover_letter: Option<String>,
    status: String,
    recruiter_notes: Option<String>,
    applied_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ApplicationRecord {
    fn to_domain(self) -> PortResult<Application> {
        let status: ApplicationStatus = self
            .status
            .parse()
            .map_err(|e: job_board_core::domain::ParseEnumError| {
                PortError::Unexpected(e.to_string())
            })?;
        Ok(Application {
            id: self.id,
            job_id: self.job_id,
            job_seeker_id: self.job_seeker_id,
            resume_url: self.resume_url,
            cover_letter: self.cover_letter,
            status,
            recruiter_notes: self.recruiter_notes,
            applied_at: self.applied_at,
            updated_at: self.updated_at,
        })
    }
}

fn jobs_to_domain(records: Vec<JobRecord>) -> PortResult<Vec<Job>> {
    records.into_iter().map(JobRecord::to_domain).collect()
}

fn applications_to_domain(records: Vec<ApplicationRecord>) -> PortResult<Vec<Application>> {
    records
        .into_iter()
        .map(ApplicationRecord::to_domain)
        .collect()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, phone, is_approved, \
             company_name, company_website, company_description, company_location) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {USER_COLUMNS}"
        );
        let company = new_user.company.unwrap_or_default();
        let has_company = !company.name.is_empty();

        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(new_user.email.trim().to_lowercase())
            .bind(&new_user.hashed_password)
            .bind(new_user.role.as_str())
            .bind(&new_user.phone)
            .bind(new_user.is_approved)
            .bind(has_company.then_some(company.name))
            .bind(company.website)
            .bind(company.description)
            .bind(company.location)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Conflict("User already exists with this email".to_string())
                } else {
                    unexpected(e)
                }
            })?;
        record.to_user()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(user_not_found)?
            .to_user()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(user_not_found)?
            .to_domain()
    }

    async fn update_profile(&self, user_id: Uuid, patch: &ProfilePatch) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let select = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let mut user = sqlx::query_as::<_, UserRecord>(&select)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(user_not_found)?
            .to_user()?;
        user.apply_profile_patch(patch.clone());

        // Approval and résumé columns have their own writers.
        let sql = format!(
            "UPDATE users SET name = $2, phone = $3, bio = $4, skills = $5, experience = $6, \
             education = $7, company_name = $8, company_website = $9, \
             company_description = $10, company_location = $11 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let profile = user.profile.unwrap_or_default();
        let company = user.company;
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user.id)
            .bind(user.name)
            .bind(user.phone)
            .bind(profile.bio)
            .bind(profile.skills)
            .bind(profile.experience)
            .bind(profile.education)
            .bind(company.as_ref().map(|c| c.name.clone()))
            .bind(company.as_ref().and_then(|c| c.website.clone()))
            .bind(company.as_ref().and_then(|c| c.description.clone()))
            .bind(company.as_ref().and_then(|c| c.location.clone()))
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        record.to_user()
    }

    async fn set_approval(&self, user_id: Uuid, is_approved: bool) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET is_approved = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .bind(is_approved)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(user_not_found)?
            .to_user()
    }

    async fn replace_resume(
        &self,
        user_id: Uuid,
        resume: &Resume,
    ) -> PortResult<(User, Option<Resume>)> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let (old_url, old_public_id): (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT resume_url, resume_public_id FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(user_not_found)?;

        let sql = format!(
            "UPDATE users SET resume_url = $2, resume_public_id = $3 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .bind(&resume.url)
            .bind(&resume.public_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        let previous = match (old_url, old_public_id) {
            (Some(url), Some(public_id)) => Some(Resume { url, public_id }),
            _ => None,
        };
        Ok((record.to_user()?, previous))
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // The cascade removes the seeker's applications; keep their jobs' counts exact.
        sqlx::query(
            "UPDATE jobs SET application_count = application_count - 1 \
             WHERE id IN (SELECT job_id FROM applications WHERE job_seeker_id = $1)",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if deleted.rows_affected() == 0 {
            return Err(user_not_found());
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: Option<Page>,
    ) -> PortResult<Paginated<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_user_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(i64::from(page.limit))
                .push(" OFFSET ")
                .push_bind(page.offset() as i64);
        }

        let records = qb
            .build_query_as::<UserRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        let items = records
            .into_iter()
            .map(UserRecord::to_user)
            .collect::<PortResult<Vec<_>>>()?;
        let total = self.count_users(filter).await?;
        Ok(Paginated { items, total })
    }

    async fn count_users(&self, filter: &UserFilter) -> PortResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_filter(&mut qb, filter);
        let (count,): (i64,) = qb
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(to_count(count))
    }

    async fn create_job(&self, new_job: NewJob) -> PortResult<Job> {
        let sql = format!(
            "INSERT INTO jobs (id, title, description, skills_required, location, \
             experience_required, job_type, salary_min, salary_max, salary_currency, \
             recruiter_id, company_name, application_count, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, TRUE) \
             RETURNING {JOB_COLUMNS}"
        );
        let salary = new_job.salary_range;
        sqlx::query_as::<_, JobRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(new_job.title)
            .bind(new_job.description)
            .bind(new_job.skills_required)
            .bind(new_job.location)
            .bind(new_job.experience_required)
            .bind(new_job.job_type.as_str())
            .bind(salary.as_ref().map(|s| s.min))
            .bind(salary.as_ref().map(|s| s.max))
            .bind(salary.map(|s| s.currency))
            .bind(new_job.recruiter_id)
            .bind(new_job.company_name)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> PortResult<Job> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, JobRecord>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(job_not_found)?
            .to_domain()
    }

    async fn list_active_jobs(&self, filter: &JobFilter, page: Page) -> PortResult<Paginated<Job>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
        push_active_job_filter(&mut qb, filter);
        qb.push(" ORDER BY posted_at DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let records = qb
            .build_query_as::<JobRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        push_active_job_filter(&mut count_qb, filter);
        let (total,): (i64,) = count_qb
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(Paginated {
            items: jobs_to_domain(records)?,
            total: to_count(total),
        })
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> PortResult<Vec<Job>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE recruiter_id = $1 ORDER BY posted_at DESC"
        );
        let records = sqlx::query_as::<_, JobRecord>(&sql)
            .bind(recruiter_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        jobs_to_domain(records)
    }

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> PortResult<Job> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let select = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE");
        let mut job = sqlx::query_as::<_, JobRecord>(&select)
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(job_not_found)?
            .to_domain()?;
        patch.apply_to(&mut job);

        // `application_count` is only ever written by the apply and delete paths.
        let sql = format!(
            "UPDATE jobs SET title = $2, description = $3, skills_required = $4, location = $5, \
             experience_required = $6, job_type = $7, salary_min = $8, salary_max = $9, \
             salary_currency = $10, is_active = $11 WHERE id = $1 RETURNING {JOB_COLUMNS}"
        );
        let salary = job.salary_range;
        let record = sqlx::query_as::<_, JobRecord>(&sql)
            .bind(job.id)
            .bind(job.title)
            .bind(job.description)
            .bind(job.skills_required)
            .bind(job.location)
            .bind(job.experience_required)
            .bind(job.job_type.as_str())
            .bind(salary.as_ref().map(|s| s.min))
            .bind(salary.as_ref().map(|s| s.max))
            .bind(salary.map(|s| s.currency))
            .bind(job.is_active)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        record.to_domain()
    }

    async fn delete_job(&self, job_id: Uuid) -> PortResult<u64> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let (applications,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM applications WHERE job_id = $1")
                .bind(job_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;

        let deleted = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if deleted.rows_affected() == 0 {
            return Err(job_not_found());
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(to_count(applications))
    }

    async fn count_jobs(&self, active_only: bool) -> PortResult<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE ($1 = FALSE OR is_active = TRUE)")
                .bind(active_only)
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(to_count(count))
    }

    async fn create_application(
        &self,
        new_application: NewApplication,
    ) -> PortResult<Application> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let sql = format!(
            "INSERT INTO applications (id, job_id, job_seeker_id, resume_url, cover_letter, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {APPLICATION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(new_application.job_id)
            .bind(new_application.job_seeker_id)
            .bind(new_application.resume_url)
            .bind(new_application.cover_letter)
            .bind(ApplicationStatus::Applied.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Conflict("You have already applied for this job".to_string())
                } else if is_foreign_key_violation(&e) {
                    job_not_found()
                } else {
                    unexpected(e)
                }
            })?;

        sqlx::query("UPDATE jobs SET application_count = application_count + 1 WHERE id = $1")
            .bind(new_application.job_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_application_by_id(&self, application_id: Uuid) -> PortResult<Application> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(application_not_found)?
            .to_domain()
    }

    async fn list_applications_by_seeker(&self, seeker_id: Uuid) -> PortResult<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_seeker_id = $1 \
             ORDER BY applied_at DESC"
        );
        let records = sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(seeker_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        applications_to_domain(records)
    }

    async fn list_applications_by_job(&self, job_id: Uuid) -> PortResult<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 \
             ORDER BY applied_at DESC"
        );
        let records = sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        applications_to_domain(records)
    }

    async fn update_application(
        &self,
        application_id: Uuid,
        update: &ApplicationUpdate,
    ) -> PortResult<Application> {
        let sql = format!(
            "UPDATE applications SET status = COALESCE($2, status), \
             recruiter_notes = COALESCE($3, recruiter_notes), updated_at = NOW() \
             WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(application_id)
            .bind(update.status.map(|status| status.as_str()))
            .bind(update.recruiter_notes.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(application_not_found)?
            .to_domain()
    }

    async fn count_applications(&self, status: Option<ApplicationStatus>) -> PortResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status.map(|status| status.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(to_count(count))
    }
}
