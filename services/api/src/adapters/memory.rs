//! services/api/src/adapters/memory.rs
//!
//! In-memory implementation of the `DatabaseService` port.
//!
//! Suitable for development runs (`DATABASE_URL=memory://`) and tests. All
//! tables sit behind one async lock, so every write, including the
//! application insert plus count increment, is atomic. Data is lost on restart.
//!
//! Search folds plural suffixes only, a rough stand-in for the English
//! stemming PostgreSQL applies, so results can differ for other inflections.

use async_trait::async_trait;
use chrono::Utc;
use job_board_core::domain::{
    search_terms, Application, ApplicationStatus, ApplicationUpdate, Job, JobFilter, JobPatch,
    NewApplication, NewJob, NewUser, Page, Paginated, ProfilePatch, Resume, User,
    UserCredentials, UserFilter,
};
use job_board_core::ports::{DatabaseService, PortError, PortResult};
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredUser {
    user: User,
    hashed_password: String,
}

// Rows are kept in insertion order; newest-first listings walk them in reverse.
#[derive(Default)]
struct Tables {
    users: Vec<StoredUser>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
}

impl Tables {
    fn user_mut(&mut self, user_id: Uuid) -> PortResult<&mut User> {
        self.users
            .iter_mut()
            .map(|stored| &mut stored.user)
            .find(|user| user.id == user_id)
            .ok_or_else(user_not_found)
    }

    fn job_mut(&mut self, job_id: Uuid) -> PortResult<&mut Job> {
        self.jobs
            .iter_mut()
            .find(|job| job.id == job_id)
            .ok_or_else(job_not_found)
    }
}

/// A `DatabaseService` that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryDbAdapter {
    tables: RwLock<Tables>,
}

impl MemoryDbAdapter {
    pub fn new() -> Self {
        Self::default()
    }
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

/// Newest first; for equal timestamps the later insert wins.
fn newest_first<T: Clone, K: Ord>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let mut sorted: Vec<T> = rows.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));
    sorted
}

fn paginate<T>(rows: Vec<T>, page: Page) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

/// Folds `engineers`/`boxes`/`salaries` onto their singular form.
fn stem(word: &str) -> String {
    if let Some(base) = word.strip_suffix("ies").filter(|base| base.len() > 1) {
        return format!("{base}y");
    }
    for suffix in ["ches", "shes", "sses", "xes"] {
        if let Some(base) = word.strip_suffix(suffix) {
            return format!("{base}{}", &suffix[..suffix.len() - 2]);
        }
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Any search term sharing a stem with a word of the title or description is a match.
fn matches_search(job: &Job, terms: &[String]) -> bool {
    let words: Vec<String> = search_terms(&job.title)
        .into_iter()
        .chain(search_terms(&job.description))
        .map(|word| stem(&word))
        .collect();
    terms.iter().any(|term| words.contains(&stem(term)))
}

fn matches_job_filter(job: &Job, filter: &JobFilter) -> bool {
    if let Some(search) = &filter.search {
        let terms = search_terms(search);
        if !terms.is_empty() && !matches_search(job, &terms) {
            return false;
        }
    }
    if let Some(location) = &filter.location {
        if !job
            .location
            .to_lowercase()
            .contains(&location.to_lowercase())
        {
            return false;
        }
    }
    filter.job_type.map_or(true, |job_type| job.job_type == job_type)
}

#[async_trait]
impl DatabaseService for MemoryDbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        let email = new_user.email.trim().to_lowercase();
        if tables.users.iter().any(|stored| stored.user.email == email) {
            return Err(PortError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            profile: new_user.initial_profile(),
            name: new_user.name,
            email,
            role: new_user.role,
            phone: new_user.phone,
            company: new_user.company,
            is_approved: new_user.is_approved,
            created_at: Utc::now(),
        };
        tables.users.push(StoredUser {
            user: user.clone(),
            hashed_password: new_user.hashed_password,
        });
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|stored| stored.user.id == user_id)
            .map(|stored| stored.user.clone())
            .ok_or_else(user_not_found)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let email = email.trim().to_lowercase();
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|stored| stored.user.email == email)
            .map(|stored| UserCredentials {
                user: stored.user.clone(),
                hashed_password: stored.hashed_password.clone(),
            })
            .ok_or_else(user_not_found)
    }

    async fn update_profile(&self, user_id: Uuid, patch: &ProfilePatch) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(user_id)?;
        user.apply_profile_patch(patch.clone());
        Ok(user.clone())
    }

    async fn set_approval(&self, user_id: Uuid, is_approved: bool) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(user_id)?;
        user.is_approved = is_approved;
        Ok(user.clone())
    }

    async fn replace_resume(
        &self,
        user_id: Uuid,
        resume: &Resume,
    ) -> PortResult<(User, Option<Resume>)> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(user_id)?;
        let profile = user.profile.get_or_insert_with(Default::default);
        let previous = profile.resume.replace(resume.clone());
        Ok((user.clone(), previous))
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|stored| stored.user.id != user_id);
        if tables.users.len() == before {
            return Err(user_not_found());
        }

        let owned_jobs: Vec<Uuid> = tables
            .jobs
            .iter()
            .filter(|job| job.recruiter_id == user_id)
            .map(|job| job.id)
            .collect();
        tables.jobs.retain(|job| job.recruiter_id != user_id);

        let withdrawn: Vec<Uuid> = tables
            .applications
            .iter()
            .filter(|app| app.job_seeker_id == user_id)
            .map(|app| app.job_id)
            .collect();
        for job_id in withdrawn {
            if let Ok(job) = tables.job_mut(job_id) {
                job.application_count -= 1;
            }
        }
        tables.applications.retain(|app| {
            app.job_seeker_id != user_id && !owned_jobs.contains(&app.job_id)
        });
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: Option<Page>,
    ) -> PortResult<Paginated<User>> {
        let tables = self.tables.read().await;
        let matching: Vec<User> = tables
            .users
            .iter()
            .map(|stored| stored.user.clone())
            .filter(|user| filter.matches(user))
            .collect();
        let sorted = newest_first(&matching, |user| user.created_at);
        let total = sorted.len() as u64;
        let items = match page {
            Some(page) => paginate(sorted, page),
            None => sorted,
        };
        Ok(Paginated { items, total })
    }

    async fn count_users(&self, filter: &UserFilter) -> PortResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|stored| filter.matches(&stored.user))
            .count() as u64)
    }

    async fn create_job(&self, new_job: NewJob) -> PortResult<Job> {
        let mut tables = self.tables.write().await;
        let job = Job {
            id: Uuid::new_v4(),
            title: new_job.title,
            description: new_job.description,
            skills_required: new_job.skills_required,
            location: new_job.location,
            experience_required: new_job.experience_required,
            job_type: new_job.job_type,
            salary_range: new_job.salary_range,
            recruiter_id: new_job.recruiter_id,
            company_name: new_job.company_name,
            application_count: 0,
            is_active: true,
            posted_at: Utc::now(),
        };
        tables.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> PortResult<Job> {
        let tables = self.tables.read().await;
        tables
            .jobs
            .iter()
            .find(|job| job.id == job_id)
            .cloned()
            .ok_or_else(job_not_found)
    }

    async fn list_active_jobs(&self, filter: &JobFilter, page: Page) -> PortResult<Paginated<Job>> {
        let tables = self.tables.read().await;
        let matching: Vec<Job> = tables
            .jobs
            .iter()
            .filter(|job| job.is_active && matches_job_filter(job, filter))
            .cloned()
            .collect();
        let sorted = newest_first(&matching, |job| job.posted_at);
        let total = sorted.len() as u64;
        Ok(Paginated {
            items: paginate(sorted, page),
            total,
        })
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> PortResult<Vec<Job>> {
        let tables = self.tables.read().await;
        let owned: Vec<Job> = tables
            .jobs
            .iter()
            .filter(|job| job.recruiter_id == recruiter_id)
            .cloned()
            .collect();
        Ok(newest_first(&owned, |job| job.posted_at))
    }

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> PortResult<Job> {
        let mut tables = self.tables.write().await;
        let job = tables.job_mut(job_id)?;
        patch.apply_to(job);
        Ok(job.clone())
    }

    async fn delete_job(&self, job_id: Uuid) -> PortResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.jobs.len();
        tables.jobs.retain(|job| job.id != job_id);
        if tables.jobs.len() == before {
            return Err(job_not_found());
        }
        let applications_before = tables.applications.len();
        tables.applications.retain(|app| app.job_id != job_id);
        Ok((applications_before - tables.applications.len()) as u64)
    }

    async fn count_jobs(&self, active_only: bool) -> PortResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .iter()
            .filter(|job| !active_only || job.is_active)
            .count() as u64)
    }

    async fn create_application(
        &self,
        new_application: NewApplication,
    ) -> PortResult<Application> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.applications.iter().any(|app| {
            app.job_id == new_application.job_id
                && app.job_seeker_id == new_application.job_seeker_id
        });
        if duplicate {
            return Err(PortError::Conflict(
                "You have already applied for this job".to_string(),
            ));
        }

        tables.job_mut(new_application.job_id)?.application_count += 1;

        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            job_id: new_application.job_id,
            job_seeker_id: new_application.job_seeker_id,
            resume_url: new_application.resume_url,
            cover_letter: new_application.cover_letter,
            status: ApplicationStatus::Applied,
            recruiter_notes: None,
            applied_at: now,
            updated_at: now,
        };
        tables.applications.push(application.clone());
        Ok(application)
    }

    async fn get_application_by_id(&self, application_id: Uuid) -> PortResult<Application> {
        let tables = self.tables.read().await;
        tables
            .applications
            .iter()
            .find(|app| app.id == application_id)
            .cloned()
            .ok_or_else(application_not_found)
    }

    async fn list_applications_by_seeker(&self, seeker_id: Uuid) -> PortResult<Vec<Application>> {
        let tables = self.tables.read().await;
        let mine: Vec<Application> = tables
            .applications
            .iter()
            .filter(|app| app.job_seeker_id == seeker_id)
            .cloned()
            .collect();
        Ok(newest_first(&mine, |app| app.applied_at))
    }

    async fn list_applications_by_job(&self, job_id: Uuid) -> PortResult<Vec<Application>> {
        let tables = self.tables.read().await;
        let for_job: Vec<Application> = tables
            .applications
            .iter()
            .filter(|app| app.job_id == job_id)
            .cloned()
            .collect();
        Ok(newest_first(&for_job, |app| app.applied_at))
    }

    async fn update_application(
        &self,
        application_id: Uuid,
        update: &ApplicationUpdate,
    ) -> PortResult<Application> {
        let mut tables = self.tables.write().await;
        let application = tables
            .applications
            .iter_mut()
            .find(|app| app.id == application_id)
            .ok_or_else(application_not_found)?;

        if let Some(status) = update.status {
            application.status = status;
        }
        if let Some(notes) = &update.recruiter_notes {
            application.recruiter_notes = Some(notes.clone());
        }
        application.updated_at = Utc::now();
        Ok(application.clone())
    }

    async fn count_applications(&self, status: Option<ApplicationStatus>) -> PortResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .iter()
            .filter(|app| status.map_or(true, |s| app.status == s))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_board_core::domain::{JobType, Role};
    use std::sync::Arc;

    async fn seed_user(db: &MemoryDbAdapter, email: &str, role: Role) -> User {
        db.create_user(NewUser::new(
            "Test User".to_string(),
            email.to_string(),
            "hash".to_string(),
            role,
        ))
        .await
        .unwrap()
    }

    async fn seed_job(db: &MemoryDbAdapter, recruiter: &User, title: &str) -> Job {
        db.create_job(NewJob {
            title: title.to_string(),
            description: "Work on distributed systems".to_string(),
            skills_required: vec!["rust".to_string()],
            location: "Berlin, Germany".to_string(),
            experience_required: "2 years".to_string(),
            job_type: JobType::FullTime,
            salary_range: None,
            recruiter_id: recruiter.id,
            company_name: recruiter.display_company(),
        })
        .await
        .unwrap()
    }

    fn application_for(job: &Job, seeker: &User) -> NewApplication {
        NewApplication {
            job_id: job.id,
            job_seeker_id: seeker.id,
            resume_url: "http://files/cv.pdf".to_string(),
            cover_letter: None,
        }
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let db = MemoryDbAdapter::new();
        seed_user(&db, "Ann@Example.com", Role::JobSeeker).await;

        let err = db
            .create_user(NewUser::new(
                "Other".to_string(),
                "ann@example.COM".to_string(),
                "hash".to_string(),
                Role::Recruiter,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let creds = db.get_user_by_email("ANN@example.com").await.unwrap();
        assert_eq!(creds.user.email, "ann@example.com");
        assert_eq!(creds.hashed_password, "hash");
    }

    #[tokio::test]
    async fn duplicate_application_conflicts_without_counting() {
        let db = MemoryDbAdapter::new();
        let recruiter = seed_user(&db, "r@example.com", Role::Recruiter).await;
        let seeker = seed_user(&db, "s@example.com", Role::JobSeeker).await;
        let job = seed_job(&db, &recruiter, "Backend Engineer").await;

        db.create_application(application_for(&job, &seeker))
            .await
            .unwrap();
        let err = db
            .create_application(application_for(&job, &seeker))
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Conflict(_)));
        assert_eq!(db.get_job_by_id(job.id).await.unwrap().application_count, 1);
    }

    #[tokio::test]
    async fn concurrent_applications_are_all_counted() {
        let db = Arc::new(MemoryDbAdapter::new());
        let recruiter = seed_user(&db, "r@example.com", Role::Recruiter).await;
        let job = seed_job(&db, &recruiter, "Backend Engineer").await;

        let mut handles = Vec::new();
        for i in 0..25 {
            let db = db.clone();
            let job = job.clone();
            handles.push(tokio::spawn(async move {
                let seeker = seed_user(&db, &format!("seeker{i}@example.com"), Role::JobSeeker).await;
                db.create_application(application_for(&job, &seeker)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(db.get_job_by_id(job.id).await.unwrap().application_count, 25);
        assert_eq!(db.count_applications(None).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn deleting_a_job_removes_its_applications() {
        let db = MemoryDbAdapter::new();
        let recruiter = seed_user(&db, "r@example.com", Role::Recruiter).await;
        let seeker = seed_user(&db, "s@example.com", Role::JobSeeker).await;
        let job = seed_job(&db, &recruiter, "Backend Engineer").await;
        db.create_application(application_for(&job, &seeker))
            .await
            .unwrap();

        assert_eq!(db.delete_job(job.id).await.unwrap(), 1);
        assert!(db
            .list_applications_by_seeker(seeker.id)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            db.delete_job(job.id).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_seeker_keeps_counts_exact() {
        let db = MemoryDbAdapter::new();
        let recruiter = seed_user(&db, "r@example.com", Role::Recruiter).await;
        let stays = seed_user(&db, "stays@example.com", Role::JobSeeker).await;
        let leaves = seed_user(&db, "leaves@example.com", Role::JobSeeker).await;
        let job = seed_job(&db, &recruiter, "Backend Engineer").await;
        db.create_application(application_for(&job, &stays))
            .await
            .unwrap();
        db.create_application(application_for(&job, &leaves))
            .await
            .unwrap();

        db.delete_user(leaves.id).await.unwrap();

        assert_eq!(db.get_job_by_id(job.id).await.unwrap().application_count, 1);
        assert_eq!(db.list_applications_by_job(job.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn active_listing_filters_and_pages() {
        let db = MemoryDbAdapter::new();
        let recruiter = seed_user(&db, "r@example.com", Role::Recruiter).await;
        let first = seed_job(&db, &recruiter, "Rust Developer").await;
        let second = seed_job(&db, &recruiter, "Frontend Developer").await;
        let hidden = seed_job(&db, &recruiter, "Rust Intern").await;
        db.update_job(
            hidden.id,
            &JobPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let all = db
            .list_active_jobs(&JobFilter::default(), Page::new(1, 10))
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.items[0].id, second.id);

        let rust = db
            .list_active_jobs(
                &JobFilter {
                    search: Some("rust".to_string()),
                    location: Some("berlin".to_string()),
                    job_type: Some(JobType::FullTime),
                },
                Page::new(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(rust.total, 1);
        assert_eq!(rust.items[0].id, first.id);

        let second_page = db
            .list_active_jobs(&JobFilter::default(), Page::new(2, 1))
            .await
            .unwrap();
        assert_eq!(second_page.items.len(), 1);
        assert_eq!(second_page.items[0].id, first.id);

        let mine = db.list_jobs_by_recruiter(recruiter.id).await.unwrap();
        assert_eq!(mine.len(), 3);
    }

    #[tokio::test]
    async fn approval_survives_an_interleaved_profile_write() {
        let db = Arc::new(MemoryDbAdapter::new());
        let recruiter = seed_user(&db, "r@example.com", Role::Recruiter).await;
        let phone = ProfilePatch {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };

        let (approved, patched) = tokio::join!(
            db.set_approval(recruiter.id, true),
            db.update_profile(recruiter.id, &phone),
        );
        approved.unwrap();
        patched.unwrap();

        let reloaded = db.get_user_by_id(recruiter.id).await.unwrap();
        assert!(reloaded.is_approved);
        assert_eq!(reloaded.phone.as_deref(), Some("555-0100"));

        let after = db.update_profile(recruiter.id, &phone).await.unwrap();
        assert!(after.is_approved);
    }

    #[tokio::test]
    async fn resume_replacement_returns_the_previous_file() {
        let db = MemoryDbAdapter::new();
        let seeker = seed_user(&db, "s@example.com", Role::JobSeeker).await;
        let first = Resume {
            url: "http://files/one.pdf".to_string(),
            public_id: "one.pdf".to_string(),
        };
        let second = Resume {
            url: "http://files/two.pdf".to_string(),
            public_id: "two.pdf".to_string(),
        };

        let (_, previous) = db.replace_resume(seeker.id, &first).await.unwrap();
        assert!(previous.is_none());
        let (user, previous) = db.replace_resume(seeker.id, &second).await.unwrap();
        assert_eq!(previous, Some(first));
        assert_eq!(user.resume(), Some(&second));

        let bio = ProfilePatch {
            bio: Some("Rustacean".to_string()),
            ..Default::default()
        };
        let user = db.update_profile(seeker.id, &bio).await.unwrap();
        assert_eq!(user.resume(), Some(&second));

        assert!(matches!(
            db.replace_resume(Uuid::new_v4(), &second).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[test]
    fn plural_search_terms_share_a_stem() {
        assert_eq!(stem("engineers"), "engineer");
        assert_eq!(stem("salaries"), "salary");
        assert_eq!(stem("boxes"), "box");
        assert_eq!(stem("classes"), "class");
        assert_eq!(stem("class"), "class");
        assert_eq!(stem("rust"), "rust");
    }

    #[tokio::test]
    async fn search_matches_plural_forms() {
        let db = MemoryDbAdapter::new();
        let recruiter = seed_user(&db, "r@example.com", Role::Recruiter).await;
        let job = seed_job(&db, &recruiter, "Backend Engineer").await;

        let found = db
            .list_active_jobs(
                &JobFilter {
                    search: Some("engineers".to_string()),
                    ..Default::default()
                },
                Page::new(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].id, job.id);
    }
}
