//! Spawns the full router on an ephemeral port, backed by the in-memory store.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::HeaderValue;
use chrono::Utc;
use job_board_api::{
    adapters::{LocalFileStorage, MemoryDbAdapter},
    config::Config,
    seed::ensure_admin,
    web::{app_router, AppState},
};
use job_board_core::domain::{external_job_id, ExternalJob, ExternalJobData, JobType};
use job_board_core::ports::ExternalJobService;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@jobboard.test";
pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const PASSWORD: &str = "hunter22";

/// A provider that answers every search with the same listings.
pub struct StubJobs {
    listings: Vec<ExternalJob>,
}

impl StubJobs {
    pub fn empty() -> Self {
        Self {
            listings: Vec::new(),
        }
    }

    pub fn with_listings(provider_ids: &[&str]) -> Self {
        Self {
            listings: provider_ids.iter().map(|id| listing(id)).collect(),
        }
    }
}

fn listing(provider_id: &str) -> ExternalJob {
    ExternalJob {
        id: external_job_id(provider_id),
        title: format!("Remote Rust Engineer {provider_id}"),
        description: "Build services".to_string(),
        skills_required: Vec::new(),
        location: "Remote".to_string(),
        experience_required: "Not specified".to_string(),
        job_type: JobType::FullTime,
        salary_range: None,
        company_name: "Elsewhere Inc".to_string(),
        application_count: 0,
        is_active: true,
        posted_at: Utc::now(),
        is_external: true,
        source: "JSearch".to_string(),
        external_url: format!("https://jobs.example.com/{provider_id}"),
        external_data: ExternalJobData {
            publisher: Some("LinkedIn".to_string()),
            employer_logo: None,
            job_id: provider_id.to_string(),
            highlights: None,
            benefits: None,
        },
    }
}

#[async_trait]
impl ExternalJobService for StubJobs {
    async fn search(&self, _query: &str, _location: &str, limit: usize) -> Vec<ExternalJob> {
        self.listings.iter().take(limit).cloned().collect()
    }

    async fn fetch_by_id(&self, external_id: &str) -> Option<ExternalJob> {
        self.listings.iter().find(|l| l.id == external_id).cloned()
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub uploads_dir: PathBuf,
}

pub struct Response {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(StubJobs::empty()).await
    }

    pub async fn spawn_with(jobs: StubJobs) -> Self {
        Self::start(jobs, None).await
    }

    /// Also serves `client_dist_dir` as the single-page client.
    pub async fn spawn_with_client(client_dist_dir: PathBuf) -> Self {
        Self::start(StubJobs::empty(), Some(client_dist_dir)).await
    }

    async fn start(jobs: StubJobs, client_dist_dir: Option<PathBuf>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");
        let uploads_dir = std::env::temp_dir().join(format!("job-board-test-{}", Uuid::new_v4()));

        let config = Arc::new(Config {
            bind_address: addr,
            database_url: "memory://".to_string(),
            log_level: tracing::Level::WARN,
            jwt_secret: "integration-test-secret".to_string(),
            jwt_expires_in_days: 7,
            jsearch_api_key: None,
            jsearch_base_url: "http://127.0.0.1:9".to_string(),
            jsearch_timeout: Duration::from_secs(1),
            uploads_dir: uploads_dir.clone(),
            public_base_url: base_url.clone(),
            client_origin: HeaderValue::from_static("http://localhost:3000"),
            client_dist_dir,
            admin_email: Some(ADMIN_EMAIL.to_string()),
            admin_password: Some(ADMIN_PASSWORD.to_string()),
        });

        let db = Arc::new(MemoryDbAdapter::new());
        ensure_admin(db.as_ref(), ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();
        let storage = Arc::new(LocalFileStorage::new(uploads_dir.clone(), &base_url));
        let state = Arc::new(AppState::new(config, db, Arc::new(jobs), storage));

        tokio::spawn(async move {
            axum::serve(listener, app_router(state)).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            uploads_dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        read(req.send().await.unwrap()).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response {
        self.request(Method::DELETE, path, token, None).await
    }

    /// Registers an account and returns `(token, user id)`.
    pub async fn register(&self, body: Value) -> (String, String) {
        let res = self.post("/api/auth/register", None, body).await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        (
            res.body["token"].as_str().unwrap().to_string(),
            res.body["user"]["_id"].as_str().unwrap().to_string(),
        )
    }

    pub async fn register_seeker(&self, name: &str) -> (String, String) {
        self.register(serde_json::json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": PASSWORD,
        }))
        .await
    }

    pub async fn register_recruiter(&self, name: &str, company: &str) -> (String, String) {
        self.register(serde_json::json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": PASSWORD,
            "role": "RECRUITER",
            "company": { "name": company },
        }))
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post(
            "/api/auth/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn admin_token(&self) -> String {
        let res = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        res.body["token"].as_str().unwrap().to_string()
    }

    /// Registers a recruiter and has the admin approve them.
    pub async fn approved_recruiter(&self, name: &str, company: &str) -> (String, String) {
        let (token, id) = self.register_recruiter(name, company).await;
        let admin = self.admin_token().await;
        let res = self
            .put(
                &format!("/api/admin/approve-recruiter/{id}"),
                Some(&admin),
                serde_json::json!({ "isApproved": true }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        (token, id)
    }

    /// Posts a job and returns its id.
    pub async fn post_job(&self, token: &str, title: &str) -> String {
        let res = self
            .post(
                "/api/jobs",
                Some(token),
                serde_json::json!({
                    "title": title,
                    "description": "Own the backend",
                    "skillsRequired": ["Rust", "SQL"],
                    "location": "Berlin",
                    "experienceRequired": "3+ years",
                    "jobType": "Full-time",
                    "salaryRange": { "min": 60000, "max": 90000 },
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.body["job"]["_id"].as_str().unwrap().to_string()
    }

    pub async fn upload_resume(&self, token: &str, file_name: &str, mime: &str) -> Response {
        let part = reqwest::multipart::Part::bytes(b"%PDF-1.4 test resume".to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime)
            .unwrap();
        let form = reqwest::multipart::Form::new().part("resume", part);
        let res = self
            .client
            .post(format!("{}/api/users/upload-resume", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        read(res).await
    }
}

async fn read(res: reqwest::Response) -> Response {
    let status = res.status();
    let text = res.text().await.unwrap();
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Response { status, body }
}
