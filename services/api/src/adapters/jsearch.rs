//! services/api/src/adapters/jsearch.rs
//!
//! This module contains the adapter for the JSearch job provider on RapidAPI.
//! It implements the `ExternalJobService` port from the `core` crate.
//!
//! Provider listings are normalized into the internal job shape. Any failure
//! (missing key, timeout, bad status, malformed body) is logged and reported
//! as "no results", never as an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use job_board_core::domain::{
    external_job_id, provider_job_id, ExternalJob, ExternalJobData, JobType, SalaryRange,
};
use job_board_core::ports::ExternalJobService;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";
const DEFAULT_QUERY: &str = "software developer";
const SOURCE: &str = "JSEARCH";

/// A client for the JSearch API.
#[derive(Clone)]
pub struct JSearchAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl JSearchAdapter {
    /// Builds the client. `timeout` bounds every provider call.
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Value>, String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err("JSearch API key not configured".to_string());
        };

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let envelope: SearchEnvelope = response.json().await.map_err(|e| e.to_string())?;
        Ok(envelope.data)
    }
}

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Deserialize)]
struct RequiredExperience {
    required_experience_in_months: Option<f64>,
}

/// One provider listing as the API returns it.
#[derive(Deserialize)]
struct RawListing {
    job_id: String,
    job_title: Option<String>,
    job_description: Option<String>,
    job_required_skills: Option<Vec<String>>,
    job_city: Option<String>,
    job_state: Option<String>,
    job_country: Option<String>,
    job_required_experience: Option<RequiredExperience>,
    job_employment_type: Option<String>,
    job_min_salary: Option<f64>,
    job_max_salary: Option<f64>,
    job_salary_currency: Option<String>,
    employer_name: Option<String>,
    employer_logo: Option<String>,
    job_posted_at_datetime_utc: Option<String>,
    job_apply_link: Option<String>,
    job_google_link: Option<String>,
    job_publisher: Option<String>,
    job_highlights: Option<Value>,
    job_benefits: Option<Value>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Maps the provider's employment type onto ours. Unknown types count as full time.
fn map_employment_type(raw: Option<&str>) -> JobType {
    match raw.map(str::to_uppercase).as_deref() {
        Some("PARTTIME") => JobType::PartTime,
        Some("CONTRACTOR") => JobType::Contract,
        Some("INTERN") => JobType::Internship,
        _ => JobType::FullTime,
    }
}

/// The provider query: the free text (or a default) plus ` in <location>`.
fn build_search_query(query: &str, location: &str) -> String {
    let query = query.trim();
    let mut search = if query.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        query.to_string()
    };
    let location = location.trim();
    if !location.is_empty() {
        search.push_str(" in ");
        search.push_str(location);
    }
    search
}

fn normalize(raw: RawListing) -> ExternalJob {
    let location = match (
        non_empty(raw.job_city),
        non_empty(raw.job_state),
        non_empty(raw.job_country.clone()),
    ) {
        (Some(city), Some(state), Some(country)) => format!("{city}, {state}, {country}"),
        (Some(city), Some(state), None) => format!("{city}, {state}"),
        (_, _, Some(country)) => country,
        _ => "Remote".to_string(),
    };

    let experience_required = raw
        .job_required_experience
        .and_then(|e| e.required_experience_in_months)
        .filter(|months| *months > 0.0)
        .map(|months| format!("{} years", (months / 12.0).floor() as i64))
        .unwrap_or_else(|| "Not specified".to_string());

    let salary_range = match (raw.job_min_salary, raw.job_max_salary) {
        (Some(min), Some(max)) if min != 0.0 && max != 0.0 => Some(SalaryRange {
            min: min.round() as i64,
            max: max.round() as i64,
            currency: non_empty(raw.job_salary_currency).unwrap_or_else(|| "USD".to_string()),
        }),
        _ => None,
    };

    let posted_at = raw
        .job_posted_at_datetime_utc
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    ExternalJob {
        id: external_job_id(&raw.job_id),
        title: non_empty(raw.job_title).unwrap_or_else(|| "N/A".to_string()),
        description: non_empty(raw.job_description)
            .unwrap_or_else(|| "No description available".to_string()),
        skills_required: raw.job_required_skills.unwrap_or_default(),
        location,
        experience_required,
        job_type: map_employment_type(raw.job_employment_type.as_deref()),
        salary_range,
        company_name: non_empty(raw.employer_name)
            .unwrap_or_else(|| "Company Name Not Available".to_string()),
        application_count: 0,
        is_active: true,
        posted_at,
        is_external: true,
        source: SOURCE.to_string(),
        external_url: non_empty(raw.job_apply_link)
            .or_else(|| non_empty(raw.job_google_link))
            .unwrap_or_else(|| "#".to_string()),
        external_data: ExternalJobData {
            publisher: raw.job_publisher,
            employer_logo: raw.employer_logo,
            job_id: raw.job_id,
            highlights: raw.job_highlights,
            benefits: raw.job_benefits,
        },
    }
}

/// Normalizes one listing, skipping entries that do not parse.
fn normalize_value(value: Value) -> Option<ExternalJob> {
    match serde_json::from_value::<RawListing>(value) {
        Ok(raw) => Some(normalize(raw)),
        Err(e) => {
            debug!("Skipping malformed JSearch listing: {}", e);
            None
        }
    }
}

#[async_trait]
impl ExternalJobService for JSearchAdapter {
    async fn search(&self, query: &str, location: &str, limit: usize) -> Vec<ExternalJob> {
        if limit == 0 {
            return Vec::new();
        }
        let search = build_search_query(query, location);
        let params = [
            ("query", search.as_str()),
            ("page", "1"),
            ("num_pages", "1"),
            ("date_posted", "all"),
        ];
        match self.fetch("/search", &params).await {
            Ok(listings) => listings
                .into_iter()
                .filter_map(normalize_value)
                .take(limit)
                .collect(),
            Err(e) => {
                warn!("Error fetching external jobs: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_by_id(&self, external_id: &str) -> Option<ExternalJob> {
        let job_id = provider_job_id(external_id).unwrap_or(external_id);
        match self.fetch("/job-details", &[("job_id", job_id)]).await {
            Ok(listings) => listings.into_iter().next().and_then(normalize_value),
            Err(e) => {
                warn!("Error fetching external job details: {}", e);
                None
            }
        }
    }
}
