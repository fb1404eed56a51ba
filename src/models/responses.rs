use serde::{Deserialize, Serialize};

use crate::models::domain::{JobMatch, JobPost, SeekerMatch};

/// Response for the best-jobs ranking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankJobsResponse {
    #[serde(rename = "seekerId")]
    pub seeker_id: i64,
    pub matches: Vec<JobMatch>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Response for the best-seekers ranking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankSeekersResponse {
    #[serde(rename = "jobId")]
    pub job_id: i64,
    pub matches: Vec<SeekerMatch>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// One job in a filtered search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: i64,
    pub title: String,
    #[serde(rename = "companyId")]
    pub company_id: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "isRemote")]
    pub is_remote: bool,
    pub score: Option<f64>,
}

impl JobSummary {
    pub fn from_post(post: &JobPost, score: Option<f64>) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            company_id: post.company_id,
            city: post.location.as_ref().map(|l| l.city.clone()),
            state: post.location.as_ref().map(|l| l.state.clone()),
            is_remote: post.is_remote,
            score,
        }
    }
}

/// Response for the job search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSearchResponse {
    pub jobs: Vec<JobSummary>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// One seeker in a filtered search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekerSummary {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "yearsExperience")]
    pub years_experience: u8,
    pub score: Option<f64>,
}

/// Response for the seeker search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekerSearchResponse {
    pub seekers: Vec<SeekerSummary>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Response for a single pair score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    #[serde(rename = "jobId")]
    pub job_id: i64,
    #[serde(rename = "seekerId")]
    pub seeker_id: i64,
    pub score: f64,
    #[serde(rename = "fromCache")]
    pub from_cache: bool,
}

/// Response for a cache refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshScoresResponse {
    #[serde(rename = "refreshId")]
    pub refresh_id: String,
    pub refreshed: usize,
    pub skipped: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
