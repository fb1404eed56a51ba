use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query for the ranked-match endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankMatchesRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "seeker_id", rename = "seekerId", default)]
    pub seeker_id: Option<i64>,
    #[validate(range(min = 1))]
    #[serde(alias = "job_id", rename = "jobId", default)]
    pub job_id: Option<i64>,
    /// Defaults to the configured limit when absent.
    #[validate(range(min = 1, max = 500))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Query for a single pair score
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "job_id", rename = "jobId")]
    pub job_id: i64,
    #[validate(range(min = 1))]
    #[serde(alias = "seeker_id", rename = "seekerId")]
    pub seeker_id: i64,
    #[serde(alias = "use_cache", rename = "useCache", default = "default_true")]
    pub use_cache: bool,
}

fn default_true() -> bool {
    true
}

/// Request to recompute cached scores after an attribute mutation.
///
/// Omitting both ids refreshes the entire cross product; omitting one side
/// refreshes that side's full row/column.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshScoresRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "jobpost_id", rename = "jobpostId", default)]
    pub jobpost_id: Option<i64>,
    #[validate(range(min = 1))]
    #[serde(alias = "seeker_id", rename = "seekerId", default)]
    pub seeker_id: Option<i64>,
}
