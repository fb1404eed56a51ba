// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AttitudeRequirement, AttributeUniverse, JobMatch, JobPost, Location, MatchWeights,
    SeekerMatch, SeekerProfile, SkillLevel, SkillRequirement, WorkTypes,
};
pub use requests::{RankMatchesRequest, RefreshScoresRequest, ScoreRequest};
pub use responses::{
    ErrorResponse, HealthResponse, JobSearchResponse, JobSummary, RankJobsResponse,
    RankSeekersResponse, RefreshScoresResponse, ScoreResponse, SeekerSearchResponse,
    SeekerSummary,
};
