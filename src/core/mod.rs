// Core algorithm exports
pub mod codec;
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use codec::{decode_ids, decode_mask, encode, CodecError};
pub use distance::{haversine_miles, within_miles, DistanceOracle, HaversineOracle};
pub use filters::{job_matches, seeker_matches, JobSearchFilters, SeekerSearchFilters};
pub use matcher::{MatchResult, Matcher};
pub use scoring::calculate_match_score;
