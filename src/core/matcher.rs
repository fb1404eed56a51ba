use crate::core::distance::DistanceOracle;
use crate::core::scoring::calculate_match_score;
use crate::models::{JobMatch, JobPost, MatchWeights, SeekerMatch, SeekerProfile};

/// Result of a ranking pass
#[derive(Debug)]
pub struct MatchResult<T> {
    pub matches: Vec<T>,
    pub total_candidates: usize,
}

/// Ranks seekers against job posts (and the reverse) by match score.
///
/// Both directions use the same scoring function; only which side is held
/// fixed changes. The "best matches" views drop non-positive scores, sort
/// by score descending, and break ties by post/profile recency and then id
/// ascending so the order is total and reproducible.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: MatchWeights,
}

impl Matcher {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: MatchWeights::default(),
        }
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    /// Score a single (seeker, job) pair.
    pub fn score(
        &self,
        seeker: &SeekerProfile,
        job: &JobPost,
        oracle: &dyn DistanceOracle,
    ) -> f64 {
        calculate_match_score(seeker, job, &self.weights, oracle)
    }

    /// Rank the candidate jobs for one seeker, best first.
    ///
    /// # Arguments
    /// * `seeker` - The seeker snapshot being matched
    /// * `jobs` - Candidate job snapshots (already filtered by the caller)
    /// * `oracle` - Distance lookup for the location contribution
    /// * `limit` - Maximum number of matches to return
    pub fn rank_jobs_for_seeker(
        &self,
        seeker: &SeekerProfile,
        jobs: &[JobPost],
        oracle: &dyn DistanceOracle,
        limit: usize,
    ) -> MatchResult<JobMatch> {
        let total_candidates = jobs.len();

        let mut scored: Vec<(f64, chrono::DateTime<chrono::Utc>, JobMatch)> = jobs
            .iter()
            .filter_map(|job| {
                let score = self.score(seeker, job, oracle);
                if score > 0.0 {
                    Some((
                        score,
                        job.created_at,
                        JobMatch {
                            job_id: job.id,
                            job_title: job.title.clone(),
                            company_id: job.company_id,
                            score,
                        },
                    ))
                } else {
                    None
                }
            })
            .collect();

        sort_ranked(&mut scored, |m| m.job_id);
        let mut matches: Vec<JobMatch> = scored.into_iter().map(|(_, _, m)| m).collect();
        matches.truncate(limit);

        MatchResult {
            matches,
            total_candidates,
        }
    }

    /// Rank the candidate seekers for one job post, best first.
    pub fn rank_seekers_for_job(
        &self,
        job: &JobPost,
        seekers: &[SeekerProfile],
        oracle: &dyn DistanceOracle,
        limit: usize,
    ) -> MatchResult<SeekerMatch> {
        let total_candidates = seekers.len();

        let mut scored: Vec<(f64, chrono::DateTime<chrono::Utc>, SeekerMatch)> = seekers
            .iter()
            .filter_map(|seeker| {
                let score = self.score(seeker, job, oracle);
                if score > 0.0 {
                    Some((
                        score,
                        seeker.created_at,
                        SeekerMatch {
                            seeker_id: seeker.id,
                            name: seeker.name(),
                            score,
                        },
                    ))
                } else {
                    None
                }
            })
            .collect();

        sort_ranked(&mut scored, |m| m.seeker_id);
        let mut matches: Vec<SeekerMatch> = scored.into_iter().map(|(_, _, m)| m).collect();
        matches.truncate(limit);

        MatchResult {
            matches,
            total_candidates,
        }
    }
}

/// Score descending, then recency descending, then id ascending.
fn sort_ranked<T>(
    scored: &mut [(f64, chrono::DateTime<chrono::Utc>, T)],
    id_of: impl Fn(&T) -> i64,
) {
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
            .then_with(|| id_of(&a.2).cmp(&id_of(&b.2)))
    });
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
