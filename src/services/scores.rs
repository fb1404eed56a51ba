use std::sync::Arc;

use crate::core::distance::HaversineOracle;
use crate::core::matcher::{MatchResult, Matcher};
use crate::models::{JobMatch, JobPost, SeekerMatch, SeekerProfile};
use crate::services::geocoder::Geocoder;
use crate::services::postgres::{PostgresClient, StoreError};

/// Result counts from a bulk score refresh
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOutcome {
    pub refreshed: usize,
    pub skipped: usize,
}

/// Match-score orchestration
///
/// The single owner of the `match_scores` table: computes scores over
/// materialized snapshots, fills the cache lazily on lookups, and rebuilds
/// it eagerly when the board reports an attribute mutation.
pub struct ScoreService {
    store: Arc<PostgresClient>,
    geocoder: Arc<Geocoder>,
    matcher: Matcher,
    oracle: HaversineOracle,
}

impl ScoreService {
    pub fn new(store: Arc<PostgresClient>, geocoder: Arc<Geocoder>, matcher: Matcher) -> Self {
        Self {
            store,
            geocoder,
            matcher,
            oracle: HaversineOracle,
        }
    }

    /// Materialize a seeker snapshot with coordinates resolved.
    pub async fn load_seeker(&self, seeker_id: i64) -> Result<SeekerProfile, StoreError> {
        let mut seeker = self.store.get_seeker(seeker_id).await?;
        if let Some(location) = seeker.location.as_mut() {
            self.geocoder.fill_coords(location).await;
        }
        Ok(seeker)
    }

    /// Materialize a job snapshot with coordinates resolved.
    pub async fn load_job(&self, jobpost_id: i64) -> Result<JobPost, StoreError> {
        let mut job = self.store.get_job(jobpost_id).await?;
        if let Some(location) = job.location.as_mut() {
            self.geocoder.fill_coords(location).await;
        }
        Ok(job)
    }

    /// Every active job post, materialized.
    pub async fn load_all_jobs(&self) -> Result<Vec<JobPost>, StoreError> {
        let mut jobs = Vec::new();
        for id in self.store.list_job_ids().await? {
            match self.load_job(id).await {
                Ok(job) => jobs.push(job),
                // deleted between listing and loading; not this batch's problem
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(jobs)
    }

    /// Every active seeker, materialized.
    pub async fn load_all_seekers(&self) -> Result<Vec<SeekerProfile>, StoreError> {
        let mut seekers = Vec::new();
        for id in self.store.list_seeker_ids().await? {
            match self.load_seeker(id).await {
                Ok(seeker) => seekers.push(seeker),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(seekers)
    }

    /// Score one (job, seeker) pair, returning `(score, from_cache)`.
    ///
    /// A cache miss computes and stores the score with insert-if-absent
    /// semantics: two requests racing on the same pair compute the same
    /// deterministic value, so the losing insert is just discarded.
    /// Fails with NotFound if either id does not resolve; missing
    /// attributes on a record that does resolve score as non-matches.
    pub async fn get_score(
        &self,
        jobpost_id: i64,
        seeker_id: i64,
        use_cache: bool,
    ) -> Result<(f64, bool), StoreError> {
        if use_cache {
            if let Some(score) = self.store.get_cached_score(jobpost_id, seeker_id).await? {
                tracing::debug!(
                    "Score cache hit for job {} / seeker {}",
                    jobpost_id,
                    seeker_id
                );
                return Ok((score, true));
            }
        }

        let seeker = self.load_seeker(seeker_id).await?;
        let job = self.load_job(jobpost_id).await?;
        let score = self.matcher.score(&seeker, &job, &self.oracle);

        if use_cache {
            self.store
                .insert_score_if_absent(jobpost_id, seeker_id, score)
                .await?;
        } else {
            // a forced recompute should leave the fresh value behind
            self.store.upsert_score(jobpost_id, seeker_id, score).await?;
        }

        Ok((score, false))
    }

    /// Recompute and overwrite cached scores for the cross product of the
    /// given job(s) and seeker(s); `None` on either side means all of them.
    ///
    /// Invoked by the board after any change to a seeker's skills/attitudes
    /// or a job's requirements. A pair whose record disappears mid-batch is
    /// skipped and the batch continues; an explicitly named id that does
    /// not resolve is a NotFound error instead.
    pub async fn refresh_scores(
        &self,
        jobpost_id: Option<i64>,
        seeker_id: Option<i64>,
    ) -> Result<RefreshOutcome, StoreError> {
        let jobs = match jobpost_id {
            Some(id) => vec![self.load_job(id).await?],
            None => self.load_all_jobs().await?,
        };
        let seekers = match seeker_id {
            Some(id) => vec![self.load_seeker(id).await?],
            None => self.load_all_seekers().await?,
        };

        let mut outcome = RefreshOutcome::default();
        for job in &jobs {
            for seeker in &seekers {
                let score = self.matcher.score(seeker, job, &self.oracle);
                match self.store.upsert_score(job.id, seeker.id, score).await {
                    Ok(()) => outcome.refreshed += 1,
                    Err(e) => {
                        tracing::warn!(
                            "Skipping refresh of job {} / seeker {}: {}",
                            job.id,
                            seeker.id,
                            e
                        );
                        outcome.skipped += 1;
                    }
                }
            }
        }

        tracing::info!(
            "Refreshed {} match scores ({} skipped)",
            outcome.refreshed,
            outcome.skipped
        );
        Ok(outcome)
    }

    /// Best-matching jobs for a seeker, scores computed fresh.
    pub async fn rank_jobs_for_seeker(
        &self,
        seeker_id: i64,
        limit: usize,
    ) -> Result<MatchResult<JobMatch>, StoreError> {
        let seeker = self.load_seeker(seeker_id).await?;
        let jobs = self.load_all_jobs().await?;
        Ok(self
            .matcher
            .rank_jobs_for_seeker(&seeker, &jobs, &self.oracle, limit))
    }

    /// Best-matching seekers for a job, scores computed fresh.
    pub async fn rank_seekers_for_job(
        &self,
        jobpost_id: i64,
        limit: usize,
    ) -> Result<MatchResult<SeekerMatch>, StoreError> {
        let job = self.load_job(jobpost_id).await?;
        let seekers = self.load_all_seekers().await?;
        Ok(self
            .matcher
            .rank_seekers_for_job(&job, &seekers, &self.oracle, limit))
    }
}
