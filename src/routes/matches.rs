use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::distance::HaversineOracle;
use crate::core::filters::{job_matches, seeker_matches, JobSearchFilters, SeekerSearchFilters};
use crate::models::{
    AttributeUniverse, ErrorResponse, HealthResponse, JobSearchResponse, JobSummary,
    RankJobsResponse, RankMatchesRequest, RankSeekersResponse, RefreshScoresRequest,
    RefreshScoresResponse, ScoreRequest, ScoreResponse, SeekerSearchResponse, SeekerSummary,
};
use crate::services::{CacheKey, CacheManager, Geocoder, PostgresClient, ScoreService, StoreError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub geocoder: Arc<Geocoder>,
    pub scores: Arc<ScoreService>,
    pub default_limit: usize,
    pub max_limit: usize,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/jobs/search", web::get().to(search_jobs))
        .route("/seekers/search", web::get().to(search_seekers))
        .route("/matches/jobs", web::get().to(rank_jobs))
        .route("/matches/seekers", web::get().to(rank_seekers))
        .route("/matches/score", web::get().to(get_score))
        .route("/matches/refresh", web::post().to(refresh_scores));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn store_error(context: &str, e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound(message) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Not found".to_string(),
            message,
            status_code: 404,
        }),
        other => {
            tracing::error!("{}: {}", context, other);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: context.to_string(),
                message: other.to_string(),
                status_code: 500,
            })
        }
    }
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn missing_param(name: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: format!("Missing {} parameter", name),
        message: format!("{} query parameter is required", name),
        status_code: 400,
    })
}

/// Skill and attitude universes, through the cache.
///
/// The board invalidates the `universe:*` keys when attributes are added,
/// so codec call sites always see the current option sets.
async fn load_universes(
    state: &AppState,
) -> Result<(AttributeUniverse, AttributeUniverse), StoreError> {
    let skills = match state
        .cache
        .get::<AttributeUniverse>(&CacheKey::universe("skill"))
        .await
    {
        Ok(universe) => universe,
        Err(_) => {
            let universe = state.postgres.get_skill_universe().await?;
            let _ = state.cache.set(&CacheKey::universe("skill"), &universe).await;
            universe
        }
    };

    let attitudes = match state
        .cache
        .get::<AttributeUniverse>(&CacheKey::universe("attitude"))
        .await
    {
        Ok(universe) => universe,
        Err(_) => {
            let universe = state.postgres.get_attitude_universe().await?;
            let _ = state
                .cache
                .set(&CacheKey::universe("attitude"), &universe)
                .await;
            universe
        }
    };

    Ok((skills, attitudes))
}

/// Filtered job search
///
/// GET /api/v1/jobs/search?worktype=&salary=&dist=&tech=&biz=&att=&seeker=
///
/// `tech`/`biz`/`att` carry compressed selection strings; a `seeker` id
/// sorts the results by that seeker's cached match scores (best first,
/// newest post on ties) instead of recency alone.
async fn search_jobs(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let (skills, attitudes) = match load_universes(&state).await {
        Ok(universes) => universes,
        Err(e) => return store_error("Failed to load attribute universes", e),
    };

    let mut filters = JobSearchFilters::from_query(&query, &skills, &attitudes);
    if let Some(dist) = filters.distance.as_mut() {
        state.geocoder.fill_coords(&mut dist.location).await;
    }

    let jobs = match state.scores.load_all_jobs().await {
        Ok(jobs) => jobs,
        Err(e) => return store_error("Failed to load job posts", e),
    };
    let total_candidates = jobs.len();

    let oracle = HaversineOracle;
    let mut matching: Vec<_> = jobs
        .into_iter()
        .filter(|job| job_matches(job, &filters, &oracle, &skills, &attitudes))
        .collect();

    // score-sorted when browsing as a seeker, otherwise newest first
    let seeker_id = query.get("seeker").and_then(|v| v.parse::<i64>().ok());
    let cached_scores = match seeker_id {
        Some(id) => match state.postgres.get_cached_scores_for_seeker(id).await {
            Ok(scores) => scores,
            Err(e) => return store_error("Failed to load cached scores", e),
        },
        None => HashMap::new(),
    };

    if seeker_id.is_some() {
        matching.sort_by(|a, b| {
            let score_a = cached_scores.get(&a.id).copied().unwrap_or(0.0);
            let score_b = cached_scores.get(&b.id).copied().unwrap_or(0.0);
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
    } else {
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    let jobs: Vec<JobSummary> = matching
        .iter()
        .map(|job| JobSummary::from_post(job, cached_scores.get(&job.id).copied()))
        .collect();

    tracing::info!(
        "Job search matched {} of {} posts",
        jobs.len(),
        total_candidates
    );

    HttpResponse::Ok().json(JobSearchResponse {
        jobs,
        total_candidates,
    })
}

/// Filtered seeker search (company view)
///
/// GET /api/v1/seekers/search?worktype=&eduexp=&workexp=&dist=&tech=&biz=&att=&sortby=
///
/// `sortby` is a job post id; when present, results are ordered by that
/// post's cached match scores.
async fn search_seekers(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let (skills, attitudes) = match load_universes(&state).await {
        Ok(universes) => universes,
        Err(e) => return store_error("Failed to load attribute universes", e),
    };

    let mut filters = SeekerSearchFilters::from_query(&query, &skills, &attitudes);
    if let Some(dist) = filters.distance.as_mut() {
        state.geocoder.fill_coords(&mut dist.location).await;
    }

    let seekers = match state.scores.load_all_seekers().await {
        Ok(seekers) => seekers,
        Err(e) => return store_error("Failed to load seekers", e),
    };
    let total_candidates = seekers.len();

    let oracle = HaversineOracle;
    let mut matching: Vec<_> = seekers
        .into_iter()
        .filter(|seeker| seeker_matches(seeker, &filters, &oracle, &skills, &attitudes))
        .collect();

    let jobpost_id = query.get("sortby").and_then(|v| v.parse::<i64>().ok());
    let cached_scores = match jobpost_id {
        Some(id) => match state.postgres.get_cached_scores_for_job(id).await {
            Ok(scores) => scores,
            Err(e) => return store_error("Failed to load cached scores", e),
        },
        None => HashMap::new(),
    };

    if jobpost_id.is_some() {
        matching.sort_by(|a, b| {
            let score_a = cached_scores.get(&a.id).copied().unwrap_or(0.0);
            let score_b = cached_scores.get(&b.id).copied().unwrap_or(0.0);
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
    } else {
        matching.sort_by_key(|s| s.id);
    }

    let seekers: Vec<SeekerSummary> = matching
        .iter()
        .map(|seeker| SeekerSummary {
            id: seeker.id,
            name: seeker.name(),
            city: seeker.location.as_ref().map(|l| l.city.clone()),
            state: seeker.location.as_ref().map(|l| l.state.clone()),
            years_experience: seeker.years_experience,
            score: cached_scores.get(&seeker.id).copied(),
        })
        .collect();

    HttpResponse::Ok().json(SeekerSearchResponse {
        seekers,
        total_candidates,
    })
}

/// Best-matching jobs for a seeker
///
/// GET /api/v1/matches/jobs?seekerId={id}&limit={n}
async fn rank_jobs(
    state: web::Data<AppState>,
    req: web::Query<RankMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }
    let Some(seeker_id) = req.seeker_id else {
        return missing_param("seekerId");
    };
    let limit = effective_limit(&state, &req);

    tracing::info!("Ranking jobs for seeker {}, limit {}", seeker_id, limit);

    match state.scores.rank_jobs_for_seeker(seeker_id, limit).await {
        Ok(result) => HttpResponse::Ok().json(RankJobsResponse {
            seeker_id,
            matches: result.matches,
            total_candidates: result.total_candidates,
        }),
        Err(e) => store_error("Failed to rank jobs", e),
    }
}

/// Best-matching seekers for a job post
///
/// GET /api/v1/matches/seekers?jobId={id}&limit={n}
async fn rank_seekers(
    state: web::Data<AppState>,
    req: web::Query<RankMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }
    let Some(job_id) = req.job_id else {
        return missing_param("jobId");
    };
    let limit = effective_limit(&state, &req);

    tracing::info!("Ranking seekers for job {}, limit {}", job_id, limit);

    match state.scores.rank_seekers_for_job(job_id, limit).await {
        Ok(result) => HttpResponse::Ok().json(RankSeekersResponse {
            job_id,
            matches: result.matches,
            total_candidates: result.total_candidates,
        }),
        Err(e) => store_error("Failed to rank seekers", e),
    }
}

fn effective_limit(state: &AppState, req: &RankMatchesRequest) -> usize {
    req.limit
        .map(usize::from)
        .unwrap_or(state.default_limit)
        .min(state.max_limit)
}

/// Single pair score
///
/// GET /api/v1/matches/score?jobId={id}&seekerId={id}&useCache=true
async fn get_score(state: web::Data<AppState>, req: web::Query<ScoreRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state
        .scores
        .get_score(req.job_id, req.seeker_id, req.use_cache)
        .await
    {
        Ok((score, from_cache)) => HttpResponse::Ok().json(ScoreResponse {
            job_id: req.job_id,
            seeker_id: req.seeker_id,
            score,
            from_cache,
        }),
        Err(e) => store_error("Failed to compute score", e),
    }
}

/// Rebuild cached scores after an attribute mutation
///
/// POST /api/v1/matches/refresh
///
/// Request body:
/// ```json
/// {
///   "jobpostId": 12,
///   "seekerId": 7
/// }
/// ```
///
/// Either id may be omitted to refresh that whole side.
async fn refresh_scores(
    state: web::Data<AppState>,
    req: web::Json<RefreshScoresRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    tracing::info!(
        "Refreshing match scores (job: {:?}, seeker: {:?})",
        req.jobpost_id,
        req.seeker_id
    );

    match state
        .scores
        .refresh_scores(req.jobpost_id, req.seeker_id)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(RefreshScoresResponse {
            refresh_id: uuid::Uuid::new_v4().to_string(),
            refreshed: outcome.refreshed,
            skipped: outcome.skipped,
        }),
        Err(e) => store_error("Failed to refresh scores", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
