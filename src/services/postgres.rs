use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    AttitudeRequirement, AttributeUniverse, JobPost, Location, SeekerProfile, SkillLevel,
    SkillRequirement, WorkTypes,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// PostgreSQL client
///
/// Two jobs: materialize plain seeker/job snapshots out of the job board's
/// relational schema (read-only), and own the `match_scores` cache table
/// (this service is its only writer; the board reads scores through the
/// HTTP API, never the table).
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup (only touches service-owned tables)
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Materialize one seeker snapshot.
    ///
    /// Walks the profile's skill, attitude, and history associations and
    /// denormalizes them into the plain struct the core consumes. The
    /// location's coordinates are left unresolved; the geocoder fills them.
    pub async fn get_seeker(&self, seeker_id: i64) -> Result<SeekerProfile, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT s.id::BIGINT AS id, s.first_name, s.last_name, s.city, s.state,
                   s.work_wanted::SMALLINT AS work_wanted, s.remote_wanted,
                   s.created_timestamp, u.is_active
            FROM seekerprofile s
            JOIN useraccount u ON u.id = s.seeker_id
            WHERE s.id = $1
        "#,
        )
        .bind(seeker_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("No seeker with id {}", seeker_id)))?;

        let skill_rows = sqlx::query(
            r#"
            SELECT sk.title, sk.type, ss.skill_level::SMALLINT AS skill_level
            FROM seeker_skill ss
            JOIN skill sk ON sk.id = ss.skill_id
            WHERE ss.seeker_id = $1
            ORDER BY sk.id
        "#,
        )
        .bind(seeker_id)
        .fetch_all(&self.pool)
        .await?;

        let mut tech_skills = Vec::new();
        let mut biz_skills = Vec::new();
        for skill in &skill_rows {
            let entry = SkillLevel {
                title: skill.get("title"),
                level: skill.get::<i16, _>("skill_level") as u8,
            };
            if skill.get::<String, _>("type") == "biz" {
                biz_skills.push(entry);
            } else {
                tech_skills.push(entry);
            }
        }

        let attitudes: Vec<String> = sqlx::query(
            r#"
            SELECT a.title
            FROM seeker_attitude sa
            JOIN attitude a ON a.id = sa.attitude_id
            WHERE sa.seeker_id = $1
            ORDER BY a.id
        "#,
        )
        .bind(seeker_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| r.get("title"))
        .collect();

        // years of experience is the sum over job-history entries
        let years: i64 = sqlx::query(
            r#"
            SELECT COALESCE(SUM(years), 0)::BIGINT AS years
            FROM seeker_history_job
            WHERE seeker_id = $1
        "#,
        )
        .bind(seeker_id)
        .fetch_one(&self.pool)
        .await?
        .get("years");

        // education level is one above the best completed entry, 0 with none
        let edu_level: i64 = sqlx::query(
            r#"
            SELECT COALESCE(MAX(education_lvl) + 1, 0)::BIGINT AS edu_level
            FROM seeker_history_education
            WHERE seeker_id = $1
        "#,
        )
        .bind(seeker_id)
        .fetch_one(&self.pool)
        .await?
        .get("edu_level");

        Ok(SeekerProfile {
            id: row.get("id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            location: location_from(row.get("city"), row.get("state")),
            tech_skills,
            biz_skills,
            attitudes,
            years_experience: years.min(u8::MAX as i64) as u8,
            min_edu_level: edu_level.min(u8::MAX as i64) as u8,
            work_wanted: work_types_from(row.get::<i16, _>("work_wanted")),
            remote_wanted: row.get("remote_wanted"),
            is_active: row.get("is_active"),
            created_at: row.get("created_timestamp"),
        })
    }

    /// Materialize one job-post snapshot.
    pub async fn get_job(&self, jobpost_id: i64) -> Result<JobPost, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT j.id::BIGINT AS id, j.company_id::BIGINT AS company_id,
                   j.job_title, j.city, j.state, j.is_remote,
                   j.salary_min::BIGINT AS salary_min,
                   j.salary_max::BIGINT AS salary_max,
                   j.work_type::SMALLINT AS work_type, j.created_timestamp,
                   (j.active AND u.is_active) AS active
            FROM jobpost j
            JOIN companyprofile c ON c.company_id = j.company_id
            JOIN useraccount u ON u.id = c.company_id
            WHERE j.id = $1
        "#,
        )
        .bind(jobpost_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("No job post with id {}", jobpost_id)))?;

        let skills: Vec<SkillRequirement> = sqlx::query(
            r#"
            SELECT sk.title,
                   js.skill_level_min::SMALLINT AS skill_level_min,
                   js.importance_level::SMALLINT AS importance_level
            FROM jobpost_skill js
            JOIN skill sk ON sk.id = js.skill_id
            WHERE js.jobpost_id = $1
            ORDER BY sk.id
        "#,
        )
        .bind(jobpost_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| SkillRequirement {
            title: r.get("title"),
            min_level: r.get::<i16, _>("skill_level_min") as u8,
            importance: r.get::<i16, _>("importance_level") as u8,
        })
        .collect();

        let attitudes: Vec<AttitudeRequirement> = sqlx::query(
            r#"
            SELECT a.title, ja.importance_level::SMALLINT AS importance_level
            FROM jobpost_attitude ja
            JOIN attitude a ON a.id = ja.attitude_id
            WHERE ja.jobpost_id = $1
            ORDER BY a.id
        "#,
        )
        .bind(jobpost_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| AttitudeRequirement {
            title: r.get("title"),
            importance: r.get::<i16, _>("importance_level") as u8,
        })
        .collect();

        Ok(JobPost {
            id: row.get("id"),
            company_id: row.get("company_id"),
            title: row.get("job_title"),
            location: location_from(row.get("city"), row.get("state")),
            is_remote: row.get("is_remote"),
            salary_min: row.get("salary_min"),
            salary_max: row.get("salary_max"),
            active: row.get("active"),
            work_type: work_types_from(row.get::<i16, _>("work_type")),
            skills,
            attitudes,
            created_at: row.get("created_timestamp"),
        })
    }

    /// IDs of all seekers with active accounts.
    pub async fn list_seeker_ids(&self) -> Result<Vec<i64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id::BIGINT AS id
            FROM seekerprofile s
            JOIN useraccount u ON u.id = s.seeker_id
            WHERE u.is_active
            ORDER BY s.id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    /// IDs of all active job posts from active companies.
    pub async fn list_job_ids(&self) -> Result<Vec<i64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT j.id::BIGINT AS id
            FROM jobpost j
            JOIN companyprofile c ON c.company_id = j.company_id
            JOIN useraccount u ON u.id = c.company_id
            WHERE j.active AND u.is_active
            ORDER BY j.id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    /// Ordered titles of every skill (tech and biz share one ID space).
    pub async fn get_skill_universe(&self) -> Result<AttributeUniverse, StoreError> {
        let rows = sqlx::query("SELECT title FROM skill ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(AttributeUniverse::new(
            rows.iter().map(|r| r.get("title")).collect(),
        ))
    }

    /// Ordered titles of every attitude.
    pub async fn get_attitude_universe(&self) -> Result<AttributeUniverse, StoreError> {
        let rows = sqlx::query("SELECT title FROM attitude ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(AttributeUniverse::new(
            rows.iter().map(|r| r.get("title")).collect(),
        ))
    }

    /// Look up a cached match score.
    pub async fn get_cached_score(
        &self,
        jobpost_id: i64,
        seeker_id: i64,
    ) -> Result<Option<f64>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT score
            FROM match_scores
            WHERE jobpost_id = $1 AND seeker_id = $2
        "#,
        )
        .bind(jobpost_id)
        .bind(seeker_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("score")))
    }

    /// Cached scores for many jobs against one seeker, for score-sorted
    /// search results.
    pub async fn get_cached_scores_for_seeker(
        &self,
        seeker_id: i64,
    ) -> Result<std::collections::HashMap<i64, f64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT jobpost_id, score
            FROM match_scores
            WHERE seeker_id = $1
        "#,
        )
        .bind(seeker_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("jobpost_id"), r.get("score")))
            .collect())
    }

    /// Cached scores for many seekers against one job.
    pub async fn get_cached_scores_for_job(
        &self,
        jobpost_id: i64,
    ) -> Result<std::collections::HashMap<i64, f64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT seeker_id, score
            FROM match_scores
            WHERE jobpost_id = $1
        "#,
        )
        .bind(jobpost_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("seeker_id"), r.get("score")))
            .collect())
    }

    /// Insert a lazily computed score, keeping an existing entry.
    ///
    /// Concurrent requests can race to fill the same pair on a miss; the
    /// computed value is deterministic, so whichever insert loses the race
    /// is simply discarded.
    pub async fn insert_score_if_absent(
        &self,
        jobpost_id: i64,
        seeker_id: i64,
        score: f64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO match_scores (jobpost_id, seeker_id, score, computed_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (jobpost_id, seeker_id) DO NOTHING
        "#,
        )
        .bind(jobpost_id)
        .bind(seeker_id)
        .bind(score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrite a score during a refresh.
    pub async fn upsert_score(
        &self,
        jobpost_id: i64,
        seeker_id: i64,
        score: f64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO match_scores (jobpost_id, seeker_id, score, computed_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (jobpost_id, seeker_id)
            DO UPDATE SET
                score = EXCLUDED.score,
                computed_at = EXCLUDED.computed_at
        "#,
        )
        .bind(jobpost_id)
        .bind(seeker_id)
        .bind(score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn location_from(city: Option<String>, state: Option<String>) -> Option<Location> {
    match (city, state) {
        (Some(city), Some(state)) if !city.is_empty() && !state.is_empty() => {
            Some(Location::new(city, state))
        }
        _ => None,
    }
}

/// Work-wanted flags are stored as a 3-bit integer, full-time high.
fn work_types_from(bits: i16) -> WorkTypes {
    WorkTypes {
        full_time: bits & 0b100 != 0,
        part_time: bits & 0b010 != 0,
        contract: bits & 0b001 != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_types_from_bits() {
        let wt = work_types_from(0b101);
        assert!(wt.full_time && !wt.part_time && wt.contract);
        assert_eq!(wt.mask(), 0b101);
        assert!(!work_types_from(0).any());
    }

    #[test]
    fn test_location_requires_both_parts() {
        assert!(location_from(Some("Columbus".into()), Some("OH".into())).is_some());
        assert!(location_from(Some("Columbus".into()), None).is_none());
        assert!(location_from(Some("".into()), Some("OH".into())).is_none());
        assert!(location_from(None, None).is_none());
    }
}
