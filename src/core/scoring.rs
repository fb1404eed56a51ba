use std::collections::{HashMap, HashSet};

use crate::core::distance::DistanceOracle;
use crate::models::{JobPost, MatchWeights, SeekerProfile};

/// Distance tiers for the location contribution, in miles.
const NEAR_MILES: f64 = 50.0;
const FAR_MILES: f64 = 100.0;

/// Per-level bonus multipliers for exceeding a skill requirement.
const HIGH_IMPORTANCE_BONUS: f64 = 1.5;
const LOW_IMPORTANCE_BONUS: f64 = 1.0;

/// Calculate the match score for a seeker against a job post.
///
/// The score is a pure sum of three independent contributions (location,
/// skills, attitudes), so it is order-independent and reproducible from the
/// same two snapshots. None of the contributions can go negative.
///
/// Missing attributes are scored as non-matches, never as errors: a seeker
/// without a required skill contributes nothing for that skill, and a
/// missing location skips the location contribution entirely.
pub fn calculate_match_score(
    seeker: &SeekerProfile,
    job: &JobPost,
    weights: &MatchWeights,
    oracle: &dyn DistanceOracle,
) -> f64 {
    location_contribution(seeker, job, weights, oracle)
        + skill_contribution(seeker, job, weights)
        + attitude_contribution(seeker, job, weights)
}

/// Location points: full tier within 50 miles, reduced tier within 100.
///
/// Remote jobs skip this entirely. So does a pair where either side has no
/// location on file (unknown, not a mismatch) or where the distance cannot
/// be determined.
fn location_contribution(
    seeker: &SeekerProfile,
    job: &JobPost,
    weights: &MatchWeights,
    oracle: &dyn DistanceOracle,
) -> f64 {
    if job.is_remote {
        return 0.0;
    }
    let (Some(seeker_loc), Some(job_loc)) = (&seeker.location, &job.location) else {
        return 0.0;
    };
    match oracle.distance_miles(seeker_loc, job_loc) {
        Some(d) if d <= NEAR_MILES => weights.within_50_miles,
        Some(d) if d <= FAR_MILES => weights.within_100_miles,
        _ => 0.0,
    }
}

/// Skill points: base points plus a per-level bonus for meeting a
/// requirement, with partial credit just below low-importance requirements.
fn skill_contribution(seeker: &SeekerProfile, job: &JobPost, weights: &MatchWeights) -> f64 {
    let seeker_levels: HashMap<&str, u8> = seeker.skill_levels().collect();

    let mut points = 0.0;
    for requirement in &job.skills {
        let Some(&level) = seeker_levels.get(requirement.title.as_str()) else {
            continue;
        };
        let overshoot = level as f64 - requirement.min_level as f64;

        if requirement.importance > 3 {
            // high importance: no partial credit below the minimum
            if overshoot >= 0.0 {
                points += weights.skill_high_importance + HIGH_IMPORTANCE_BONUS * overshoot;
            }
        } else {
            if overshoot >= 0.0 {
                points += weights.skill_low_importance + LOW_IMPORTANCE_BONUS * overshoot;
            } else if overshoot == -1.0 {
                points += weights.skill_low_importance / 2.0;
            } else if overshoot == -2.0 {
                points += weights.skill_low_importance / 3.0;
            }
        }
    }
    points
}

/// Attitude points: flat weight scaled by half the job's importance level,
/// once per attitude the seeker shares with the post.
fn attitude_contribution(seeker: &SeekerProfile, job: &JobPost, weights: &MatchWeights) -> f64 {
    let seeker_attitudes: HashSet<&str> = seeker.attitudes.iter().map(String::as_str).collect();

    let mut points = 0.0;
    let mut counted: HashSet<&str> = HashSet::new();
    for requirement in &job.attitudes {
        let title = requirement.title.as_str();
        if seeker_attitudes.contains(title) && counted.insert(title) {
            points += weights.shared_attitude * (requirement.importance as f64 / 2.0);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::HaversineOracle;
    use crate::models::{AttitudeRequirement, Location, SkillLevel, SkillRequirement, WorkTypes};
    use chrono::Utc;

    fn test_seeker(tech_skills: Vec<(&str, u8)>, attitudes: Vec<&str>) -> SeekerProfile {
        SeekerProfile {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            location: Some(Location::new("Columbus", "OH").with_coords(39.9612, -82.9988)),
            tech_skills: tech_skills
                .into_iter()
                .map(|(title, level)| SkillLevel {
                    title: title.to_string(),
                    level,
                })
                .collect(),
            biz_skills: vec![],
            attitudes: attitudes.into_iter().map(String::from).collect(),
            years_experience: 4,
            min_edu_level: 3,
            work_wanted: WorkTypes {
                full_time: true,
                part_time: false,
                contract: false,
            },
            remote_wanted: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn test_job(
        skills: Vec<(&str, u8, u8)>,
        attitudes: Vec<(&str, u8)>,
        is_remote: bool,
    ) -> JobPost {
        JobPost {
            id: 10,
            company_id: 100,
            title: "Backend Engineer".to_string(),
            location: Some(Location::new("Columbus", "OH").with_coords(39.9612, -82.9988)),
            is_remote,
            salary_min: Some(80_000),
            salary_max: Some(120_000),
            active: true,
            work_type: WorkTypes {
                full_time: true,
                part_time: false,
                contract: false,
            },
            skills: skills
                .into_iter()
                .map(|(title, min_level, importance)| SkillRequirement {
                    title: title.to_string(),
                    min_level,
                    importance,
                })
                .collect(),
            attitudes: attitudes
                .into_iter()
                .map(|(title, importance)| AttitudeRequirement {
                    title: title.to_string(),
                    importance,
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_high_importance_skill_with_bonus() {
        // Python 4 against min 3 importance 5: 6 + 1.5 * (4 - 3) = 7.5,
        // and the job is remote so location adds nothing
        let seeker = test_seeker(vec![("Python", 4)], vec![]);
        let job = test_job(vec![("Python", 3, 5)], vec![], true);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert_eq!(score, 7.5);
    }

    #[test]
    fn test_low_importance_skill_with_bonus() {
        // level 5 against min 3 importance 2: 4 + 1.0 * 2 = 6
        let seeker = test_seeker(vec![("SQL", 5)], vec![]);
        let job = test_job(vec![("SQL", 3, 2)], vec![], true);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert_eq!(score, 6.0);
    }

    #[test]
    fn test_low_importance_partial_credit() {
        let weights = MatchWeights::default();

        // one level short: W4 / 2
        let seeker = test_seeker(vec![("SQL", 2)], vec![]);
        let job = test_job(vec![("SQL", 3, 2)], vec![], true);
        let score = calculate_match_score(&seeker, &job, &weights, &HaversineOracle);
        assert_eq!(score, weights.skill_low_importance / 2.0);

        // two levels short: W4 / 3
        let seeker = test_seeker(vec![("SQL", 1)], vec![]);
        let score = calculate_match_score(&seeker, &job, &weights, &HaversineOracle);
        assert_eq!(score, weights.skill_low_importance / 3.0);
    }

    #[test]
    fn test_high_importance_has_no_partial_credit() {
        let seeker = test_seeker(vec![("Python", 2)], vec![]);
        let job = test_job(vec![("Python", 3, 5)], vec![], true);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_missing_skill_scores_nothing() {
        let seeker = test_seeker(vec![("Rust", 5)], vec![]);
        let job = test_job(vec![("Python", 1, 5)], vec![], true);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_attitude_overlap_scaled_by_importance() {
        // shared attitude at importance 4: 6 * (4 / 2) = 12
        let seeker = test_seeker(vec![], vec!["Collaborative", "Curious"]);
        let job = test_job(vec![], vec![("Collaborative", 4), ("Independent", 5)], true);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert_eq!(score, 12.0);
    }

    #[test]
    fn test_location_tiers() {
        let weights = MatchWeights::default();

        // same city: within 50 miles
        let seeker = test_seeker(vec![], vec![]);
        let job = test_job(vec![], vec![], false);
        let score = calculate_match_score(&seeker, &job, &weights, &HaversineOracle);
        assert_eq!(score, weights.within_50_miles);

        // Columbus -> Dayton is ~70 miles: second tier
        let mut far_job = test_job(vec![], vec![], false);
        far_job.location = Some(Location::new("Dayton", "OH").with_coords(39.7589, -84.1916));
        let score = calculate_match_score(&seeker, &far_job, &weights, &HaversineOracle);
        assert_eq!(score, weights.within_100_miles);

        // Columbus -> Chicago is ~275 miles: no points
        let mut distant_job = test_job(vec![], vec![], false);
        distant_job.location = Some(Location::new("Chicago", "IL").with_coords(41.8781, -87.6298));
        let score = calculate_match_score(&seeker, &distant_job, &weights, &HaversineOracle);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_remote_job_skips_location() {
        let seeker = test_seeker(vec![], vec![]);
        let job = test_job(vec![], vec![], true);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_missing_seeker_location_skips_location() {
        let mut seeker = test_seeker(vec![], vec![]);
        seeker.location = None;
        let job = test_job(vec![], vec![], false);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_is_never_negative() {
        // empty everything, below-minimum levels, no overlap
        let seeker = test_seeker(vec![("Python", 1)], vec![]);
        let job = test_job(vec![("Python", 5, 5)], vec![("Driven", 5)], true);

        let score =
            calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
        assert!(score >= 0.0);
    }

    #[test]
    fn test_skill_contribution_monotonic_in_level() {
        let job = test_job(vec![("Python", 3, 5)], vec![], true);
        let weights = MatchWeights::default();

        let mut previous = -1.0;
        for level in 1..=5 {
            let seeker = test_seeker(vec![("Python", level)], vec![]);
            let score = calculate_match_score(&seeker, &job, &weights, &HaversineOracle);
            assert!(
                score >= previous,
                "score decreased when level rose to {}",
                level
            );
            previous = score;
        }
    }
}
