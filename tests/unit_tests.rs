// Unit tests for HireLink Algo

use std::collections::BTreeSet;

use chrono::Utc;
use hirelink_algo::core::codec::{decode_ids, decode_mask, encode, CodecError};
use hirelink_algo::core::distance::{haversine_miles, within_miles, HaversineOracle};
use hirelink_algo::core::scoring::calculate_match_score;
use hirelink_algo::models::{
    AttitudeRequirement, JobPost, Location, MatchWeights, SeekerProfile, SkillLevel,
    SkillRequirement, WorkTypes,
};

fn ids(list: &[u32]) -> BTreeSet<u32> {
    list.iter().copied().collect()
}

fn seeker(tech: &[(&str, u8)], attitudes: &[&str], location: Option<Location>) -> SeekerProfile {
    SeekerProfile {
        id: 1,
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        location,
        tech_skills: tech
            .iter()
            .map(|(title, level)| SkillLevel {
                title: title.to_string(),
                level: *level,
            })
            .collect(),
        biz_skills: vec![],
        attitudes: attitudes.iter().map(|a| a.to_string()).collect(),
        years_experience: 5,
        min_edu_level: 4,
        work_wanted: WorkTypes {
            full_time: true,
            part_time: false,
            contract: false,
        },
        remote_wanted: true,
        is_active: true,
        created_at: Utc::now(),
    }
}

fn job(
    skills: &[(&str, u8, u8)],
    attitudes: &[(&str, u8)],
    is_remote: bool,
    location: Option<Location>,
) -> JobPost {
    JobPost {
        id: 7,
        company_id: 3,
        title: "Platform Engineer".to_string(),
        location,
        is_remote,
        salary_min: Some(90_000),
        salary_max: Some(140_000),
        active: true,
        work_type: WorkTypes {
            full_time: true,
            part_time: false,
            contract: false,
        },
        skills: skills
            .iter()
            .map(|(title, min_level, importance)| SkillRequirement {
                title: title.to_string(),
                min_level: *min_level,
                importance: *importance,
            })
            .collect(),
        attitudes: attitudes
            .iter()
            .map(|(title, importance)| AttitudeRequirement {
                title: title.to_string(),
                importance: *importance,
            })
            .collect(),
        created_at: Utc::now(),
    }
}

#[test]
fn test_codec_round_trip_exhaustive_small() {
    // every subset for universes of 1 and 5
    for n in [1usize, 5] {
        for raw in 0u32..(1u32 << n) {
            let selection: BTreeSet<u32> =
                (1..=n as u32).filter(|id| raw >> (id - 1) & 1 == 1).collect();
            let code = encode(&selection, n).unwrap();
            assert_eq!(
                decode_ids(&code, n).unwrap(),
                selection,
                "round trip failed for {:?} over {}",
                selection,
                n
            );
        }
    }
}

#[test]
fn test_codec_round_trip_universe_30() {
    let cases: Vec<BTreeSet<u32>> = vec![
        ids(&[]),
        (1..=30).collect(),
        ids(&[1]),
        ids(&[30]),
        ids(&[1, 30]),
        (1..=30).filter(|id| id % 2 == 0).collect(),
        (5..=12).collect(),
        ids(&[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]),
    ];

    for selection in cases {
        let code = encode(&selection, 30).unwrap();
        assert_eq!(decode_ids(&code, 30).unwrap(), selection);
    }
}

#[test]
fn test_codec_int_mode_equivalence() {
    for n in [1usize, 5, 30] {
        let cases: Vec<BTreeSet<u32>> = vec![
            ids(&[]),
            (1..=n as u32).collect(),
            ids(&[1]),
            ids(&[n as u32]),
        ];
        for selection in cases {
            let expected = selection
                .iter()
                .fold(0u64, |mask, id| mask | 1 << (n as u32 - id));
            let code = encode(&selection, n).unwrap();
            assert_eq!(
                decode_mask(&code, n).unwrap(),
                expected,
                "int mode mismatch for {:?} over {}",
                selection,
                n
            );
        }
    }
}

#[test]
fn test_codec_compresses_contiguous_selections() {
    // a contiguous block compresses well below one char per option
    let selection: BTreeSet<u32> = (5..=25).collect();
    let code = encode(&selection, 30).unwrap();
    assert!(
        code.len() <= 6,
        "expected a short code for a contiguous run, got {:?}",
        code
    );
}

#[test]
fn test_codec_rejects_wrong_universe() {
    // a code produced against one universe size fails against another
    let code = encode(&ids(&[2, 4]), 5).unwrap();
    assert!(matches!(
        decode_ids(&code, 6),
        Err(CodecError::LengthMismatch { .. })
    ));
}

#[test]
fn test_reference_skill_scenario() {
    // Python at level 4 against (min 3, importance 5): 6 + 1.5 * 1 = 7.5
    let seeker = seeker(&[("Python", 4)], &[], None);
    let job = job(&[("Python", 3, 5)], &[], true, None);

    let score = calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
    assert_eq!(score, 7.5);
}

#[test]
fn test_score_combines_contributions() {
    let columbus = Location::new("Columbus", "OH").with_coords(39.9612, -82.9988);
    let seeker = seeker(
        &[("Python", 4), ("SQL", 3)],
        &["Curious"],
        Some(columbus.clone()),
    );
    let job = job(
        &[("Python", 3, 5), ("SQL", 3, 2)],
        &[("Curious", 4)],
        false,
        Some(columbus),
    );

    let weights = MatchWeights::default();
    let score = calculate_match_score(&seeker, &job, &weights, &HaversineOracle);

    // location 25 + Python (6 + 1.5) + SQL 4 + attitude 6 * 2 = 48.5
    assert_eq!(score, 48.5);
}

#[test]
fn test_score_non_negative_for_empty_records() {
    let seeker = seeker(&[], &[], None);
    let job = job(&[], &[], true, None);

    let score = calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
    assert_eq!(score, 0.0);
}

#[test]
fn test_score_monotonic_in_seeker_level() {
    for importance in [0u8, 2, 4, 5] {
        let job = job(&[("Python", 3, importance)], &[], true, None);
        let mut previous = -1.0;
        for level in 1..=5u8 {
            let seeker = seeker(&[("Python", level)], &[], None);
            let score =
                calculate_match_score(&seeker, &job, &MatchWeights::default(), &HaversineOracle);
            assert!(
                score >= previous,
                "importance {} level {}: {} < {}",
                importance,
                level,
                score,
                previous
            );
            previous = score;
        }
    }
}

#[test]
fn test_score_deterministic() {
    let columbus = Location::new("Columbus", "OH").with_coords(39.9612, -82.9988);
    let seeker = seeker(
        &[("Python", 4), ("Rust", 5), ("SQL", 2)],
        &["Curious", "Driven"],
        Some(columbus.clone()),
    );
    let job = job(
        &[("Rust", 3, 5), ("SQL", 3, 1), ("Go", 2, 4)],
        &[("Driven", 3), ("Curious", 1)],
        false,
        Some(columbus),
    );

    let weights = MatchWeights::default();
    let first = calculate_match_score(&seeker, &job, &weights, &HaversineOracle);
    for _ in 0..10 {
        assert_eq!(
            calculate_match_score(&seeker, &job, &weights, &HaversineOracle),
            first
        );
    }
}

#[test]
fn test_custom_weights_apply() {
    // the alternate observed table (7/5/4) is just configuration
    let weights = MatchWeights {
        within_50_miles: 25.0,
        within_100_miles: 15.0,
        skill_high_importance: 7.0,
        skill_low_importance: 5.0,
        shared_attitude: 4.0,
    };

    let seeker = seeker(&[("Python", 4)], &["Curious"], None);
    let job = job(&[("Python", 3, 5)], &[("Curious", 2)], true, None);

    let score = calculate_match_score(&seeker, &job, &weights, &HaversineOracle);
    // 7 + 1.5 + 4 * (2 / 2) = 12.5
    assert_eq!(score, 12.5);
}

#[test]
fn test_haversine_sanity() {
    // New York to Los Angeles is approximately 2450 miles
    let distance = haversine_miles(40.7128, -74.0060, 34.0522, -118.2437);
    assert!(
        (distance - 2450.0).abs() < 60.0,
        "Expected ~2450mi, got {}",
        distance
    );
}

#[test]
fn test_within_miles_unknown_semantics() {
    let oracle = HaversineOracle;
    let resolved = Location::new("Columbus", "OH").with_coords(39.9612, -82.9988);
    let unresolved = Location::new("Columbus", "OH");

    // unset locations never exclude
    assert!(within_miles(&oracle, 10.0, None, Some(&resolved)));
    // set but unresolvable locations are out of range
    assert!(!within_miles(
        &oracle,
        10.0,
        Some(&unresolved),
        Some(&resolved)
    ));
}
