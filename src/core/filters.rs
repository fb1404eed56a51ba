use std::collections::HashMap;

use crate::core::codec;
use crate::core::distance::{within_miles, DistanceOracle};
use crate::models::{AttributeUniverse, JobPost, Location, SeekerProfile, WorkTypes};

/// Salary sentinel: an upper bound of 201 (thousand) means "and above".
const SALARY_UNBOUNDED: i64 = 1_000_000_000;

/// Work-experience sentinel: an upper bound of 11 means "11+ years".
const WORKEXP_UNBOUNDED: u16 = 9999;

/// Work-type checkboxes from the `worktype` URL parameter.
///
/// Four `'0'`/`'1'` flags: full-time, part-time, contract, remote. Packed
/// with full-time as the high bit so candidate flags can be tested with a
/// single AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkTypeFilter {
    pub full_time: bool,
    pub part_time: bool,
    pub contract: bool,
    pub remote: bool,
}

impl WorkTypeFilter {
    pub fn mask(&self) -> u8 {
        (self.full_time as u8) << 3
            | (self.part_time as u8) << 2
            | (self.contract as u8) << 1
            | self.remote as u8
    }

    pub fn any(&self) -> bool {
        self.mask() != 0
    }

    fn parse(value: &str) -> Option<Self> {
        let bytes = value.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|b| *b == b'0' || *b == b'1') {
            return None;
        }
        Some(Self {
            full_time: bytes[0] == b'1',
            part_time: bytes[1] == b'1',
            contract: bytes[2] == b'1',
            remote: bytes[3] == b'1',
        })
    }

    fn serialize(&self) -> String {
        [self.full_time, self.part_time, self.contract, self.remote]
            .iter()
            .map(|&b| if b { '1' } else { '0' })
            .collect()
    }
}

/// "Within N miles of city, state" from the `dist` URL parameter.
///
/// The location's coordinates are unresolved at parse time; the caller
/// geocodes them before the filter is applied.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    pub miles: f64,
    pub location: Location,
}

/// Parsed job-search filters from URL query parameters.
///
/// Unparseable or malformed parameters (including codec decode errors on
/// `tech`/`biz`/`att`) fall back to "no filter" for that field, never to an
/// error: a shared URL with a stale attribute code should still load.
#[derive(Debug, Clone, Default)]
pub struct JobSearchFilters {
    pub work_types: Option<WorkTypeFilter>,
    /// Dollars, already scaled up from the thousands in the URL.
    pub salary: Option<(i64, i64)>,
    pub distance: Option<DistanceFilter>,
    pub tech_mask: Option<u64>,
    pub biz_mask: Option<u64>,
    pub attitude_mask: Option<u64>,
}

impl JobSearchFilters {
    pub fn from_query(
        params: &HashMap<String, String>,
        skills: &AttributeUniverse,
        attitudes: &AttributeUniverse,
    ) -> Self {
        Self {
            work_types: params
                .get("worktype")
                .and_then(|v| WorkTypeFilter::parse(v)),
            salary: params.get("salary").and_then(|v| parse_salary(v)),
            distance: params.get("dist").and_then(|v| parse_dist(v)),
            tech_mask: decode_param(params.get("tech"), skills),
            biz_mask: decode_param(params.get("biz"), skills),
            attitude_mask: decode_param(params.get("att"), attitudes),
        }
    }

    /// Serialize back to URL parameters in the same wire formats.
    pub fn to_query(
        &self,
        skills: &AttributeUniverse,
        attitudes: &AttributeUniverse,
    ) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(wt) = &self.work_types {
            params.push(("worktype", wt.serialize()));
        }
        if let Some((lower, upper)) = self.salary {
            params.push(("salary", serialize_salary(lower, upper)));
        }
        if let Some(dist) = &self.distance {
            params.push(("dist", serialize_dist(dist)));
        }
        push_encoded(&mut params, "tech", self.tech_mask, skills);
        push_encoded(&mut params, "biz", self.biz_mask, skills);
        push_encoded(&mut params, "att", self.attitude_mask, attitudes);
        params
    }
}

/// Parsed seeker-search filters from URL query parameters.
#[derive(Debug, Clone, Default)]
pub struct SeekerSearchFilters {
    pub work_types: Option<WorkTypeFilter>,
    /// Education levels, 0-5 inclusive bounds.
    pub edu_range: Option<(u8, u8)>,
    /// Years of experience; the upper bound is unbounded past the sentinel.
    pub work_range: Option<(u8, u16)>,
    pub distance: Option<DistanceFilter>,
    pub tech_mask: Option<u64>,
    pub biz_mask: Option<u64>,
    pub attitude_mask: Option<u64>,
}

impl SeekerSearchFilters {
    pub fn from_query(
        params: &HashMap<String, String>,
        skills: &AttributeUniverse,
        attitudes: &AttributeUniverse,
    ) -> Self {
        Self {
            work_types: params
                .get("worktype")
                .and_then(|v| WorkTypeFilter::parse(v)),
            edu_range: params.get("eduexp").and_then(|v| parse_eduexp(v)),
            work_range: params.get("workexp").and_then(|v| parse_workexp(v)),
            distance: params.get("dist").and_then(|v| parse_dist(v)),
            tech_mask: decode_param(params.get("tech"), skills),
            biz_mask: decode_param(params.get("biz"), skills),
            attitude_mask: decode_param(params.get("att"), attitudes),
        }
    }

    pub fn to_query(
        &self,
        skills: &AttributeUniverse,
        attitudes: &AttributeUniverse,
    ) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(wt) = &self.work_types {
            params.push(("worktype", wt.serialize()));
        }
        if let Some((lower, upper)) = self.edu_range {
            params.push(("eduexp", format!("{}{}", lower, upper)));
        }
        if let Some((lower, upper)) = self.work_range {
            params.push(("workexp", serialize_workexp(lower, upper)));
        }
        if let Some(dist) = &self.distance {
            params.push(("dist", serialize_dist(dist)));
        }
        push_encoded(&mut params, "tech", self.tech_mask, skills);
        push_encoded(&mut params, "biz", self.biz_mask, skills);
        push_encoded(&mut params, "att", self.attitude_mask, attitudes);
        params
    }
}

fn decode_param(value: Option<&String>, universe: &AttributeUniverse) -> Option<u64> {
    value.and_then(|code| codec::decode_mask(code, universe.len()).ok())
}

fn push_encoded(
    params: &mut Vec<(&'static str, String)>,
    key: &'static str,
    mask: Option<u64>,
    universe: &AttributeUniverse,
) {
    if let Some(mask) = mask {
        if let Ok(code) = codec::encode(&codec::ids_from_mask(mask, universe.len()), universe.len())
        {
            params.push((key, code));
        }
    }
}

/// `"<lower>-<upper>"` in thousands of dollars; upper 201 means unbounded.
fn parse_salary(value: &str) -> Option<(i64, i64)> {
    let (lower, upper) = value.split_once('-')?;
    let lower: i64 = lower.parse().ok().filter(|v| (0..=999).contains(v))?;
    let upper: i64 = upper.parse().ok().filter(|v| (0..=999).contains(v))?;
    let upper = if upper == 201 {
        SALARY_UNBOUNDED
    } else {
        upper * 1000
    };
    Some((lower * 1000, upper))
}

fn serialize_salary(lower: i64, upper: i64) -> String {
    let upper = if upper >= SALARY_UNBOUNDED {
        201
    } else {
        upper / 1000
    };
    format!("{}-{}", lower / 1000, upper)
}

/// `"<miles>-<city>-<state>"`.
fn parse_dist(value: &str) -> Option<DistanceFilter> {
    // exactly two separators, same as the producing form
    if value.bytes().filter(|b| *b == b'-').count() != 2 {
        return None;
    }
    let mut parts = value.splitn(3, '-');
    let miles: f64 = parts.next()?.parse().ok().filter(|m| *m >= 0.0)?;
    let city = parts.next()?;
    let state = parts.next()?;
    if city.is_empty() || state.is_empty() {
        return None;
    }
    Some(DistanceFilter {
        miles,
        location: Location::new(city, state),
    })
}

fn serialize_dist(dist: &DistanceFilter) -> String {
    format!(
        "{}-{}-{}",
        dist.miles as i64, dist.location.city, dist.location.state
    )
}

/// Two hex digits of years; `b` (11) as the upper bound means "11+".
fn parse_workexp(value: &str) -> Option<(u8, u16)> {
    let bytes = value.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let lower = (bytes[0] as char).to_digit(16)? as u8;
    let upper = (bytes[1] as char).to_digit(16)? as u16;
    let upper = if upper == 11 { WORKEXP_UNBOUNDED } else { upper };
    Some((lower, upper))
}

fn serialize_workexp(lower: u8, upper: u16) -> String {
    let upper = if upper >= WORKEXP_UNBOUNDED { 11 } else { upper };
    format!("{:x}{:x}", lower, upper)
}

/// Two decimal digits of education level (0-5).
fn parse_eduexp(value: &str) -> Option<(u8, u8)> {
    let bytes = value.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let lower = (bytes[0] as char).to_digit(10)? as u8;
    let upper = (bytes[1] as char).to_digit(10)? as u8;
    Some((lower, upper))
}

/// Does a job post pass the search filters?
///
/// Inactive posts never match. The remaining checks are skipped when the
/// corresponding filter is absent.
pub fn job_matches(
    job: &JobPost,
    filters: &JobSearchFilters,
    oracle: &dyn DistanceOracle,
    skills: &AttributeUniverse,
    attitudes: &AttributeUniverse,
) -> bool {
    if !job.active {
        return false;
    }

    if let Some(wanted) = &filters.work_types {
        if wanted.any() {
            // a post without explicit work types accepts any of them
            let flags = if job.work_type.any() {
                job.work_type.mask()
            } else {
                WorkTypes::ANY
            };
            let value = flags << 1 | job.is_remote as u8;
            if value & wanted.mask() == 0 {
                return false;
            }
        }
    }

    if let Some((lower, upper)) = filters.salary {
        // accept any overlap; missing salary bounds default to the
        // permissive extreme
        let salary_min = job.salary_min.unwrap_or(0);
        let salary_max = job.salary_max.unwrap_or(SALARY_UNBOUNDED);
        if salary_min > upper || salary_max < lower {
            return false;
        }
    }

    if let Some(dist) = &filters.distance {
        if !within_miles(oracle, dist.miles, Some(&dist.location), job.location.as_ref()) {
            return false;
        }
    }

    if let Some(mask) = filters.tech_mask {
        if mask & job.skill_mask(skills) == 0 {
            return false;
        }
    }
    if let Some(mask) = filters.biz_mask {
        if mask & job.skill_mask(skills) == 0 {
            return false;
        }
    }
    if let Some(mask) = filters.attitude_mask {
        if mask & job.attitude_mask(attitudes) == 0 {
            return false;
        }
    }

    true
}

/// Does a seeker profile pass the search filters?
pub fn seeker_matches(
    seeker: &SeekerProfile,
    filters: &SeekerSearchFilters,
    oracle: &dyn DistanceOracle,
    skills: &AttributeUniverse,
    attitudes: &AttributeUniverse,
) -> bool {
    if !seeker.is_active {
        return false;
    }

    if let Some(wanted) = &filters.work_types {
        if wanted.any() {
            let value = seeker.work_wanted.mask() << 1 | seeker.remote_wanted as u8;
            if value & wanted.mask() == 0 {
                return false;
            }
        }
    }

    if let Some((lower, upper)) = filters.edu_range {
        if seeker.min_edu_level < lower || seeker.min_edu_level > upper {
            return false;
        }
    }

    if let Some((lower, upper)) = filters.work_range {
        let years = seeker.years_experience as u16;
        if years < lower as u16 || years > upper {
            return false;
        }
    }

    if let Some(dist) = &filters.distance {
        if !within_miles(
            oracle,
            dist.miles,
            Some(&dist.location),
            seeker.location.as_ref(),
        ) {
            return false;
        }
    }

    if let Some(mask) = filters.tech_mask {
        if mask & seeker.tech_mask(skills) == 0 {
            return false;
        }
    }
    if let Some(mask) = filters.biz_mask {
        if mask & seeker.biz_mask(skills) == 0 {
            return false;
        }
    }
    if let Some(mask) = filters.attitude_mask {
        if mask & seeker.attitude_mask(attitudes) == 0 {
            return false;
        }
    }

    true
}
