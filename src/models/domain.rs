use serde::{Deserialize, Serialize};

/// City/state location with coordinates resolved at snapshot time.
///
/// The geocoder fills in `latitude`/`longitude` when the snapshot is
/// materialized; `None` coordinates mean the location could not be geocoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coords(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// One skill on a seeker profile: title plus self-reported level (1-5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillLevel {
    pub title: String,
    pub level: u8,
}

/// One skill requirement on a job post: minimum level (1-5) and how much
/// the company cares about it (importance 0-5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub title: String,
    #[serde(rename = "minLevel")]
    pub min_level: u8,
    pub importance: u8,
}

/// One attitude requirement on a job post (importance 0-5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttitudeRequirement {
    pub title: String,
    pub importance: u8,
}

/// Full-time/part-time/contract flags.
///
/// Packed as a 3-bit mask (full-time is the high bit) so work-type filters
/// can test overlap with a single AND, matching the URL `worktype` format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorkTypes {
    #[serde(rename = "fullTime", default)]
    pub full_time: bool,
    #[serde(rename = "partTime", default)]
    pub part_time: bool,
    #[serde(default)]
    pub contract: bool,
}

impl WorkTypes {
    pub const ANY: u8 = 0b111;

    pub fn mask(&self) -> u8 {
        (self.full_time as u8) << 2 | (self.part_time as u8) << 1 | self.contract as u8
    }

    pub fn any(&self) -> bool {
        self.full_time || self.part_time || self.contract
    }
}

/// Denormalized seeker snapshot consumed by the scorer and filters.
///
/// `years_experience` is the sum over job-history entries and
/// `min_edu_level` is one plus the highest education level on file (0 when
/// there is none); both are materialized by the snapshot reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekerProfile {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(rename = "techSkills", default)]
    pub tech_skills: Vec<SkillLevel>,
    #[serde(rename = "bizSkills", default)]
    pub biz_skills: Vec<SkillLevel>,
    #[serde(default)]
    pub attitudes: Vec<String>,
    #[serde(rename = "yearsExperience", default)]
    pub years_experience: u8,
    #[serde(rename = "minEduLevel", default)]
    pub min_edu_level: u8,
    #[serde(rename = "workWanted", default)]
    pub work_wanted: WorkTypes,
    #[serde(rename = "remoteWanted", default)]
    pub remote_wanted: bool,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SeekerProfile {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// All skills, tech and biz combined, as (title, level) pairs.
    pub fn skill_levels(&self) -> impl Iterator<Item = (&str, u8)> + '_ {
        self.tech_skills
            .iter()
            .chain(self.biz_skills.iter())
            .map(|s| (s.title.as_str(), s.level))
    }

    pub fn tech_mask(&self, universe: &AttributeUniverse) -> u64 {
        universe.mask_for(self.tech_skills.iter().map(|s| s.title.as_str()))
    }

    pub fn biz_mask(&self, universe: &AttributeUniverse) -> u64 {
        universe.mask_for(self.biz_skills.iter().map(|s| s.title.as_str()))
    }

    pub fn attitude_mask(&self, universe: &AttributeUniverse) -> u64 {
        universe.mask_for(self.attitudes.iter().map(String::as_str))
    }
}

fn default_true() -> bool {
    true
}

/// Denormalized job-post snapshot consumed by the scorer and filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPost {
    pub id: i64,
    #[serde(rename = "companyId")]
    pub company_id: i64,
    pub title: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(rename = "isRemote", default)]
    pub is_remote: bool,
    #[serde(rename = "salaryMin", default)]
    pub salary_min: Option<i64>,
    #[serde(rename = "salaryMax", default)]
    pub salary_max: Option<i64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(rename = "workType", default)]
    pub work_type: WorkTypes,
    #[serde(default)]
    pub skills: Vec<SkillRequirement>,
    #[serde(default)]
    pub attitudes: Vec<AttitudeRequirement>,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl JobPost {
    /// Mask of required skills against the given skill universe.
    ///
    /// Tech and biz requirements live in one list on the post; titles not in
    /// the passed universe simply don't set a bit.
    pub fn skill_mask(&self, universe: &AttributeUniverse) -> u64 {
        universe.mask_for(self.skills.iter().map(|s| s.title.as_str()))
    }

    pub fn attitude_mask(&self, universe: &AttributeUniverse) -> u64 {
        universe.mask_for(self.attitudes.iter().map(|a| a.title.as_str()))
    }
}

/// Ordered snapshot of the selectable options in one attribute category.
///
/// IDs are the 1-based positions in `titles`. The snapshot is loaded by the
/// caller and passed explicitly into codec and filter call sites; when new
/// skills or attitudes are added the caller reloads it, so there is no
/// process-wide cache to go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeUniverse {
    titles: Vec<String>,
}

impl AttributeUniverse {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// 1-based ID for a title, or None if it is not in this universe.
    pub fn id_of(&self, title: &str) -> Option<u32> {
        self.titles.iter().position(|t| t == title).map(|i| i as u32 + 1)
    }

    pub fn title_of(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.titles.get(id as usize - 1).map(String::as_str)
    }

    /// MSB-first bitmask (ID 1 = most significant of `len()` bits) over the
    /// given titles. Titles not in the universe are ignored.
    pub fn mask_for<'a>(&self, titles: impl Iterator<Item = &'a str>) -> u64 {
        let n = self.titles.len() as u32;
        let mut mask = 0u64;
        for title in titles {
            if let Some(id) = self.id_of(title) {
                mask |= 1 << (n - id);
            }
        }
        mask
    }
}

/// One ranked job for a seeker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMatch {
    #[serde(rename = "jobId")]
    pub job_id: i64,
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    #[serde(rename = "companyId")]
    pub company_id: i64,
    pub score: f64,
}

/// One ranked seeker for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekerMatch {
    #[serde(rename = "seekerId")]
    pub seeker_id: i64,
    pub name: String,
    pub score: f64,
}

/// Scoring weights
///
/// Point values for each contribution; all are plain config values. The
/// defaults are the production table (25/15/6/4/6).
#[derive(Debug, Clone, Copy)]
pub struct MatchWeights {
    pub within_50_miles: f64,
    pub within_100_miles: f64,
    pub skill_high_importance: f64,
    pub skill_low_importance: f64,
    pub shared_attitude: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            within_50_miles: 25.0,
            within_100_miles: 15.0,
            skill_high_importance: 6.0,
            skill_low_importance: 4.0,
            shared_attitude: 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_ids() {
        let universe = AttributeUniverse::new(vec![
            "Python".to_string(),
            "Rust".to_string(),
            "SQL".to_string(),
        ]);

        assert_eq!(universe.len(), 3);
        assert_eq!(universe.id_of("Python"), Some(1));
        assert_eq!(universe.id_of("SQL"), Some(3));
        assert_eq!(universe.id_of("COBOL"), None);
        assert_eq!(universe.title_of(2), Some("Rust"));
        assert_eq!(universe.title_of(0), None);
        assert_eq!(universe.title_of(4), None);
    }

    #[test]
    fn test_mask_is_msb_first() {
        let universe = AttributeUniverse::new(vec![
            "Python".to_string(),
            "Rust".to_string(),
            "SQL".to_string(),
        ]);

        // ID 1 is the most significant of 3 bits
        assert_eq!(universe.mask_for(["Python"].into_iter()), 0b100);
        assert_eq!(universe.mask_for(["SQL"].into_iter()), 0b001);
        assert_eq!(universe.mask_for(["Python", "SQL"].into_iter()), 0b101);
        // unknown titles contribute nothing
        assert_eq!(universe.mask_for(["COBOL"].into_iter()), 0);
    }

    #[test]
    fn test_worktype_mask() {
        let wt = WorkTypes {
            full_time: true,
            part_time: false,
            contract: true,
        };
        assert_eq!(wt.mask(), 0b101);
        assert!(wt.any());
        assert!(!WorkTypes::default().any());
    }
}
