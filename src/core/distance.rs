use crate::models::Location;

/// Earth's radius in miles
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Calculate the Haversine distance between two points in miles
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in miles
#[inline]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Distance lookup between two locations.
///
/// `None` means the distance cannot be determined (a location that never
/// geocoded). Scoring and filtering decide what to do with that; the oracle
/// itself stays a plain lookup.
pub trait DistanceOracle {
    fn distance_miles(&self, from: &Location, to: &Location) -> Option<f64>;
}

/// Oracle backed by the coordinates already resolved on the snapshots.
///
/// The geocoder service fills coordinates in at materialization time, which
/// keeps this lookup synchronous and the scoring path pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineOracle;

impl DistanceOracle for HaversineOracle {
    fn distance_miles(&self, from: &Location, to: &Location) -> Option<f64> {
        let (lat1, lon1) = from.coords()?;
        let (lat2, lon2) = to.coords()?;
        Some(haversine_miles(lat1, lon1, lat2, lon2))
    }
}

/// Distance predicate used by the search filters.
///
/// An unset location never excludes a candidate, so it counts as within any
/// range. A location that is present but whose distance cannot be determined
/// counts as out of range.
#[inline]
pub fn within_miles(
    oracle: &dyn DistanceOracle,
    miles: f64,
    from: Option<&Location>,
    to: Option<&Location>,
) -> bool {
    match (from, to) {
        (Some(from), Some(to)) => oracle
            .distance_miles(from, to)
            .is_some_and(|d| d <= miles),
        _ => true,
    }
}
