use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::models::Location;
use crate::services::cache::{CacheKey, CacheManager};

/// Fallback coordinate when neither the city nor the state can be geocoded:
/// the approximate center of the continental US.
const DEFAULT_COORDS: (f64, f64) = (39.8283, -98.5795);

/// Errors that can occur when geocoding a location
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Geocoding client
///
/// Resolves "city, state" pairs to coordinates through a Nominatim-style
/// search endpoint, caching results through the shared cache manager. A
/// location that returns no results falls back to a state-only lookup and
/// finally to a default somewhere-in-the-country coordinate, so lookups
/// only fail when the HTTP call itself does.
pub struct Geocoder {
    client: Client,
    endpoint: String,
    user_agent: String,
    cache: Option<Arc<CacheManager>>,
}

impl Geocoder {
    pub fn new(
        endpoint: String,
        user_agent: String,
        timeout_secs: u64,
        cache: Option<Arc<CacheManager>>,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            user_agent,
            cache,
        })
    }

    /// Resolve a city/state pair to (latitude, longitude).
    pub async fn resolve(&self, city: &str, state: &str) -> Result<(f64, f64), GeocodeError> {
        let key = CacheKey::geocode(city, state);
        if let Some(cache) = &self.cache {
            if let Ok(coords) = cache.get::<(f64, f64)>(&key).await {
                return Ok(coords);
            }
        }

        let coords = match self.lookup(Some(city), state).await? {
            Some(coords) => coords,
            None => {
                tracing::debug!("No geocode result for {}, {}; trying state only", city, state);
                match self.lookup(None, state).await? {
                    Some(coords) => coords,
                    None => DEFAULT_COORDS,
                }
            }
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &coords).await {
                tracing::warn!("Failed to cache geocode result for {}: {}", key, e);
            }
        }

        Ok(coords)
    }

    /// Fill in a location's coordinates, leaving them unset on failure.
    ///
    /// Scoring and filtering treat unset coordinates as "cannot determine
    /// distance", so a geocoder outage degrades matching instead of
    /// breaking it.
    pub async fn fill_coords(&self, location: &mut Location) {
        match self.resolve(&location.city, &location.state).await {
            Ok((lat, lon)) => {
                location.latitude = Some(lat);
                location.longitude = Some(lon);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not geocode {}, {}: {}",
                    location.city,
                    location.state,
                    e
                );
            }
        }
    }

    async fn lookup(
        &self,
        city: Option<&str>,
        state: &str,
    ) -> Result<Option<(f64, f64)>, GeocodeError> {
        let mut url = format!(
            "{}/search?format=json&country=USA&state={}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(state)
        );
        if let Some(city) = city {
            url.push_str("&city=");
            url.push_str(&urlencoding::encode(city));
        }

        tracing::debug!("Geocoding via: {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::ApiError(format!(
                "Geocode lookup failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let results = json
            .as_array()
            .ok_or_else(|| GeocodeError::InvalidResponse("Expected a result array".into()))?;

        let Some(first) = results.first() else {
            return Ok(None);
        };

        let lat = coord_field(first, "lat")?;
        let lon = coord_field(first, "lon")?;
        Ok(Some((lat, lon)))
    }
}

/// Nominatim returns coordinates as strings; accept numbers too.
fn coord_field(value: &Value, field: &str) -> Result<f64, GeocodeError> {
    let coord = value
        .get(field)
        .and_then(|v| match v {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .ok_or_else(|| GeocodeError::InvalidResponse(format!("Missing coordinate {}", field)))?;
    Ok(coord)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_geocoder(endpoint: String) -> Geocoder {
        Geocoder::new(endpoint, "hirelink-algo-tests".to_string(), 5, None).unwrap()
    }

    #[test]
    fn test_resolve_parses_result() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("city".into(), "Columbus".into()),
                mockito::Matcher::UrlEncoded("state".into(), "OH".into()),
            ]))
            .with_body(r#"[{"lat": "39.9612", "lon": "-82.9988"}]"#)
            .create();

        let geocoder = test_geocoder(server.url());
        let coords = tokio_test::block_on(geocoder.resolve("Columbus", "OH")).unwrap();

        assert!((coords.0 - 39.9612).abs() < 1e-6);
        assert!((coords.1 + 82.9988).abs() < 1e-6);
        mock.assert();
    }

    #[test]
    fn test_resolve_falls_back_to_state() {
        let mut server = mockito::Server::new();
        let city_mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::UrlEncoded(
                "city".into(),
                "Nowheresville".into(),
            ))
            .with_body("[]")
            .create();
        let state_mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("state".into(), "OH".into()),
                mockito::Matcher::Missing("city".into()),
            ]))
            .with_body(r#"[{"lat": "40.4173", "lon": "-82.9071"}]"#)
            .create();

        let geocoder = test_geocoder(server.url());
        let coords = tokio_test::block_on(geocoder.resolve("Nowheresville", "OH")).unwrap();

        assert!((coords.0 - 40.4173).abs() < 1e-6);
        city_mock.assert();
        state_mock.assert();
    }

    #[test]
    fn test_resolve_defaults_when_nothing_matches() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/search").with_body("[]").expect(2).create();

        let geocoder = test_geocoder(server.url());
        let coords = tokio_test::block_on(geocoder.resolve("Nowhere", "XX")).unwrap();

        assert_eq!(coords, DEFAULT_COORDS);
    }

    #[test]
    fn test_fill_coords_leaves_unset_on_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/search").with_status(500).create();

        let geocoder = test_geocoder(server.url());
        let mut location = Location::new("Columbus", "OH");
        tokio_test::block_on(geocoder.fill_coords(&mut location));

        assert!(location.coords().is_none());
    }
}
