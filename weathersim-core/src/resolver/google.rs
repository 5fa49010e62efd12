use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{Position, ResolveError};

use super::{CoordinateResolver, get_json};

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const ELEVATION_URL: &str = "https://maps.googleapis.com/maps/api/elevation/json";

const GEOCODE_SERVICE: &str = "Google Geocoding";
const ELEVATION_SERVICE: &str = "Google Elevation";

/// Resolver backed by the Google Maps geocoding and elevation APIs.
#[derive(Debug, Clone)]
pub struct GoogleResolver {
    api_key: String,
    geocode_url: String,
    elevation_url: String,
    http: Client,
}

impl GoogleResolver {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            geocode_url: GEOCODE_URL.to_string(),
            elevation_url: ELEVATION_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_geocode_url(mut self, url: impl Into<String>) -> Self {
        self.geocode_url = url.into();
        self
    }

    pub fn with_elevation_url(mut self, url: impl Into<String>) -> Self {
        self.elevation_url = url.into();
        self
    }

    async fn geocode(&self, city: &str) -> Result<GLatLng, ResolveError> {
        let parsed: GGeocodeResponse = get_json(
            &self.http,
            GEOCODE_SERVICE,
            &self.geocode_url,
            &[("address", city), ("key", self.api_key.as_str())],
        )
        .await?;

        ensure_ok(GEOCODE_SERVICE, &parsed.status)?;

        parsed
            .results
            .into_iter()
            .next()
            .map(|r| r.geometry.location)
            .ok_or_else(|| ResolveError::NoResults {
                service: GEOCODE_SERVICE,
                query: city.to_string(),
            })
    }

    async fn elevation(&self, lat: f64, lng: f64) -> Result<f64, ResolveError> {
        let locations = format!("{lat},{lng}");

        let parsed: GElevationResponse = get_json(
            &self.http,
            ELEVATION_SERVICE,
            &self.elevation_url,
            &[("locations", locations.as_str()), ("key", self.api_key.as_str())],
        )
        .await?;

        ensure_ok(ELEVATION_SERVICE, &parsed.status)?;

        parsed
            .results
            .first()
            .map(|r| r.elevation)
            .ok_or(ResolveError::NoResults { service: ELEVATION_SERVICE, query: locations })
    }
}

fn ensure_ok(service: &'static str, status: &str) -> Result<(), ResolveError> {
    if status == "OK" {
        Ok(())
    } else {
        Err(ResolveError::ServiceStatus { service, status: status.to_string() })
    }
}

#[derive(Debug, Deserialize)]
struct GLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GGeometry {
    location: GLatLng,
}

#[derive(Debug, Deserialize)]
struct GGeocodeResult {
    geometry: GGeometry,
}

#[derive(Debug, Deserialize)]
struct GGeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GGeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GElevationResult {
    elevation: f64,
}

#[derive(Debug, Deserialize)]
struct GElevationResponse {
    status: String,
    #[serde(default)]
    results: Vec<GElevationResult>,
}

#[async_trait]
impl CoordinateResolver for GoogleResolver {
    async fn resolve(&self, city: &str) -> Result<Position, ResolveError> {
        let location = self.geocode(city).await?;
        let elevation = self.elevation(location.lat, location.lng).await?;

        Ok(Position { latitude: location.lat, longitude: location.lng, elevation })
    }
}
