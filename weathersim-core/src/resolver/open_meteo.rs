use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{Position, ResolveError};

use super::{CoordinateResolver, get_json};

const GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const ELEVATION_URL: &str = "https://api.open-meteo.com/v1/elevation";

const GEOCODE_SERVICE: &str = "Open-Meteo Geocoding";
const ELEVATION_SERVICE: &str = "Open-Meteo Elevation";

/// Keyless resolver backed by the Open-Meteo geocoding and elevation APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoResolver {
    geocode_url: String,
    elevation_url: String,
    http: Client,
}

impl Default for OpenMeteoResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoResolver {
    pub fn new() -> Self {
        Self {
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

    async fn geocode(&self, city: &str) -> Result<OmPlace, ResolveError> {
        let parsed: OmSearchResponse = get_json(
            &self.http,
            GEOCODE_SERVICE,
            &self.geocode_url,
            &[("name", city), ("count", "1"), ("format", "json")],
        )
        .await?;

        ensure_no_error(GEOCODE_SERVICE, parsed.error, parsed.reason)?;

        parsed.results.into_iter().next().ok_or_else(|| ResolveError::NoResults {
            service: GEOCODE_SERVICE,
            query: city.to_string(),
        })
    }

    async fn elevation(&self, lat: f64, lon: f64) -> Result<f64, ResolveError> {
        let latitude = lat.to_string();
        let longitude = lon.to_string();

        let parsed: OmElevationResponse = get_json(
            &self.http,
            ELEVATION_SERVICE,
            &self.elevation_url,
            &[("latitude", latitude.as_str()), ("longitude", longitude.as_str())],
        )
        .await?;

        ensure_no_error(ELEVATION_SERVICE, parsed.error, parsed.reason)?;

        parsed.elevation.first().copied().ok_or_else(|| ResolveError::NoResults {
            service: ELEVATION_SERVICE,
            query: format!("{latitude},{longitude}"),
        })
    }
}

fn ensure_no_error(
    service: &'static str,
    error: bool,
    reason: Option<String>,
) -> Result<(), ResolveError> {
    if error {
        let status = reason.unwrap_or_else(|| "error".to_string());
        Err(ResolveError::ServiceStatus { service, status })
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OmSearchResponse {
    #[serde(default)]
    results: Vec<OmPlace>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmElevationResponse {
    #[serde(default)]
    elevation: Vec<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[async_trait]
impl CoordinateResolver for OpenMeteoResolver {
    async fn resolve(&self, city: &str) -> Result<Position, ResolveError> {
        let place = self.geocode(city).await?;
        let elevation = self.elevation(place.latitude, place.longitude).await?;

        Ok(Position { latitude: place.latitude, longitude: place.longitude, elevation })
    }
}
