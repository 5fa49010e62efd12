use crate::{
    Config, Position, ResolveError,
    error::truncate_body,
    resolver::{google::GoogleResolver, open_meteo::OpenMeteoResolver},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug};

pub mod google;
pub mod open_meteo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverId {
    Google,
    OpenMeteo,
}

impl ResolverId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverId::Google => "google",
            ResolverId::OpenMeteo => "open-meteo",
        }
    }

    pub const fn all() -> &'static [ResolverId] {
        &[ResolverId::Google, ResolverId::OpenMeteo]
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ResolverId::Google)
    }
}

impl std::fmt::Display for ResolverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResolverId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "google" => Ok(ResolverId::Google),
            "open-meteo" | "openmeteo" => Ok(ResolverId::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown resolver '{value}'. Supported resolvers: google, open-meteo."
            )),
        }
    }
}

/// Maps a place name to latitude, longitude and elevation.
///
/// Implementations make one geocoding call followed by one elevation call and
/// never cache or retry.
#[async_trait]
pub trait CoordinateResolver: Send + Sync + Debug {
    async fn resolve(&self, city: &str) -> Result<Position, ResolveError>;
}

/// GET `url` with `query` and decode the JSON body. Non-2xx statuses become
/// [`ResolveError::HttpStatus`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    service: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, ResolveError> {
    tracing::debug!(service, url, ?query, "sending lookup request");

    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| ResolveError::Request { service, source })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| ResolveError::Request { service, source })?;

    if !status.is_success() {
        return Err(ResolveError::HttpStatus { service, status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|source| ResolveError::Decode { service, source })
}

/// Construct a resolver from config and explicit ResolverId.
pub fn resolver_from_config(
    id: ResolverId,
    config: &Config,
) -> anyhow::Result<Box<dyn CoordinateResolver>> {
    let settings = config.resolver_config(id).cloned().unwrap_or_default();

    let boxed: Box<dyn CoordinateResolver> = match id {
        ResolverId::Google => {
            let api_key = settings.api_key.ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for resolver '{id}'.\n\
                     Hint: run `weathersim configure {id}` and enter your API key."
                )
            })?;
            let mut resolver = GoogleResolver::new(api_key);
            if let Some(url) = settings.geocode_url {
                resolver = resolver.with_geocode_url(url);
            }
            if let Some(url) = settings.elevation_url {
                resolver = resolver.with_elevation_url(url);
            }
            Box::new(resolver)
        }
        ResolverId::OpenMeteo => {
            let mut resolver = OpenMeteoResolver::new();
            if let Some(url) = settings.geocode_url {
                resolver = resolver.with_geocode_url(url);
            }
            if let Some(url) = settings.elevation_url {
                resolver = resolver.with_elevation_url(url);
            }
            Box::new(resolver)
        }
    };

    Ok(boxed)
}

/// Construct the default resolver from config, using `default_resolver` field.
pub fn default_resolver_from_config(
    config: &Config,
) -> anyhow::Result<Box<dyn CoordinateResolver>> {
    let id = config.default_resolver_id()?;
    resolver_from_config(id, config)
}
