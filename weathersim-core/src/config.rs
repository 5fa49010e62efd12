use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::resolver::ResolverId;

/// Cities used when the config file lists none.
pub const DEFAULT_CITIES: &[&str] = &[
    "Melbourne",
    "Sydney",
    "Adelaide",
    "Brisbane",
    "New Delhi",
    "Chennai",
    "Mumbai",
    "Kolkatta",
    "Chicago",
    "New York Metro",
    "San Francisco",
    "Singapore",
    "Moscow",
    "Angalakurichi",
    "Istanbul",
    "Beijing",
    "London",
    "Hyderabad",
    "Barcelona",
    "Coimbatore",
];

/// Settings for a single resolver backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override for the geocoding endpoint, mostly useful for testing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default resolver id, e.g. "open-meteo" or "google".
    pub default_resolver: Option<String>,

    #[serde(default)]
    pub cities: Vec<String>,

    /// Example TOML:
    /// [resolvers.google]
    /// api_key = "..."
    #[serde(default)]
    pub resolvers: HashMap<String, ResolverConfig>,
}

impl Config {
    /// Resolver to use when none is given explicitly. Open-Meteo needs no key,
    /// so it is the fallback.
    pub fn default_resolver_id(&self) -> Result<ResolverId> {
        match self.default_resolver.as_deref() {
            Some(s) => ResolverId::try_from(s),
            None => Ok(ResolverId::OpenMeteo),
        }
    }

    pub fn set_default_resolver(&mut self, id: ResolverId) {
        self.default_resolver = Some(id.as_str().to_string());
    }

    pub fn resolver_config(&self, id: ResolverId) -> Option<&ResolverConfig> {
        self.resolvers.get(id.as_str())
    }

    /// Configured cities, or [`DEFAULT_CITIES`] when the list is empty.
    pub fn city_list(&self) -> Vec<String> {
        if self.cities.is_empty() {
            DEFAULT_CITIES.iter().map(|c| c.to_string()).collect()
        } else {
            self.cities.clone()
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weathersim", "weathersim")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a resolver API key and make it the default if none is set yet.
    pub fn upsert_resolver_api_key(&mut self, id: ResolverId, api_key: String) {
        self.resolvers.entry(id.as_str().to_string()).or_default().api_key = Some(api_key);

        if self.default_resolver.is_none() {
            self.set_default_resolver(id);
        }
    }

    pub fn resolver_api_key(&self, id: ResolverId) -> Option<&str> {
        self.resolver_config(id).and_then(|cfg| cfg.api_key.as_deref())
    }

    /// Whether the resolver has everything it needs to be constructed.
    pub fn is_resolver_configured(&self, id: ResolverId) -> bool {
        !id.requires_api_key() || self.resolver_api_key(id).is_some()
    }
}
