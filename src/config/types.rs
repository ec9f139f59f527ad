//! Config types exchanged with the catalog API and supplied by the host environment.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Static environment supplied by the application at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Base URL of the catalog used when the app is not embedded.
    pub default_data_fair: String,
}

/// Host embedding config. Its presence means the app is mounted inside a catalog shell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
    /// Public URL the host exposes this application on.
    pub exposed_url: String,
    pub data_fair_url: String,
    pub application_id: String,
}

impl EmbedConfig {
    /// Base address for every API call made by the store.
    pub fn api_base_url(&self) -> String {
        format!("{}/api/v1", trim_trailing_slash(&self.data_fair_url))
    }

    /// Session endpoint the host session subsystem polls.
    pub fn session_base_url(&self) -> String {
        format!("{}/session", self.api_base_url())
    }

    /// Path prefix of the exposed URL; routing must be mounted under it.
    pub fn router_base_path(&self) -> Result<String, ConfigError> {
        let url = Url::parse(&self.exposed_url).map_err(|_| ConfigError::InvalidUrl {
            field: "exposedUrl",
            value: self.exposed_url.clone(),
        })?;
        Ok(url.path().to_string())
    }

    pub fn application_path(&self) -> String {
        format!("/applications/{}", self.application_id)
    }

    pub fn configuration_path(&self) -> String {
        format!("{}/configuration", self.application_path())
    }
}

pub(crate) fn trim_trailing_slash(s: &str) -> &str {
    s.trim_end_matches('/')
}

/// A pointer from the application config into the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Unique within its list.
    pub key: String,
    pub href: String,
    /// Fields the catalog sends that this crate does not interpret (title, id, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceRef {
    pub fn new(key: impl Into<String>, href: impl Into<String>) -> Self {
        ResourceRef {
            key: key.into(),
            href: href.into(),
            extra: Map::new(),
        }
    }
}

/// Owned configuration of this application instance. Replaced wholesale, never patched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub datasets: Vec<ResourceRef>,
    #[serde(default)]
    pub remote_services: Vec<ResourceRef>,
    /// Application-specific settings, preserved so a save round-trips them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    pub fn with_datasets(mut self, datasets: Vec<ResourceRef>) -> Self {
        self.datasets = datasets;
        self
    }

    pub fn with_remote_services(mut self, remote_services: Vec<ResourceRef>) -> Self {
        self.remote_services = remote_services;
        self
    }
}

/// Read-only application descriptor from the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppDef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
