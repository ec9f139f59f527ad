//! Load environment and host embedding config from process environment (`.env` honoured).

use crate::config::types::{trim_trailing_slash, EmbedConfig, Environment};
use crate::error::ConfigError;
use url::Url;

/// Env var holding the default catalog base URL.
pub const DEFAULT_DATA_FAIR_VAR: &str = "DEFAULT_DATA_FAIR";
/// Env var holding the host embedding JSON. Unset means standalone mode.
pub const DATA_FAIR_CONFIG_VAR: &str = "DATA_FAIR_CONFIG";

/// Environment and optional embedding config, as read at startup.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub env: Environment,
    pub embed: Option<EmbedConfig>,
}

/// Read `.env` (if any) then the process environment.
pub fn load_from_env() -> Result<LoadedConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_with(|name| std::env::var(name).ok())
}

/// Same as [`load_from_env`] with an injectable variable lookup.
pub fn load_with<F>(lookup: F) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_data_fair = lookup(DEFAULT_DATA_FAIR_VAR)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ConfigError::Env(DEFAULT_DATA_FAIR_VAR.into()))?;
    let env = Environment {
        default_data_fair: trim_trailing_slash(default_data_fair.trim()).to_string(),
    };
    let embed = match lookup(DATA_FAIR_CONFIG_VAR).filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(parse_embed_config(&raw)?),
        None => None,
    };
    tracing::debug!(embedded = embed.is_some(), "config loaded");
    Ok(LoadedConfig { env, embed })
}

/// Parse the host JSON `{exposedUrl, dataFairUrl, applicationId}`.
pub fn parse_embed_config(raw: &str) -> Result<EmbedConfig, ConfigError> {
    let embed: EmbedConfig = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    for (field, value) in [("exposedUrl", &embed.exposed_url), ("dataFairUrl", &embed.data_fair_url)] {
        if Url::parse(value).is_err() {
            return Err(ConfigError::InvalidUrl {
                field,
                value: value.clone(),
            });
        }
    }
    if embed.application_id.trim().is_empty() {
        return Err(ConfigError::Parse("applicationId must not be empty".into()));
    }
    Ok(embed)
}
