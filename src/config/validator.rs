//! AppConfig validation: reference keys unique per list, hrefs present.

use crate::config::{AppConfig, ResourceRef};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    validate_refs("dataset", &config.datasets)?;
    validate_refs("remote service", &config.remote_services)?;
    Ok(())
}

fn validate_refs(kind: &'static str, refs: &[ResourceRef]) -> Result<(), ConfigError> {
    let mut keys = HashSet::new();
    for r in refs {
        if r.href.trim().is_empty() {
            return Err(ConfigError::EmptyHref {
                kind,
                key: r.key.clone(),
            });
        }
        if !keys.insert(r.key.as_str()) {
            return Err(ConfigError::DuplicateKey {
                kind,
                key: r.key.clone(),
            });
        }
    }
    Ok(())
}
