//! Reference cache: key -> payload last fetched, tagged with the href it came from.

use crate::config::ResourceRef;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CachedResource {
    /// Address the payload was fetched from.
    pub href: String,
    pub payload: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceCache {
    entries: HashMap<String, CachedResource>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        ReferenceCache::default()
    }

    pub fn get(&self, key: &str) -> Option<&CachedResource> {
        self.entries.get(key)
    }

    pub fn payload(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|e| &e.payload)
    }

    pub fn insert(&mut self, key: impl Into<String>, href: impl Into<String>, payload: Value) {
        self.entries.insert(
            key.into(),
            CachedResource {
                href: href.into(),
                payload,
            },
        );
    }

    /// True when the key is cached from exactly this href.
    pub fn is_fresh(&self, key: &str, href: &str) -> bool {
        self.entries.get(key).map(|e| e.href == href).unwrap_or(false)
    }

    /// Drop every entry whose key now points at a different href. Keys absent from `refs` are kept.
    /// Returns the evicted keys.
    pub fn evict_stale(&mut self, refs: &[ResourceRef]) -> Vec<String> {
        let mut evicted = Vec::new();
        for r in refs {
            let stale = self.entries.get(&r.key).map(|e| e.href != r.href).unwrap_or(false);
            if stale {
                self.entries.remove(&r.key);
                evicted.push(r.key.clone());
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
