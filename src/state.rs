//! Store state and its synchronous mutators. Shared by every operation of one store instance.

use crate::cache::ReferenceCache;
use crate::config::{AppConfig, AppDef, EmbedConfig, Environment, ResourceRef};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// The two reference lists an AppConfig carries, each with its own cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Dataset,
    RemoteService,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Dataset => "dataset",
            ResourceKind::RemoteService => "remote service",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// False until bootstrap completes.
    pub ready: bool,
    pub env: Option<Environment>,
    /// Host embedding config, fixed at construction.
    pub embed: Option<EmbedConfig>,
    pub app_config: Option<AppConfig>,
    pub app_def: Option<AppDef>,
    pub datasets: ReferenceCache,
    pub remote_services: ReferenceCache,
    /// Incremented by every `set_config`; list fetches drop responses started under an older value.
    pub config_generation: u64,
}

impl StoreState {
    pub fn new(embed: Option<EmbedConfig>) -> Self {
        StoreState {
            embed,
            ..StoreState::default()
        }
    }

    pub fn set_env(&mut self, env: Environment) {
        self.env = Some(env);
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn set_app_def(&mut self, app_def: AppDef) {
        self.app_def = Some(app_def);
    }

    pub fn set_dataset(&mut self, key: &str, href: &str, dataset: Value) {
        self.datasets.insert(key, href, dataset);
    }

    pub fn set_remote_service(&mut self, key: &str, href: &str, remote_service: Value) {
        self.remote_services.insert(key, href, remote_service);
    }

    /// Evict cache entries whose key now points at another href, then replace the config in full.
    /// One `&mut self` call: no reader can see the new config next to a stale entry.
    pub fn set_config(&mut self, config: AppConfig) {
        let evicted_datasets = self.datasets.evict_stale(&config.datasets);
        let evicted_services = self.remote_services.evict_stale(&config.remote_services);
        if !evicted_datasets.is_empty() || !evicted_services.is_empty() {
            tracing::debug!(
                datasets = ?evicted_datasets,
                remote_services = ?evicted_services,
                "evicted stale references"
            );
        }
        self.app_config = Some(config);
        self.config_generation += 1;
    }

    pub fn cache(&self, kind: ResourceKind) -> &ReferenceCache {
        match kind {
            ResourceKind::Dataset => &self.datasets,
            ResourceKind::RemoteService => &self.remote_services,
        }
    }

    pub fn set_resource(&mut self, kind: ResourceKind, key: &str, href: &str, payload: Value) {
        match kind {
            ResourceKind::Dataset => self.set_dataset(key, href, payload),
            ResourceKind::RemoteService => self.set_remote_service(key, href, payload),
        }
    }

    /// References of one kind in the current config; empty when no config is loaded.
    pub fn refs(&self, kind: ResourceKind) -> Vec<ResourceRef> {
        self.app_config
            .as_ref()
            .map(|c| match kind {
                ResourceKind::Dataset => c.datasets.clone(),
                ResourceKind::RemoteService => c.remote_services.clone(),
            })
            .unwrap_or_default()
    }

    /// The href currently assigned to `key` in the config, if any.
    pub fn current_href(&self, kind: ResourceKind, key: &str) -> Option<&str> {
        let config = self.app_config.as_ref()?;
        let refs = match kind {
            ResourceKind::Dataset => &config.datasets,
            ResourceKind::RemoteService => &config.remote_services,
        };
        refs.iter().find(|r| r.key == key).map(|r| r.href.as_str())
    }
}

/// Each mutator runs under one write lock acquisition. Never held across an await.
pub type SharedState = Arc<RwLock<StoreState>>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn config(datasets: &[(&str, &str)]) -> AppConfig {
        AppConfig::default().with_datasets(datasets.iter().map(|(k, h)| ResourceRef::new(*k, *h)).collect())
    }

    #[test]
    fn set_config_evicts_changed_href() {
        let mut state = StoreState::default();
        state.set_config(config(&[("a", "/d/1")]));
        state.set_dataset("a", "/d/1", json!({"title": "one"}));

        state.set_config(config(&[("a", "/d/2")]));

        assert!(state.datasets.get("a").is_none());
        assert_eq!(state.current_href(ResourceKind::Dataset, "a"), Some("/d/2"));
    }

    #[test]
    fn set_config_keeps_unchanged_href() {
        let mut state = StoreState::default();
        state.set_config(config(&[("a", "/d/1")]));
        state.set_dataset("a", "/d/1", json!({"title": "one"}));

        state.set_config(config(&[("a", "/d/1")]));

        assert_eq!(state.datasets.payload("a"), Some(&json!({"title": "one"})));
    }

    #[test]
    fn set_config_handles_remote_services_symmetrically() {
        let mut state = StoreState::default();
        state.set_remote_service("geo", "/s/1", json!({}));
        state.set_remote_service("sirene", "/s/2", json!({}));

        state.set_config(AppConfig::default().with_remote_services(vec![
            ResourceRef::new("geo", "/s/1b"),
            ResourceRef::new("sirene", "/s/2"),
        ]));

        assert!(state.remote_services.get("geo").is_none());
        assert!(state.remote_services.get("sirene").is_some());
    }

    #[test]
    fn set_config_replaces_rather_than_merges() {
        let mut state = StoreState::default();
        let mut first = config(&[("a", "/d/1")]);
        first.extra.insert("theme".into(), json!("dark"));
        state.set_config(first);
        state.set_config(config(&[("b", "/d/2")]));

        let current = state.app_config.as_ref().unwrap();
        assert!(current.extra.is_empty());
        assert_eq!(state.refs(ResourceKind::Dataset), vec![ResourceRef::new("b", "/d/2")]);
        assert_eq!(state.config_generation, 2);
    }

    type Refs = Vec<(String, String)>;

    fn arb_refs() -> impl Strategy<Value = Refs> {
        prop::collection::btree_map("[a-d]", "/r/[0-3]", 0..5).prop_map(|m| m.into_iter().collect())
    }

    fn to_refs(refs: &Refs) -> Vec<ResourceRef> {
        refs.iter().map(|(k, h)| ResourceRef::new(k.as_str(), h.as_str())).collect()
    }

    fn assert_no_stale(cache: &ReferenceCache, refs: &Refs) -> Result<(), TestCaseError> {
        for (k, h) in refs {
            if let Some(entry) = cache.get(k) {
                prop_assert_eq!(&entry.href, h, "stale entry for {}", k);
            }
        }
        Ok(())
    }

    proptest! {
        // After any sequence of set_config calls, interleaved with arbitrary cache writes,
        // every key present in both the config and the cache was cached from its current href.
        #[test]
        fn no_stale_entry_survives_set_config(
            steps in prop::collection::vec(
                (arb_refs(), arb_refs(), prop::collection::vec(("[a-d]", "/r/[0-3]", any::<bool>()), 0..6)),
                1..12,
            )
        ) {
            let mut state = StoreState::default();
            for (datasets, services, fills) in &steps {
                state.set_config(
                    AppConfig::default()
                        .with_datasets(to_refs(datasets))
                        .with_remote_services(to_refs(services)),
                );
                assert_no_stale(&state.datasets, datasets)?;
                assert_no_stale(&state.remote_services, services)?;

                for (k, h, dataset) in fills {
                    if *dataset {
                        state.set_dataset(k, h, json!({ "from": h }));
                    } else {
                        state.set_remote_service(k, h, json!({ "from": h }));
                    }
                }
            }
        }
    }
}
