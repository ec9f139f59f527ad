//! ConfigStore: bootstrap, fetch/save of the application config and lazy reference caches.
//!
//! Operations never return errors. Each one catches failures at its own boundary and reports
//! them through the shell's notification sink, leaving state as it was.

use crate::client::HttpClient;
use crate::config::types::trim_trailing_slash;
use crate::config::{validate, AppConfig, AppDef, EmbedConfig, Environment};
use crate::error::RequestError;
use crate::notify::{self, Notification};
use crate::shell::Shell;
use crate::state::{ResourceKind, SharedState, StoreState};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use url::Url;

#[derive(Clone)]
pub struct ConfigStore {
    state: SharedState,
    http: Arc<dyn HttpClient>,
    shell: Shell,
    /// Revision counter bumped after every mutation.
    changes: Arc<watch::Sender<u64>>,
}

impl ConfigStore {
    /// `embed` is the host embedding config; `None` runs the store standalone.
    pub fn new(embed: Option<EmbedConfig>, http: Arc<dyn HttpClient>, shell: Shell) -> Self {
        let (changes, _) = watch::channel(0);
        ConfigStore {
            state: Arc::new(RwLock::new(StoreState::new(embed))),
            http,
            shell,
            changes: Arc::new(changes),
        }
    }

    /// Cloned view of the whole state.
    pub fn snapshot(&self) -> StoreState {
        self.read(|s| s.clone())
    }

    /// Receiver that changes whenever any state field does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.read(|s| s.ready)
    }

    pub fn app_config(&self) -> Option<AppConfig> {
        self.read(|s| s.app_config.clone())
    }

    pub fn app_def(&self) -> Option<AppDef> {
        self.read(|s| s.app_def.clone())
    }

    pub fn dataset(&self, key: &str) -> Option<Value> {
        self.read(|s| s.datasets.payload(key).cloned())
    }

    pub fn remote_service(&self, key: &str) -> Option<Value> {
        self.read(|s| s.remote_services.payload(key).cloned())
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let out = {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        };
        self.changes.send_modify(|rev| *rev += 1);
        out
    }

    /// Like `mutate`, but subscribers are only woken when `f` reports a change.
    fn mutate_if(&self, f: impl FnOnce(&mut StoreState) -> bool) -> bool {
        let changed = {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        };
        if changed {
            self.changes.send_modify(|rev| *rev += 1);
        }
        changed
    }

    pub fn set_env(&self, env: Environment) {
        self.mutate(|s| s.set_env(env));
    }

    pub fn set_ready(&self, ready: bool) {
        self.mutate(|s| s.set_ready(ready));
    }

    pub fn set_app_def(&self, app_def: AppDef) {
        self.mutate(|s| s.set_app_def(app_def));
    }

    pub fn set_config(&self, config: AppConfig) {
        self.mutate(|s| s.set_config(config));
    }

    pub fn set_dataset(&self, key: &str, href: &str, dataset: Value) {
        self.mutate(|s| s.set_dataset(key, href, dataset));
    }

    pub fn set_remote_service(&self, key: &str, href: &str, remote_service: Value) {
        self.mutate(|s| s.set_remote_service(key, href, remote_service));
    }

    pub fn notif(&self, notification: Notification) {
        self.shell.notifications.queue(notification);
    }

    fn notif_error(&self, message: &str, error: impl std::fmt::Display) {
        tracing::warn!(error = %error, "{}", message);
        self.notif(Notification::error(message, error));
    }

    /// Base URL of the default catalog, when the environment is set and valid.
    pub fn default_data_fair_url(&self) -> Option<Url> {
        self.read(|s| s.env.as_ref().and_then(|env| Url::parse(&env.default_data_fair).ok()))
    }

    /// Catalog page that imports the application found at `location`.
    pub fn default_configure_url(&self, location: &str) -> Option<String> {
        self.read(|s| {
            s.env.as_ref().map(|env| {
                format!(
                    "{}/applications?import={}",
                    trim_trailing_slash(&env.default_data_fair),
                    urlencoding::encode(location)
                )
            })
        })
    }

    fn embed(&self) -> Option<EmbedConfig> {
        self.read(|s| s.embed.clone())
    }

    /// Wire the host shell (embedded mode only), load definition and config, then mark ready.
    /// Readiness is set even when fetches fail.
    pub async fn initialize(&self, env: Environment) {
        self.set_env(env);

        if let Some(embed) = self.embed() {
            match embed.router_base_path() {
                Ok(base) => self.shell.router.set_base_path(&base),
                Err(e) => tracing::warn!(error = %e, "router base path left unchanged"),
            }
            self.shell.session.init(&embed.session_base_url());
            self.shell.session.start_loop();
            self.shell.notification_loop.start();
            self.http.set_base_url(&embed.api_base_url());
            tracing::info!(application_id = %embed.application_id, "embedded mode");

            tokio::join!(self.fetch_app_def(), self.fetch_app_config());
        } else {
            tracing::info!("standalone mode");
        }

        self.set_ready(true);
    }

    pub async fn fetch_app_def(&self) {
        let Some(embed) = self.embed() else {
            self.notif_error(notify::MSG_FETCH_APP_DEF_FAILED, RequestError::NoApplication);
            return;
        };
        match self.get_as::<AppDef>(&embed.application_path()).await {
            Ok(app_def) => self.set_app_def(app_def),
            Err(e) => self.notif_error(notify::MSG_FETCH_APP_DEF_FAILED, e),
        }
    }

    /// Load the config, replace it (evicting stale references) and refresh both caches.
    pub async fn fetch_app_config(&self) {
        let Some(embed) = self.embed() else {
            self.notif_error(notify::MSG_FETCH_APP_CONFIG_FAILED, RequestError::NoApplication);
            return;
        };
        match self.get_as::<AppConfig>(&embed.configuration_path()).await {
            Ok(config) => {
                if let Err(e) = validate(&config) {
                    tracing::warn!(error = %e, "fetched application configuration is inconsistent");
                }
                self.set_config(config);
                self.refresh_references().await;
            }
            Err(e) => self.notif_error(notify::MSG_FETCH_APP_CONFIG_FAILED, e),
        }
    }

    /// Store `config` on the catalog; on success it replaces the local config.
    pub async fn save_app_config(&self, config: AppConfig) {
        let Some(embed) = self.embed() else {
            self.notif_error(notify::MSG_SAVE_APP_CONFIG_FAILED, RequestError::NoApplication);
            return;
        };
        if let Err(e) = validate(&config) {
            self.notif_error(notify::MSG_SAVE_APP_CONFIG_FAILED, e);
            return;
        }
        let body = match serde_json::to_value(&config) {
            Ok(body) => body,
            Err(e) => {
                self.notif_error(notify::MSG_SAVE_APP_CONFIG_FAILED, e);
                return;
            }
        };
        if let Err(e) = self.http.put_json(&embed.configuration_path(), &body).await {
            self.notif_error(notify::MSG_SAVE_APP_CONFIG_FAILED, e);
            return;
        }
        self.set_config(config);
        self.notif(Notification::info(notify::MSG_APP_CONFIG_SAVED));
        self.refresh_references().await;
    }

    pub async fn fetch_datasets(&self) {
        self.fetch_references(ResourceKind::Dataset).await;
    }

    pub async fn fetch_remote_services(&self) {
        self.fetch_references(ResourceKind::RemoteService).await;
    }

    async fn refresh_references(&self) {
        tokio::join!(self.fetch_datasets(), self.fetch_remote_services());
    }

    /// Fetch, in list order and one at a time, every reference not already cached from its href.
    /// A response is cached only if its key still points at the href it was fetched from; once
    /// the config has been replaced the rest of the old list is left to the newer refresh.
    async fn fetch_references(&self, kind: ResourceKind) {
        let (generation, refs) = self.read(|s| (s.config_generation, s.refs(kind)));
        for r in refs {
            if self.read(|s| s.cache(kind).is_fresh(&r.key, &r.href)) {
                tracing::debug!(kind = kind.as_str(), key = %r.key, "cached, skipping");
                continue;
            }
            match self.http.get_json(&r.href).await {
                Ok(payload) => {
                    let applied = self.mutate_if(|s| {
                        if s.current_href(kind, &r.key) != Some(r.href.as_str()) {
                            return false;
                        }
                        s.set_resource(kind, &r.key, &r.href, payload);
                        true
                    });
                    if !applied {
                        tracing::warn!(kind = kind.as_str(), key = %r.key, href = %r.href, "dropping response for superseded reference");
                    }
                }
                Err(e) => self.notif_error(fetch_failed_message(kind), e),
            }
            if self.read(|s| s.config_generation) != generation {
                tracing::debug!(kind = kind.as_str(), "configuration replaced, stopping refresh");
                break;
            }
        }
    }

    async fn get_as<T>(&self, url: &str) -> Result<T, RequestError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let value = self.http.get_json(url).await?;
        serde_json::from_value(value).map_err(|e| RequestError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn fetch_failed_message(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Dataset => notify::MSG_FETCH_DATASET_FAILED,
        ResourceKind::RemoteService => notify::MSG_FETCH_REMOTE_SERVICE_FAILED,
    }
}
