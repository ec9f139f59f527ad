//! App config store: client-side state for a catalog application, its definition, its
//! configuration and lazily fetched dataset / remote-service references.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod shell;
pub mod state;
pub mod store;

pub use cache::{CachedResource, ReferenceCache};
pub use client::{HttpClient, ReqwestClient};
pub use config::{load_from_env, parse_embed_config, validate, AppConfig, AppDef, EmbedConfig, Environment, LoadedConfig, ResourceRef};
pub use error::{ConfigError, RequestError};
pub use notify::Notification;
pub use shell::{ChannelNotifier, LocalShell, LocalShellState, NotificationLoop, NotificationSink, Router, SessionService, Shell, TracingNotifier};
pub use state::{ResourceKind, SharedState, StoreState};
pub use store::ConfigStore;
